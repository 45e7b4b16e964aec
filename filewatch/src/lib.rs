//! Filewatch - run a command when a watched path changes
//!
//! This library provides the polling watcher core: change detection via
//! periodic stat checks, adaptive idle backoff, and detached command
//! execution with placeholder substitution.

mod command;
mod watch;

pub use command::{render_command, spawn_detached, PATH_PLACEHOLDER};
pub use watch::{Backoff, PathWatch};
