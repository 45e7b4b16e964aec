//! Detached command execution with placeholder substitution

use std::path::Path;
use std::process::Stdio;

/// Token in the command template replaced with the watched path
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Substitute the placeholder into the template
///
/// A template without the token is returned unchanged.
pub fn render_command(template: &str, path: &Path) -> String {
    if template.contains(PATH_PLACEHOLDER) {
        template.replace(PATH_PLACEHOLDER, &path.display().to_string())
    } else {
        template.to_string()
    }
}

/// Spawn the command through the shell and detach
///
/// Fire-and-forget: the exit status is only ever logged, never propagated.
/// A reaper task awaits the child so it does not linger as a zombie.
pub fn spawn_detached(command: &str) {
    let spawned = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .spawn();

    match spawned {
        Ok(mut child) => {
            let command = command.to_string();
            tokio::spawn(async move {
                match child.wait().await {
                    Ok(status) if status.success() => {
                        tracing::debug!(command = %command, "Command finished");
                    }
                    Ok(status) => {
                        tracing::warn!(command = %command, %status, "Command failed");
                    }
                    Err(e) => {
                        tracing::warn!(command = %command, error = %e, "Cannot await command");
                    }
                }
            });
        }
        Err(e) => {
            tracing::warn!(command = %command, error = %e, "Failed to spawn command");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_render_substitutes_placeholder() {
        let path = PathBuf::from("/etc/hosts");
        assert_eq!(
            render_command("cp {path} /tmp/backup", &path),
            "cp /etc/hosts /tmp/backup"
        );
    }

    #[test]
    fn test_render_substitutes_every_occurrence() {
        let path = PathBuf::from("/data/file");
        assert_eq!(
            render_command("diff {path} {path}.bak", &path),
            "diff /data/file /data/file.bak"
        );
    }

    #[test]
    fn test_render_without_placeholder_is_unchanged() {
        let path = PathBuf::from("/data/file");
        assert_eq!(render_command("systemctl reload app", &path), "systemctl reload app");
    }
}
