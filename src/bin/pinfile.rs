//! F2FS pin-attribute toggle.
//!
//! Pins or unpins a file against block relocation via the F2FS ioctl pair,
//! then reads the state back for verification. Linux-only; requires write
//! access to the target and an F2FS filesystem.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "pinfile", version, about = "Toggle the F2FS pin attribute on a file")]
struct Args {
    /// 1 to pin, 0 to unpin
    #[arg(value_parser = clap::value_parser!(u32).range(0..=1))]
    pin: u32,

    /// Target file path
    path: PathBuf,
}

#[cfg(target_os = "linux")]
mod f2fs {
    use std::fs::OpenOptions;
    use std::io;
    use std::os::unix::io::AsRawFd;
    use std::path::Path;

    // _IOW(F2FS_IOCTL_MAGIC, 13, u32) / _IOR(F2FS_IOCTL_MAGIC, 14, u32)
    const F2FS_IOC_SET_PIN_FILE: libc::c_ulong = 0x4004_f50d;
    const F2FS_IOC_GET_PIN_FILE: libc::c_ulong = 0x8004_f50e;

    /// Set the pin attribute and return the verified post-call state
    pub fn set_pin(path: &Path, pin: u32) -> io::Result<u32> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let fd = file.as_raw_fd();

        let value: u32 = pin;
        if unsafe { libc::ioctl(fd, F2FS_IOC_SET_PIN_FILE, &value) } < 0 {
            return Err(io::Error::last_os_error());
        }

        let mut current: u32 = 0;
        if unsafe { libc::ioctl(fd, F2FS_IOC_GET_PIN_FILE, &mut current) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(current)
    }
}

#[cfg(target_os = "linux")]
fn main() -> Result<()> {
    let args = Args::parse();

    match f2fs::set_pin(&args.path, args.pin) {
        Ok(current) => {
            println!("{}: pin state set to {}, verified {}", args.path.display(), args.pin, current);
            Ok(())
        }
        Err(e) => {
            anyhow::bail!(
                "cannot set pin state on {} (not an F2FS filesystem, or insufficient privilege): {}",
                args.path.display(),
                e
            );
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn main() -> Result<()> {
    let _ = Args::parse();
    anyhow::bail!("pinfile requires Linux with an F2FS filesystem");
}
