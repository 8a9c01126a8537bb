//! Platform abstraction for privileges, hosts path, DNS flush and launchers.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

#[cfg(unix)]
pub mod unix;

#[cfg(windows)]
pub mod windows;

use crate::error::{Error, Result};

/// Operating system family, as far as hosts handling is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformKind {
    Windows,
    MacOs,
    /// Linux, BSD and other Unix-likes.
    Unix,
}

impl PlatformKind {
    pub fn current() -> Self {
        if cfg!(windows) {
            PlatformKind::Windows
        } else if cfg!(target_os = "macos") {
            PlatformKind::MacOs
        } else {
            PlatformKind::Unix
        }
    }

    /// Whether the OS offers an interactive elevation prompt we can trigger.
    pub fn has_elevation_prompt(self) -> bool {
        matches!(self, PlatformKind::Windows)
    }
}

/// Canonical hosts file location for a platform.
pub fn hosts_path_for(kind: PlatformKind) -> PathBuf {
    match kind {
        PlatformKind::Windows => {
            let root = std::env::var_os("SystemRoot").unwrap_or_else(|| "C:\\Windows".into());
            PathBuf::from(root)
                .join("System32")
                .join("drivers")
                .join("etc")
                .join("hosts")
        }
        PlatformKind::MacOs => PathBuf::from("/private/etc/hosts"),
        PlatformKind::Unix => PathBuf::from("/etc/hosts"),
    }
}

/// Trait for the OS-specific operations around the hosts file.
pub trait Platform: Send + Sync {
    fn kind(&self) -> PlatformKind;

    fn hosts_path(&self) -> PathBuf {
        hosts_path_for(self.kind())
    }

    /// True when the process may write the hosts file.
    fn has_elevated_rights(&self) -> bool;

    /// Relaunch the current program with elevated rights.
    /// `Ok` means the elevated copy was started and this process should exit.
    fn elevate(&self) -> Result<()>;

    /// Clear the OS resolver cache.
    fn flush_dns(&self) -> Result<()>;

    /// Open `path` in a text editor, blocking until the editor exits.
    fn open_editor(&self, path: &Path) -> Result<()>;

    /// Open `dir` in the OS file browser.
    fn open_directory(&self, dir: &Path) -> Result<()>;
}

/// Get platform implementation.
pub fn default_platform() -> Box<dyn Platform> {
    #[cfg(unix)]
    return Box::new(unix::UnixPlatform::new(PlatformKind::current()));

    #[cfg(windows)]
    return Box::new(windows::WindowsPlatform);
}

/// Run a command with output suppressed; non-zero exit is an error.
pub(crate) fn run_quiet(program: &str, args: &[&str]) -> Result<()> {
    debug!("running {program} {}", args.join(" "));
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| Error::subprocess(program, e))?;
    if !status.success() {
        return Err(Error::subprocess(program, format!("exited with {status}")));
    }
    Ok(())
}

/// Run a command attached to the terminal and wait for it.
pub(crate) fn run_attached(program: &str, path: &Path) -> Result<()> {
    debug!("launching {program} {}", path.display());
    let status = Command::new(program)
        .arg(path)
        .status()
        .map_err(|e| Error::subprocess(program, e))?;
    if !status.success() {
        return Err(Error::subprocess(program, format!("exited with {status}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_like_paths() {
        assert_eq!(hosts_path_for(PlatformKind::Unix), PathBuf::from("/etc/hosts"));
        assert_eq!(
            hosts_path_for(PlatformKind::MacOs),
            PathBuf::from("/private/etc/hosts")
        );
    }

    #[test]
    fn windows_path_ends_in_drivers_etc() {
        let path = hosts_path_for(PlatformKind::Windows);
        assert!(path.ends_with("System32/drivers/etc/hosts") || path.ends_with(r"System32\drivers\etc\hosts"));
    }

    #[test]
    fn only_windows_prompts() {
        assert!(PlatformKind::Windows.has_elevation_prompt());
        assert!(!PlatformKind::MacOs.has_elevation_prompt());
        assert!(!PlatformKind::Unix.has_elevation_prompt());
    }

    #[test]
    fn run_quiet_reports_missing_program() {
        let err = run_quiet("github520-no-such-program", &[]).unwrap_err();
        assert!(matches!(err, Error::Subprocess { .. }));
    }
}
