//! Windows platform implementation.

use std::path::Path;
use std::process::{Command, Stdio};

use log::debug;

use super::{run_attached, run_quiet, Platform, PlatformKind};
use crate::error::{Error, Result};

/// Quote a value for a single-quoted PowerShell string.
fn ps_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

pub struct WindowsPlatform;

impl Platform for WindowsPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Windows
    }

    fn has_elevated_rights(&self) -> bool {
        // `net session` only succeeds for administrators.
        Command::new("net")
            .arg("session")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn elevate(&self) -> Result<()> {
        let exe = std::env::current_exe().map_err(|e| Error::Privilege(e.to_string()))?;
        let args: Vec<String> = std::env::args().skip(1).map(|a| ps_quote(&a)).collect();
        let mut script = format!(
            "Start-Process -FilePath {} -Verb RunAs",
            ps_quote(&exe.to_string_lossy())
        );
        if !args.is_empty() {
            script.push_str(&format!(" -ArgumentList {}", args.join(",")));
        }
        debug!("elevating via powershell: {script}");
        let status = Command::new("powershell")
            .args(["-NoProfile", "-Command", &script])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| Error::Privilege(format!("could not start powershell: {e}")))?;
        if !status.success() {
            return Err(Error::Privilege(
                "elevation was denied; run this program as administrator".to_string(),
            ));
        }
        Ok(())
    }

    fn flush_dns(&self) -> Result<()> {
        run_quiet("ipconfig", &["/flushdns"])
    }

    fn open_editor(&self, path: &Path) -> Result<()> {
        run_attached("notepad", path)
    }

    fn open_directory(&self, dir: &Path) -> Result<()> {
        // explorer exits non-zero even on success, so only spawn failures count.
        Command::new("explorer")
            .arg(dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| Error::subprocess("explorer", e))?;
        Ok(())
    }
}
