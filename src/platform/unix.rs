//! Unix (macOS, Linux) platform implementation.

use std::path::Path;

use log::warn;

use super::{run_attached, run_quiet, Platform, PlatformKind};
use crate::error::{Error, Result};

pub struct UnixPlatform {
    kind: PlatformKind,
}

impl UnixPlatform {
    pub fn new(kind: PlatformKind) -> Self {
        Self { kind }
    }
}

impl Platform for UnixPlatform {
    fn kind(&self) -> PlatformKind {
        self.kind
    }

    fn has_elevated_rights(&self) -> bool {
        unsafe { libc::geteuid() == 0 }
    }

    fn elevate(&self) -> Result<()> {
        // No GUI prompt we can rely on from a terminal; ask for sudo instead.
        let exe = std::env::current_exe()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "github520".to_string());
        Err(Error::Privilege(format!("run again with sudo: sudo {exe}")))
    }

    fn flush_dns(&self) -> Result<()> {
        if self.kind == PlatformKind::MacOs {
            run_quiet("dscacheutil", &["-flushcache"])?;
            return run_quiet("killall", &["-HUP", "mDNSResponder"]);
        }
        match run_quiet("resolvectl", &["flush-caches"]) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("resolvectl flush-caches: {e}; trying systemd-resolve");
                run_quiet("systemd-resolve", &["--flush-caches"])
            }
        }
    }

    fn open_editor(&self, path: &Path) -> Result<()> {
        let editor = std::env::var("EDITOR")
            .ok()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "vim".to_string());
        run_attached(&editor, path)
    }

    fn open_directory(&self, dir: &Path) -> Result<()> {
        let opener = if self.kind == PlatformKind::MacOs {
            "open"
        } else {
            "xdg-open"
        };
        let dir = dir.to_string_lossy();
        run_quiet(opener, &[&*dir])
    }
}
