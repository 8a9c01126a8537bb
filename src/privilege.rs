//! Privilege gate: startup check and per-operation re-check.

use log::info;

use crate::error::{Error, Result};
use crate::platform::Platform;

/// What the process should do after the startup check.
#[derive(Debug, PartialEq, Eq)]
pub enum Gate {
    /// Rights are present; carry on.
    Proceed,
    /// Exit with `code`, printing `message` first if there is one.
    Exit { code: i32, message: Option<String> },
}

/// Check rights at startup and run the platform elevation flow if they are missing.
///
/// Platforms without an elevation prompt fail `elevate` with an instruction,
/// which becomes the exit message.
pub fn startup_gate(platform: &dyn Platform, assume_elevated: bool) -> Gate {
    if assume_elevated || platform.has_elevated_rights() {
        return Gate::Proceed;
    }
    match platform.elevate() {
        Ok(()) => {
            info!("relaunched with elevated rights");
            Gate::Exit {
                code: 0,
                message: None,
            }
        }
        Err(e) => Gate::Exit {
            code: 1,
            message: Some(e.to_string()),
        },
    }
}

/// Re-check rights before a mutating operation.
pub fn ensure_elevated(platform: &dyn Platform, assume_elevated: bool) -> Result<()> {
    if assume_elevated || platform.has_elevated_rights() {
        Ok(())
    } else {
        Err(Error::Privilege(
            "restart this program as administrator to modify the hosts file".to_string(),
        ))
    }
}
