//! Error kinds shared by every component.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The process lacks the rights needed to modify the hosts file.
    #[error("administrator rights required: {0}")]
    Privilege(String),

    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A single remote source failed; the fetcher moves on to the next one.
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("no hosts content could be fetched ({tried} source(s) tried)")]
    Fetch { tried: usize },

    /// Writing the merged hosts file failed and the original content was restored.
    #[error("failed to write {}: {source} (original content restored)", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing failed and so did putting the original content back.
    #[error("failed to write {}: {source}; restoring the original also failed: {restore}", .path.display())]
    WriteAndRestore {
        path: PathBuf,
        #[source]
        source: io::Error,
        restore: io::Error,
    },

    #[error("{program} failed: {reason}")]
    Subprocess { program: String, reason: String },
}

impl Error {
    /// Build an `Error::Io` mapper for `map_err`.
    pub fn io<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> Error + 'a {
        move |source| Error::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn network(url: &str, reason: impl std::fmt::Display) -> Error {
        Error::Network {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn subprocess(program: &str, reason: impl std::fmt::Display) -> Error {
        Error::Subprocess {
            program: program.to_string(),
            reason: reason.to_string(),
        }
    }
}
