//! Runtime settings and well-known constants.
//!
//! There is no configuration file. Settings come from the command line and a
//! few GITHUB520_* env var overrides used for testing.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::platform::Platform;

/// First line of the block this tool owns.
pub const START_MARKER: &str = "# GitHub520 Host Start";
/// Last line of the block this tool owns.
pub const END_MARKER: &str = "# GitHub520 Host End";

/// Sources tried in order when none are given on the command line.
pub const DEFAULT_SOURCES: &[&str] = &["https://raw.hellogithub.com/hosts"];

/// Number of hosts backups kept after each update.
pub const DEFAULT_KEEP: usize = 3;

/// Per-request timeout for remote sources.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Overrides the hosts file location.
pub const HOSTS_FILE_ENV: &str = "GITHUB520_HOSTS_FILE";
/// Treat the process as elevated (tests only).
pub const SKIP_ELEVATION_ENV: &str = "GITHUB520_SKIP_ELEVATION";

#[derive(Debug, Clone)]
pub struct Settings {
    pub hosts_file: PathBuf,
    pub sources: Vec<String>,
    pub keep: usize,
    pub timeout: Duration,
    pub assume_elevated: bool,
}

impl Settings {
    /// Settings for a given hosts file with default sources and retention.
    pub fn from_hosts_file(hosts_file: impl Into<PathBuf>) -> Self {
        Self {
            hosts_file: hosts_file.into(),
            sources: DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect(),
            keep: DEFAULT_KEEP,
            timeout: FETCH_TIMEOUT,
            assume_elevated: false,
        }
    }

    /// Settings for testing: temp hosts file, elevation assumed.
    pub fn for_test(hosts_file: impl AsRef<Path>) -> Self {
        let mut settings = Self::from_hosts_file(hosts_file.as_ref());
        settings.assume_elevated = true;
        settings
    }

    /// Platform defaults (respects GITHUB520_HOSTS_FILE and GITHUB520_SKIP_ELEVATION).
    pub fn default_settings(platform: &dyn Platform) -> Self {
        let hosts_file = match std::env::var_os(HOSTS_FILE_ENV) {
            Some(path) => PathBuf::from(path),
            None => platform.hosts_path(),
        };
        let mut settings = Self::from_hosts_file(hosts_file);
        settings.assume_elevated = std::env::var_os(SKIP_ELEVATION_ENV).is_some();
        settings
    }

    /// Replace the source list; an empty list keeps the defaults.
    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        if !sources.is_empty() {
            self.sources = sources;
        }
        self
    }

    pub fn with_keep(mut self, keep: usize) -> Self {
        self.keep = keep;
        self
    }

    /// Directory holding the hosts file; backups are written here too.
    pub fn hosts_dir(&self) -> PathBuf {
        match self.hosts_file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}
