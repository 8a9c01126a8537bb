//! Actions shared by the interactive shell and the subcommands.

use std::fs;
use std::path::PathBuf;

use crate::backup::{self, BackupSnapshot};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::fetch::{ContentFetcher, HttpGet};
use crate::hosts::{self, UpdateOutcome};
use crate::platform::Platform;
use crate::privilege;

/// Result of a manual edit. The edit itself succeeded; the flush may not have.
#[derive(Debug)]
pub struct EditOutcome {
    pub dns_flush: Result<()>,
}

pub struct App {
    settings: Settings,
    platform: Box<dyn Platform>,
    client: Box<dyn HttpGet>,
}

impl App {
    pub fn new(settings: Settings, platform: Box<dyn Platform>, client: Box<dyn HttpGet>) -> Self {
        Self {
            settings,
            platform,
            client,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    fn ensure_elevated(&self) -> Result<()> {
        privilege::ensure_elevated(self.platform.as_ref(), self.settings.assume_elevated)
    }

    /// Refresh the managed block from the remote sources.
    pub fn update(&self) -> Result<UpdateOutcome> {
        self.ensure_elevated()?;
        let fetcher = ContentFetcher::new(self.client.as_ref(), self.settings.timeout);
        hosts::update(&self.settings, &fetcher, self.platform.as_ref())
    }

    pub fn flush_dns(&self) -> Result<()> {
        self.platform.flush_dns()
    }

    /// Current hosts file content.
    pub fn read_hosts(&self) -> Result<String> {
        let path = &self.settings.hosts_file;
        fs::read_to_string(path).map_err(Error::io("read", path))
    }

    /// Open the hosts file in an editor, then flush DNS.
    pub fn edit(&self) -> Result<EditOutcome> {
        self.ensure_elevated()?;
        self.platform.open_editor(&self.settings.hosts_file)?;
        Ok(EditOutcome {
            dns_flush: self.platform.flush_dns(),
        })
    }

    /// Open the directory holding the hosts file; returns that directory.
    pub fn open_directory(&self) -> Result<PathBuf> {
        let dir = self.settings.hosts_dir();
        self.platform.open_directory(&dir)?;
        Ok(dir)
    }

    /// Saved backups, newest first.
    pub fn backups(&self) -> Result<Vec<BackupSnapshot>> {
        backup::list(&self.settings.hosts_dir())
    }
}
