//! Timestamped hosts backups and retention.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use log::{debug, warn};

use crate::error::{Error, Result};

const BACKUP_PREFIX: &str = "hosts.";
const BACKUP_SUFFIX: &str = ".bak";

/// A saved copy of the hosts file.
#[derive(Debug, Clone)]
pub struct BackupSnapshot {
    pub path: PathBuf,
    pub modified: DateTime<Local>,
}

/// What a prune pass did. Failures are recorded, never propagated.
#[derive(Debug, Default)]
pub struct PruneOutcome {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, std::io::Error)>,
}

/// `hosts.YYYYMMDD_HHMMSS.bak` for the given time.
pub fn backup_file_name(at: DateTime<Local>) -> String {
    format!("{BACKUP_PREFIX}{}{BACKUP_SUFFIX}", at.format("%Y%m%d_%H%M%S"))
}

/// Matches `hosts.*.bak` with a non-empty middle part.
pub fn is_backup_name(name: &str) -> bool {
    name.len() > BACKUP_PREFIX.len() + BACKUP_SUFFIX.len()
        && name.starts_with(BACKUP_PREFIX)
        && name.ends_with(BACKUP_SUFFIX)
}

/// Copy the current hosts file into `backup_dir`.
pub fn snapshot(hosts_path: &Path, backup_dir: &Path) -> Result<BackupSnapshot> {
    let content = fs::read_to_string(hosts_path).map_err(Error::io("read", hosts_path))?;
    write_snapshot(backup_dir, &content)
}

/// Write `content` verbatim to a new backup file in `backup_dir`.
///
/// Two snapshots taken within the same second get a `-N` suffix instead of
/// overwriting each other.
pub fn write_snapshot(backup_dir: &Path, content: &str) -> Result<BackupSnapshot> {
    let now = Local::now();
    let name = backup_file_name(now);
    let mut path = backup_dir.join(&name);
    let mut n = 1;
    let mut file = loop {
        match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => break f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let stem = name.trim_end_matches(BACKUP_SUFFIX);
                path = backup_dir.join(format!("{stem}-{n}{BACKUP_SUFFIX}"));
                n += 1;
            }
            Err(e) => return Err(Error::io("create backup", &path)(e)),
        }
    };
    file.write_all(content.as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(Error::io("write backup", &path))?;
    debug!("backed up hosts to {}", path.display());
    Ok(BackupSnapshot {
        path,
        modified: now,
    })
}

/// Backup files in `backup_dir`, oldest first. Entries whose metadata cannot
/// be read are skipped; equal mtimes are ordered by name.
fn backup_entries(backup_dir: &Path) -> std::io::Result<Vec<(PathBuf, SystemTime)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(backup_dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry in {}: {e}", backup_dir.display());
                continue;
            }
        };
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !is_backup_name(name) {
            continue;
        }
        let path = entry.path();
        let modified = entry.metadata().and_then(|meta| {
            if meta.is_file() {
                meta.modified().map(Some)
            } else {
                Ok(None)
            }
        });
        match modified {
            Ok(Some(modified)) => entries.push((path, modified)),
            Ok(None) => {}
            Err(e) => warn!("skipping backup {}: {e}", path.display()),
        }
    }
    entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    Ok(entries)
}

/// Delete all but the newest `keep` backups (by modification time).
pub fn prune(backup_dir: &Path, keep: usize) -> PruneOutcome {
    let mut outcome = PruneOutcome::default();
    let entries = match backup_entries(backup_dir) {
        Ok(e) => e,
        Err(e) => {
            warn!("could not list backups in {}: {e}", backup_dir.display());
            return outcome;
        }
    };
    let excess = entries.len().saturating_sub(keep);
    for (path, _) in entries.into_iter().take(excess) {
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("removed old backup {}", path.display());
                outcome.removed.push(path);
            }
            Err(e) => {
                warn!("could not remove {}: {e}", path.display());
                outcome.failed.push((path, e));
            }
        }
    }
    outcome
}

/// Backups in `backup_dir`, newest first.
pub fn list(backup_dir: &Path) -> Result<Vec<BackupSnapshot>> {
    let entries = backup_entries(backup_dir).map_err(Error::io("list backups in", backup_dir))?;
    Ok(entries
        .into_iter()
        .rev()
        .map(|(path, modified)| BackupSnapshot {
            path,
            modified: DateTime::<Local>::from(modified),
        })
        .collect())
}
