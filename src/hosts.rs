//! Managed block handling for the hosts file.
//!
//! Everything between `START_MARKER` and `END_MARKER` belongs to this tool and
//! is replaced wholesale on every update. All other lines are kept verbatim.

use std::fs;
use std::io;
use std::path::Path;

use log::{info, warn};

use crate::backup::{self, BackupSnapshot, PruneOutcome};
use crate::config::{Settings, END_MARKER, START_MARKER};
use crate::error::{Error, Result};
use crate::fetch::ContentFetcher;
use crate::platform::Platform;

/// Lines of `content` outside the managed block, trailing blank lines trimmed.
///
/// A start marker with no end marker swallows the rest of the file. A second
/// start marker inside a block is just another dropped line.
pub fn strip_managed_block(content: &str) -> Vec<&str> {
    let mut kept = Vec::new();
    let mut inside = false;
    for line in content.lines() {
        if !inside && line.contains(START_MARKER) {
            inside = true;
            continue;
        }
        if line.contains(END_MARKER) {
            inside = false;
            continue;
        }
        if !inside {
            kept.push(line);
        }
    }
    while kept.last().is_some_and(|l| l.trim().is_empty()) {
        kept.pop();
    }
    kept
}

/// Append a fresh managed block holding `block` after the `kept` lines.
pub fn merge(kept: &[&str], block: &str) -> String {
    let mut out = String::new();
    if !kept.is_empty() {
        out.push_str(&kept.join("\n"));
        out.push_str("\n\n");
    }
    out.push_str(START_MARKER);
    out.push('\n');
    out.push_str(block);
    out.push('\n');
    out.push_str(END_MARKER);
    out.push('\n');
    out
}

/// Replace any managed block in `original` with `block`.
pub fn render(original: &str, block: &str) -> String {
    merge(&strip_managed_block(original), block)
}

/// Contents of the managed block, if the file has a complete one.
pub fn managed_block(content: &str) -> Option<String> {
    let mut lines = content.lines();
    lines.by_ref().find(|l| l.contains(START_MARKER))?;
    let mut block = Vec::new();
    for line in lines {
        if line.contains(END_MARKER) {
            return Some(block.join("\n"));
        }
        block.push(line);
    }
    None
}

/// Overwrite `path` with `content`; on failure try to put `original` back.
pub fn write_or_restore(path: &Path, content: &str, original: &str) -> Result<()> {
    write_or_restore_with(path, content, original, |p, c| fs::write(p, c))
}

/// [`write_or_restore`] with the file write supplied by the caller.
pub fn write_or_restore_with<F>(
    path: &Path,
    content: &str,
    original: &str,
    mut write: F,
) -> Result<()>
where
    F: FnMut(&Path, &str) -> io::Result<()>,
{
    let Err(source) = write(path, content) else {
        return Ok(());
    };
    warn!("writing {} failed: {source}; restoring original", path.display());
    match write(path, original) {
        Ok(()) => Err(Error::Write {
            path: path.to_path_buf(),
            source,
        }),
        Err(restore) => Err(Error::WriteAndRestore {
            path: path.to_path_buf(),
            source,
            restore,
        }),
    }
}

/// Result of a successful update.
#[derive(Debug)]
pub struct UpdateOutcome {
    pub backup: BackupSnapshot,
    pub pruned: PruneOutcome,
    /// The hosts file is already written when this is an error.
    pub dns_flush: Result<()>,
}

/// Back up, fetch, rewrite the managed block and flush DNS.
///
/// The hosts file is untouched unless the final write is reached.
pub fn update(
    settings: &Settings,
    fetcher: &ContentFetcher<'_>,
    platform: &dyn Platform,
) -> Result<UpdateOutcome> {
    let path = settings.hosts_file.as_path();
    let original = fs::read_to_string(path).map_err(Error::io("read", path))?;

    let backup = backup::write_snapshot(&settings.hosts_dir(), &original)?;
    info!("backup saved to {}", backup.path.display());

    // best-effort: failures are reported in the outcome only
    let pruned = backup::prune(&settings.hosts_dir(), settings.keep);

    let block = fetcher.fetch(&settings.sources).ok_or(Error::Fetch {
        tried: settings.sources.len(),
    })?;

    let merged = render(&original, &block);
    write_or_restore(path, &merged, &original)?;
    info!("hosts file {} updated", path.display());

    let dns_flush = platform.flush_dns();
    if let Err(e) = &dns_flush {
        warn!("DNS flush failed: {e}");
    }

    Ok(UpdateOutcome {
        backup,
        pruned,
        dns_flush,
    })
}
