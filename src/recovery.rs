//! Startup recovery (§7, §9 open question 2).
//!
//! A background merge that fails removes its rawfile snapshot from the
//! engine's in-memory `rawfiles` list but never deletes the rawfiles
//! themselves — only a successful merge does that. A robust recovery scans
//! for `R.raw.*` at start and restores them to the pending list; this
//! module is that scan.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::rawfile;

/// Finds every `<root>.raw.*` file next to `root` and returns them in a
/// deterministic (sorted by name) order, so repeated recovery runs are
/// stable.
pub(crate) fn recover_pending_rawfiles(root: &Path) -> Result<Vec<PathBuf>> {
    let parent = match root.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut found = Vec::new();
    if !parent.exists() {
        return Ok(found);
    }
    for entry in std::fs::read_dir(&parent)? {
        let path = entry?.path();
        if rawfile::is_rawfile(root, &path) {
            found.push(path);
        }
    }
    found.sort();
    log::info!("recovered {} pending rawfile(s) at {}", found.len(), root.display());
    Ok(found)
}

fn suffixed(root: &Path, suffix: &str) -> PathBuf {
    let mut path = root.as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

/// Cleans up after a merge that crashed mid-install. `merge_complete`
/// installs `R.merged -> R.data` and then `R.buckets_merged -> R.buckets`
/// as two separate renames; a crash between them leaves `R.merged` gone
/// (its rename already committed) while `R.buckets_merged` is the one
/// directory consistent with the now-live `R.data`. That file must be
/// installed, not discarded, or the stale pre-merge `R.buckets` is left
/// live against the new data file.
///
/// If `R.merged` is still present, no install has happened yet and both
/// transient files are safe to discard — the next merge cycle regenerates
/// them from the rawfiles `recover_pending_rawfiles` restored. `R.rawmerged`
/// is never part of the install step and is always safe to discard.
pub(crate) fn clean_transient_merge_files(root: &Path) -> Result<()> {
    let merged_path = suffixed(root, ".merged");
    let buckets_merged_path = suffixed(root, ".buckets_merged");
    let buckets_path = suffixed(root, ".buckets");

    if merged_path.exists() {
        log::info!("discarding incomplete merge output for {}", root.display());
        std::fs::remove_file(&merged_path)?;
        if buckets_merged_path.exists() {
            std::fs::remove_file(&buckets_merged_path)?;
        }
    } else if buckets_merged_path.exists() {
        log::info!(
            "completing interrupted swap: installing {} as {}",
            buckets_merged_path.display(),
            buckets_path.display()
        );
        crate::swap::install(&buckets_merged_path, &buckets_path)?;
    }

    let rawmerged_path = suffixed(root, ".rawmerged");
    if rawmerged_path.exists() {
        std::fs::remove_file(&rawmerged_path)?;
    }
    Ok(())
}
