//! Atomic installation of a freshly built file as the live file at a path
//! (§4.8, §9 Design Notes).
//!
//! The engine's own `merge_complete` handler uses [`install`]: write the new
//! file under its own name, then `rename` it onto the live path. A single
//! `rename` is atomic on the filesystems this engine targets, so `install`
//! has exactly one commit point and no observable half-written state.
//!
//! [`swap_files`] retains the three-rename dance (§4.8) for callers that
//! need to exchange two existing live files by name rather than install a
//! freshly written one. It is not crash-atomic — a failure after the first
//! rename leaves the old file sitting under `a`'s staging name — so the
//! engine does not use it for its own data/directory swap.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// The staging name used while a file is being written out before it
/// replaces `path`.
pub(crate) fn staging_path(path: &Path) -> PathBuf {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    PathBuf::from(staging)
}

/// Installs `new_path` as `live_path` by rename. The rename is the commit
/// point: once it returns, `live_path` is either the old contents or the
/// new ones, never a mix.
pub(crate) fn install(new_path: &Path, live_path: &Path) -> Result<()> {
    std::fs::rename(new_path, live_path)?;
    log::debug!("installed {} as {}", new_path.display(), live_path.display());
    Ok(())
}

/// Exchanges the files at `a` and `b` via a three-rename dance through a
/// `.tmp` name. Not crash-atomic (see module docs); kept for API
/// completeness where symmetric name preservation is genuinely needed.
#[allow(dead_code)]
pub(crate) fn swap_files(a: &Path, b: &Path) -> Result<()> {
    let staging = staging_path(a);
    std::fs::rename(a, &staging)?;
    std::fs::rename(b, a)?;
    std::fs::rename(&staging, b)?;
    Ok(())
}
