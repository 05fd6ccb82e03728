//! Atomic record persistence
//!
//! Records are written to a temp file in the target's directory and renamed
//! over the target, so readers see either the old or the new content. Temp
//! files carry an artifact suffix and never show up in listings.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempPath};

/// Write `bytes` to `target` atomically. The temp file uses `suffix`.
pub fn write_atomic(target: &Path, bytes: &[u8], suffix: &str) -> std::io::Result<()> {
    let dir = parent_dir(target);
    let mut file = Builder::new().prefix(".").suffix(suffix).tempfile_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// Reserve a temp path next to `target` for an external writer.
///
/// The file is removed when the returned path is dropped without being
/// persisted.
pub fn reserve_temp(target: &Path, suffix: &str) -> std::io::Result<TempPath> {
    let dir = parent_dir(target);
    Ok(Builder::new()
        .prefix(".")
        .suffix(suffix)
        .tempfile_in(dir)?
        .into_temp_path())
}

fn parent_dir(target: &Path) -> PathBuf {
    match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
