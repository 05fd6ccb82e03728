//! Directory Scanner: lists the user-visible entries of one directory.

use crate::error::{GalleryError, Result};
use crate::paths::{self, DataRoot};
use crate::types::{FileKind, RawEntry};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Stateless single-level directory lister
///
/// Blocking: async callers run it on the blocking pool.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    root: DataRoot,
}

impl DirectoryScanner {
    pub fn new(root: DataRoot) -> Self {
        Self { root }
    }

    /// List `dir` (a normalized relative path) without internal artifacts.
    ///
    /// Entries come back ordered by name so that listings are deterministic.
    /// Entries that vanish between the directory read and the stat are skipped.
    /// A path naming a file is an [`GalleryError::InvalidTarget`].
    pub fn list(&self, dir: &str) -> Result<Vec<RawEntry>> {
        let abs = self.root.absolute(dir);
        let stat = std::fs::metadata(&abs).map_err(|e| GalleryError::from_io(dir, e))?;
        if !stat.is_dir() {
            return Err(GalleryError::invalid_target(dir, "not a directory"));
        }
        let read = std::fs::read_dir(&abs).map_err(|e| GalleryError::from_io(dir, e))?;

        let mut entries = Vec::new();
        for entry in read {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(dir, error = %e, "failed to read directory entry");
                    continue;
                }
            };

            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!(dir, name = ?raw, "skipping non UTF-8 file name");
                    continue;
                }
            };
            if paths::is_artifact_name(&name) {
                continue;
            }

            // Follows symlinks, like a plain stat of the entry path
            let stat = match std::fs::metadata(entry.path()) {
                Ok(stat) => stat,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(dir, name = %name, "entry vanished during scan");
                    continue;
                }
                Err(source) => {
                    return Err(GalleryError::Io {
                        path: paths::join(dir, &name),
                        source,
                    })
                }
            };

            let modified_at: DateTime<Utc> = stat
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| DateTime::<Utc>::from(std::time::UNIX_EPOCH));
            let kind = if stat.is_dir() {
                FileKind::Directory
            } else {
                FileKind::File
            };

            entries.push(RawEntry {
                path: paths::join(dir, &name),
                name,
                kind,
                modified_at,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
