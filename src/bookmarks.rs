//! Bookmark Index
//!
//! Ordered set of bookmarked paths persisted as a single JSON record at the
//! data root. Every read-modify-write runs under one index lock; callers that
//! must update a file's metadata together with the index hold the path lock
//! first and then take [`BookmarkIndex::lock`].
//!
//! The lock is a plain mutex and index I/O is synchronous, so an
//! [`IndexGuard`] is never held across an await point.

use crate::error::{GalleryError, Result};
use crate::paths::META_SUFFIX;
use crate::store::persistence;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk shape of the index
///
/// Unknown keys are rejected so a foreign record is reported as corrupt
/// instead of being read as empty and overwritten. `Files` is the key older
/// gallery builds wrote, and they wrote `null` for an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookmarkList {
    #[serde(default, alias = "Files", deserialize_with = "nullable_files")]
    pub files: Vec<String>,
}

fn nullable_files<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Global bookmark index
pub struct BookmarkIndex {
    path: PathBuf,
    lock: Mutex<()>,
}

impl BookmarkIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the index lock for a sequence of operations.
    pub fn lock(&self) -> IndexGuard<'_> {
        IndexGuard {
            index: self,
            _guard: self.lock.lock(),
        }
    }

    /// Bookmarked paths in insertion order. Creates an empty index if absent.
    pub fn list(&self) -> Result<Vec<String>> {
        self.lock().list()
    }

    pub fn add(&self, rel: &str) -> Result<bool> {
        self.lock().add(rel)
    }

    pub fn remove(&self, rel: &str) -> Result<bool> {
        self.lock().remove(rel)
    }

    fn read(&self) -> Result<BookmarkList> {
        let index_path = self.path.display().to_string();
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty = BookmarkList::default();
                self.write(&empty)?;
                debug!(path = %index_path, "created empty bookmark index");
                return Ok(empty);
            }
            Err(source) => {
                return Err(GalleryError::Io {
                    path: index_path,
                    source,
                })
            }
        };
        serde_json::from_slice(&bytes).map_err(|source| GalleryError::CorruptMetadata {
            path: index_path,
            source,
        })
    }

    fn write(&self, list: &BookmarkList) -> Result<()> {
        let index_path = self.path.display().to_string();
        let bytes = serde_json::to_vec(list).map_err(|e| GalleryError::PersistenceFailed {
            path: index_path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        persistence::write_atomic(&self.path, &bytes, META_SUFFIX).map_err(|source| {
            GalleryError::PersistenceFailed {
                path: index_path,
                source,
            }
        })
    }
}

/// Exclusive access to the index while held
pub struct IndexGuard<'a> {
    index: &'a BookmarkIndex,
    _guard: MutexGuard<'a, ()>,
}

impl IndexGuard<'_> {
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.index.read()?.files)
    }

    pub fn contains(&self, rel: &str) -> Result<bool> {
        Ok(self.index.read()?.files.iter().any(|f| f == rel))
    }

    /// Append `rel` unless already present. Returns whether it was added.
    pub fn add(&self, rel: &str) -> Result<bool> {
        let mut list = self.index.read()?;
        if list.files.iter().any(|f| f == rel) {
            return Ok(false);
        }
        list.files.push(rel.to_string());
        self.index.write(&list)?;
        Ok(true)
    }

    /// Remove `rel` if present. Returns whether it was removed.
    pub fn remove(&self, rel: &str) -> Result<bool> {
        let mut list = self.index.read()?;
        let before = list.files.len();
        list.files.retain(|f| f != rel);
        if list.files.len() == before {
            return Ok(false);
        }
        self.index.write(&list)?;
        Ok(true)
    }
}
