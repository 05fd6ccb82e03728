//! Data root layout and canonical relative paths.
//!
//! Every path handed to the store is relative to the data root and is
//! normalized to forward slashes before it is used as a lock key, an index
//! entry or a sidecar location.

use crate::error::{GalleryError, Result};
use std::path::{Component, Path, PathBuf};

/// Suffix of the per-file metadata sidecar.
pub const META_SUFFIX: &str = ".meta";

/// Suffix of the per-file preview artifact.
pub const PREVIEW_SUFFIX: &str = ".preview";

/// Fixed name of the bookmark index at the data root.
pub const BOOKMARK_INDEX_FILE: &str = ".bookmark";

/// Whether a bare file name is an internal artifact rather than user content.
pub fn is_artifact_name(name: &str) -> bool {
    name.ends_with(META_SUFFIX) || name.ends_with(PREVIEW_SUFFIX) || name == BOOKMARK_INDEX_FILE
}

/// Whether the final component of a normalized path is an internal artifact.
pub fn is_artifact_path(rel: &str) -> bool {
    is_artifact_name(file_name(rel))
}

/// Normalize a caller-supplied path into canonical relative form.
///
/// Backslashes become forward slashes, empty and `.` components are dropped.
/// `..` and anything the host treats as a drive or root (`C:` on Windows)
/// are rejected so a path can never leave the data root. The empty string
/// is the data root itself.
pub fn normalize(input: &str) -> Result<String> {
    let replaced = input.replace('\\', "/");
    let mut parts = Vec::new();
    for component in replaced.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                return Err(GalleryError::invalid_target(
                    input,
                    "path escapes the data root",
                ))
            }
            other if !is_plain_component(other) => {
                return Err(GalleryError::invalid_target(
                    input,
                    "path component is not a plain name",
                ))
            }
            other => parts.push(other),
        }
    }
    Ok(parts.join("/"))
}

fn is_plain_component(part: &str) -> bool {
    let mut components = Path::new(part).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Join a normalized directory path and an entry name.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Final component of a normalized path.
pub fn file_name(rel: &str) -> &str {
    rel.rsplit('/').next().unwrap_or(rel)
}

/// Relative path of the metadata sidecar for `rel`.
pub fn meta_of(rel: &str) -> String {
    format!("{}{}", rel, META_SUFFIX)
}

/// Relative path of the preview artifact for `rel`.
pub fn preview_of(rel: &str) -> String {
    format!("{}{}", rel, PREVIEW_SUFFIX)
}

/// Root directory that holds media files and their sidecars.
#[derive(Debug, Clone)]
pub struct DataRoot {
    root: PathBuf,
}

impl DataRoot {
    /// Open a data root, canonicalizing it.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let canonical = dunce::canonicalize(root)
            .map_err(|e| GalleryError::from_io(&root.display().to_string(), e))?;
        if !canonical.is_dir() {
            return Err(GalleryError::ConfigError(format!(
                "Data root is not a directory: {}",
                canonical.display()
            )));
        }
        Ok(Self { root: canonical })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Filesystem location of a normalized relative path.
    pub fn absolute(&self, rel: &str) -> PathBuf {
        let mut path = self.root.clone();
        for part in rel.split('/').filter(|p| !p.is_empty()) {
            path.push(part);
        }
        path
    }

    pub fn bookmark_index_path(&self) -> PathBuf {
        self.root.join(BOOKMARK_INDEX_FILE)
    }
}
