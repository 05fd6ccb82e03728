//! Core types shared by the scanner and the gallery assembler.

use crate::store::Metadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Directory,
}

/// Entry as it comes out of a directory scan, before metadata is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub name: String,
    /// Canonical forward-slash path relative to the data root
    pub path: String,
    pub kind: FileKind,
    pub modified_at: DateTime<Utc>,
}

/// Listing entry with its metadata and preview reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub kind: FileKind,
    pub path: String,
    /// Equal to `path` when no distinct preview is available
    pub preview_path: String,
    pub modified_at: DateTime<Utc>,
    pub metadata: Metadata,
}

impl FileEntry {
    pub fn is_directory(&self) -> bool {
        self.kind == FileKind::Directory
    }

    /// Whether a generated preview exists for this entry.
    pub fn has_distinct_preview(&self) -> bool {
        self.preview_path != self.path
    }
}
