//! Image Gallery: metadata-augmented media file store
//!
//! Browses a directory tree of media files and augments every entry with
//! persisted sidecar state (hidden, bookmarked, EXIF) and a cached preview
//! rendered by an external transcoder.

pub mod bookmarks;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod gallery;
pub mod logging;
pub mod paths;
pub mod preview;
pub mod process;
pub mod scanner;
pub mod store;
pub mod tooling;
pub mod types;

pub use error::{GalleryError, Result};
pub use gallery::{GalleryAssembler, GalleryOptions, Resolved};
pub use types::{FileEntry, FileKind};
