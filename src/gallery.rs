//! Gallery Assembler
//!
//! Composes scanner, sidecar metadata, previews and the bookmark index into
//! listings and single-file views, and exposes the two user mutations (hide,
//! toggle bookmark).
//!
//! Lock order is always path lock, then index lock.

use crate::bookmarks::BookmarkIndex;
use crate::concurrency::PathLockManager;
use crate::config::GalleryConfig;
use crate::error::{GalleryError, Result};
use crate::paths::{self, DataRoot};
use crate::preview::{FfmpegTranscoder, PreviewCache, PreviewSettings, Transcoder};
use crate::scanner::DirectoryScanner;
use crate::store::enrich::{ExiftoolEnricher, MetadataEnricher};
use crate::store::{Metadata, SidecarMetadataStore};
use crate::types::{FileEntry, FileKind, RawEntry};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Result of resolving a single path
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    File(FileEntry),
    Directory(Vec<FileEntry>),
}

/// Tuning for a [`GalleryAssembler`]
#[derive(Debug, Clone)]
pub struct GalleryOptions {
    pub listing_concurrency: usize,
    pub preview: PreviewSettings,
    pub enrich_timeout: Duration,
}

impl Default for GalleryOptions {
    fn default() -> Self {
        Self {
            listing_concurrency: 8,
            preview: PreviewSettings::default(),
            enrich_timeout: Duration::from_secs(10),
        }
    }
}

/// Metadata-augmented view over a data root
pub struct GalleryAssembler {
    root: DataRoot,
    locks: PathLockManager,
    metadata: SidecarMetadataStore,
    previews: PreviewCache,
    bookmarks: BookmarkIndex,
    scanner: DirectoryScanner,
    listing_concurrency: usize,
}

impl GalleryAssembler {
    pub fn new(
        root: DataRoot,
        transcoder: Arc<dyn Transcoder>,
        enricher: Option<Arc<dyn MetadataEnricher>>,
        options: GalleryOptions,
    ) -> Self {
        let mut metadata = SidecarMetadataStore::new(root.clone());
        if let Some(enricher) = enricher {
            metadata = metadata.with_enricher(enricher, options.enrich_timeout);
        }

        Self {
            locks: PathLockManager::new(),
            metadata,
            previews: PreviewCache::new(root.clone(), transcoder, options.preview),
            bookmarks: BookmarkIndex::new(root.bookmark_index_path()),
            scanner: DirectoryScanner::new(root.clone()),
            listing_concurrency: options.listing_concurrency.max(1),
            root,
        }
    }

    /// Build with the ffmpeg transcoder and exiftool enricher from configuration.
    pub fn from_config(config: &GalleryConfig) -> Result<Self> {
        config.validate()?;
        let root = DataRoot::open(&config.data_dir)?;
        let transcoder = Arc::new(FfmpegTranscoder::new(
            config.preview.program.clone(),
            config.preview.scale_height,
        ));
        let enricher: Option<Arc<dyn MetadataEnricher>> = if config.enrichment.enabled {
            Some(Arc::new(ExiftoolEnricher::new(
                config.enrichment.program.clone(),
            )))
        } else {
            None
        };
        let options = GalleryOptions {
            listing_concurrency: config.listing_concurrency,
            preview: PreviewSettings {
                timeout: config.preview.timeout(),
                max_concurrent: config.preview.max_concurrent,
            },
            enrich_timeout: config.enrichment.timeout(),
        };
        Ok(Self::new(root, transcoder, enricher, options))
    }

    pub fn root(&self) -> &DataRoot {
        &self.root
    }

    pub fn bookmarks(&self) -> &BookmarkIndex {
        &self.bookmarks
    }

    pub fn metadata_store(&self) -> &SidecarMetadataStore {
        &self.metadata
    }

    /// Resolve a file to its entry, or a directory to its listing.
    ///
    /// Artifact paths are not public content and resolve to `NotFound`.
    /// A hidden file is still returned, with `metadata.hidden` set.
    pub async fn resolve(&self, path: &str) -> Result<Resolved> {
        let rel = paths::normalize(path)?;
        if paths::is_artifact_path(&rel) {
            return Err(GalleryError::NotFound(rel));
        }

        let stat = tokio::fs::metadata(self.root.absolute(&rel))
            .await
            .map_err(|e| GalleryError::from_io(&rel, e))?;
        if stat.is_dir() {
            return Ok(Resolved::Directory(self.list_directory(&rel).await?));
        }

        let modified_at = modified_at(&stat);
        let entry = self.file_entry(&rel, modified_at, false).await?;
        entry
            .map(Resolved::File)
            .ok_or(GalleryError::NotFound(rel))
    }

    /// Visible entries of `dir`, most recently modified first.
    ///
    /// Hidden files are skipped. Previews are generated for files that lack
    /// one, with at most `listing_concurrency` entries resolved at once.
    pub async fn list_directory(&self, dir: &str) -> Result<Vec<FileEntry>> {
        let rel = paths::normalize(dir)?;
        let scanner = self.scanner.clone();
        let scan_dir = rel.clone();
        let raw = tokio::task::spawn_blocking(move || scanner.list(&scan_dir))
            .await
            .map_err(|e| GalleryError::Io {
                path: rel.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })??;
        let scanned = raw.len();

        let mut entries: Vec<FileEntry> = stream::iter(raw)
            .map(|entry| self.entry_for(entry))
            .buffered(self.listing_concurrency)
            .try_filter_map(|entry| async move { Ok(entry) })
            .try_collect()
            .await?;

        sort_by_recency(&mut entries);
        self.locks.prune_idle();
        debug!(dir = %rel, scanned, listed = entries.len(), "directory listed");
        Ok(entries)
    }

    /// Soft-delete a file. Hiding an already hidden file succeeds unchanged.
    pub async fn hide(&self, path: &str) -> Result<Metadata> {
        let rel = self.mutation_target(path).await?;
        let hidden = self.hide_locked(&rel).await;
        self.locks.prune_idle();
        hidden
    }

    async fn hide_locked(&self, rel: &str) -> Result<Metadata> {
        let _guard = self.locks.lock(rel).await;

        let mut metadata = self.metadata.load_or_create(rel).await?.into_metadata();
        if metadata.hide(Utc::now()) {
            self.metadata.save(rel, &metadata)?;
            info!(path = %rel, "file hidden");
        } else {
            debug!(path = %rel, "file already hidden");
        }
        Ok(metadata)
    }

    /// Flip a file's bookmark flag and sync the bookmark index.
    ///
    /// Metadata and index are written under the path lock and the index lock.
    /// If the index write fails the previous metadata is restored.
    pub async fn toggle_bookmark(&self, path: &str) -> Result<Metadata> {
        let rel = self.mutation_target(path).await?;
        let toggled = self.toggle_locked(&rel).await;
        self.locks.prune_idle();
        toggled
    }

    async fn toggle_locked(&self, rel: &str) -> Result<Metadata> {
        let _guard = self.locks.lock(rel).await;

        let previous = self.metadata.load_or_create(rel).await?.into_metadata();
        let mut next = previous.clone();
        let bookmarked = next.toggle_bookmark(Utc::now());

        {
            let index = self.bookmarks.lock();
            self.metadata.save(rel, &next)?;
            let synced = if bookmarked {
                index.add(rel)
            } else {
                index.remove(rel)
            };
            if let Err(err) = synced {
                if let Err(restore) = self.metadata.save(rel, &previous) {
                    error!(
                        path = %rel,
                        error = %restore,
                        "failed to restore metadata after bookmark index failure"
                    );
                }
                return Err(err);
            }
        }

        info!(path = %rel, bookmarked, "bookmark toggled");
        Ok(next)
    }

    /// Bookmarked, visible files in bookmark order.
    ///
    /// Index entries whose file vanished, was hidden, or is no longer
    /// bookmarked in its metadata are skipped, as are entries that do not
    /// name a file inside the data root.
    pub async fn bookmarked_entries(&self) -> Result<Vec<FileEntry>> {
        let mut listed = Vec::new();
        for raw in self.bookmarks.list()? {
            match paths::normalize(&raw) {
                Ok(rel) if !rel.is_empty() && !paths::is_artifact_path(&rel) => listed.push(rel),
                _ => warn!(entry = %raw, "skipping invalid bookmark index entry"),
            }
        }

        let entries = stream::iter(listed)
            .map(|rel| self.bookmarked_entry(rel))
            .buffered(self.listing_concurrency)
            .try_filter_map(|entry| async move { Ok(entry) })
            .try_collect()
            .await;
        self.locks.prune_idle();
        entries
    }

    async fn bookmarked_entry(&self, rel: String) -> Result<Option<FileEntry>> {
        let stat = match tokio::fs::metadata(self.root.absolute(&rel)).await {
            Ok(stat) if stat.is_file() => stat,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %rel, "bookmarked file no longer exists");
                return Ok(None);
            }
            Err(e) => return Err(GalleryError::from_io(&rel, e)),
        };

        let entry = self.file_entry(&rel, modified_at(&stat), true).await?;
        Ok(entry.filter(|e| e.metadata.bookmarked))
    }

    async fn entry_for(&self, raw: RawEntry) -> Result<Option<FileEntry>> {
        match raw.kind {
            FileKind::Directory => Ok(Some(FileEntry {
                kind: FileKind::Directory,
                preview_path: raw.path.clone(),
                path: raw.path,
                modified_at: raw.modified_at,
                metadata: Metadata::default(),
            })),
            FileKind::File => self.file_entry(&raw.path, raw.modified_at, true).await,
        }
    }

    /// Load metadata and ensure a preview under the path lock.
    /// Returns `None` for hidden files when `skip_hidden` is set.
    async fn file_entry(
        &self,
        rel: &str,
        modified_at: DateTime<Utc>,
        skip_hidden: bool,
    ) -> Result<Option<FileEntry>> {
        let _guard = self.locks.lock(rel).await;

        let metadata = self.metadata.load_or_create(rel).await?.into_metadata();
        if skip_hidden && metadata.hidden {
            return Ok(None);
        }

        let preview_path = self.previews.ensure_preview(rel).await;
        Ok(Some(FileEntry {
            kind: FileKind::File,
            path: rel.to_string(),
            preview_path,
            modified_at,
            metadata,
        }))
    }

    /// Validate a hide/bookmark target: a regular, non-artifact file.
    async fn mutation_target(&self, path: &str) -> Result<String> {
        let rel = paths::normalize(path)?;
        if rel.is_empty() {
            return Err(GalleryError::invalid_target(path, "the data root is a directory"));
        }
        if paths::is_artifact_path(&rel) {
            return Err(GalleryError::invalid_target(&rel, "internal artifact"));
        }

        let stat = tokio::fs::metadata(self.root.absolute(&rel))
            .await
            .map_err(|e| GalleryError::from_io(&rel, e))?;
        if stat.is_dir() {
            return Err(GalleryError::invalid_target(&rel, "directories cannot be modified"));
        }
        Ok(rel)
    }
}

/// Stable sort, most recently modified first; ties keep scan order.
pub fn sort_by_recency(entries: &mut [FileEntry]) {
    entries.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
}

fn modified_at(stat: &std::fs::Metadata) -> DateTime<Utc> {
    stat.modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| DateTime::<Utc>::from(std::time::UNIX_EPOCH))
}
