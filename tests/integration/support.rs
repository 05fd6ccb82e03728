//! Shared fixtures: a temp data root and fake external tools.

use async_trait::async_trait;
use image_gallery::error::ToolError;
use image_gallery::paths::DataRoot;
use image_gallery::preview::Transcoder;
use image_gallery::store::enrich::{MetadataEnricher, RawRecord};
use image_gallery::{GalleryAssembler, GalleryOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

/// Transcoder that writes a marker file and counts invocations
pub struct FakeTranscoder {
    pub calls: AtomicUsize,
    pub active: AtomicUsize,
    pub peak: AtomicUsize,
    pub fail: bool,
    pub delay: Duration,
}

impl FakeTranscoder {
    pub fn working() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            fail: false,
            delay: Duration::ZERO,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            fail: true,
            delay: Duration::ZERO,
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            fail: false,
            delay,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most transcodes observed running at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn transcode(&self, source: &Path, target: &Path) -> Result<(), ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
        if self.fail {
            return Err(ToolError::InvalidOutput(format!(
                "cannot decode {}",
                source.display()
            )));
        }
        tokio::fs::write(target, b"scaled").await?;
        Ok(())
    }
}

/// Enricher returning a fixed exiftool-style record
pub struct FakeEnricher;

#[async_trait]
impl MetadataEnricher for FakeEnricher {
    async fn enrich(&self, source: &Path) -> Result<RawRecord, ToolError> {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let value = serde_json::json!({
            "SourceFile": source.display().to_string(),
            "FileName": name,
            "ImageWidth": 1024,
            "ImageHeight": 768,
        });
        Ok(value.as_object().cloned().unwrap_or_default())
    }
}

pub struct Fixture {
    pub temp: TempDir,
    pub transcoder: Arc<FakeTranscoder>,
    pub gallery: Arc<GalleryAssembler>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_transcoder(FakeTranscoder::working())
    }

    pub fn with_transcoder(transcoder: Arc<FakeTranscoder>) -> Self {
        Self::with_options(transcoder, GalleryOptions::default())
    }

    pub fn with_options(transcoder: Arc<FakeTranscoder>, options: GalleryOptions) -> Self {
        let temp = tempfile::tempdir().unwrap();
        let root = DataRoot::open(temp.path()).unwrap();
        let gallery = GalleryAssembler::new(
            root,
            transcoder.clone(),
            Some(Arc::new(FakeEnricher)),
            options,
        );
        Self {
            temp,
            transcoder,
            gallery: Arc::new(gallery),
        }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.temp.path().join(rel)
    }

    /// Create a file with the given mtime in seconds since the epoch.
    pub fn file(&self, rel: &str, mtime_secs: u64) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, b"media").unwrap();
        set_mtime(&path, mtime_secs);
        path
    }

    pub fn dir(&self, rel: &str, mtime_secs: u64) -> PathBuf {
        let path = self.path(rel);
        std::fs::create_dir_all(&path).unwrap();
        set_mtime(&path, mtime_secs);
        path
    }
}

pub fn set_mtime(path: &Path, secs: u64) {
    let time: SystemTime = UNIX_EPOCH + Duration::from_secs(secs);
    let file = std::fs::File::options()
        .read(true)
        .open(path)
        .unwrap();
    file.set_modified(time).unwrap();
}
