//! Preview Cache
//!
//! Lazily materializes `<file>.preview` through an external [`Transcoder`].
//! An existing preview is always reused; there is no freshness check against
//! the source. Concurrent requests for the same file share one generation,
//! and the number of transcoder processes running at once is bounded by a
//! semaphore-backed pool.
//!
//! Failures never reach the caller: the source path itself is returned as
//! the preview reference.

pub mod transcoder;

use crate::error::{GalleryError, ToolError};
use crate::paths::{self, DataRoot, PREVIEW_SUFFIX};
use crate::store::persistence;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OnceCell, Semaphore};
use tracing::{debug, info, warn};
pub use transcoder::{FfmpegTranscoder, Transcoder};

/// Preview cache settings
#[derive(Debug, Clone)]
pub struct PreviewSettings {
    /// Upper bound on one transcoder invocation
    pub timeout: Duration,
    /// Transcoder processes allowed to run at once
    pub max_concurrent: usize,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_concurrent: 4,
        }
    }
}

type InflightMap = HashMap<String, Arc<OnceCell<String>>>;

/// Single-flight preview generator keyed by source path
pub struct PreviewCache {
    root: DataRoot,
    transcoder: Arc<dyn Transcoder>,
    pool: Arc<Semaphore>,
    timeout: Duration,
    inflight: Mutex<InflightMap>,
}

impl PreviewCache {
    pub fn new(root: DataRoot, transcoder: Arc<dyn Transcoder>, settings: PreviewSettings) -> Self {
        Self {
            root,
            transcoder,
            pool: Arc::new(Semaphore::new(settings.max_concurrent.max(1))),
            timeout: settings.timeout,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Return the preview reference for `rel`, generating the artifact if needed.
    ///
    /// Returns `rel` itself when no preview could be produced.
    pub async fn ensure_preview(&self, rel: &str) -> String {
        let preview_rel = paths::preview_of(rel);
        if exists(&self.root.absolute(&preview_rel)).await {
            debug!(path = rel, "preview cache hit");
            return preview_rel;
        }

        let cell = {
            let mut map = self.inflight.lock();
            map.entry(preview_rel.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let result = cell
            .get_or_init(|| self.generate(rel, &preview_rel))
            .await
            .clone();

        {
            let mut map = self.inflight.lock();
            if map.get(&preview_rel).is_some_and(|c| Arc::ptr_eq(c, &cell)) {
                map.remove(&preview_rel);
            }
        }

        result
    }

    /// Generations currently in flight.
    pub fn inflight(&self) -> usize {
        self.inflight.lock().len()
    }

    async fn generate(&self, rel: &str, preview_rel: &str) -> String {
        let target = self.root.absolute(preview_rel);

        let _permit = match self.pool.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!(path = rel, "transcoder pool closed");
                return rel.to_string();
            }
        };

        // Another process may have produced it while we waited for a slot
        if exists(&target).await {
            return preview_rel.to_string();
        }

        match self.render(rel, &target).await {
            Ok(()) => {
                info!(path = rel, preview = preview_rel, "preview generated");
                preview_rel.to_string()
            }
            Err(source) => {
                let err = GalleryError::PreviewGenerationFailed {
                    path: rel.to_string(),
                    source,
                };
                warn!(path = rel, error = %err, "falling back to source as preview");
                rel.to_string()
            }
        }
    }

    async fn render(&self, rel: &str, target: &Path) -> Result<(), ToolError> {
        let source = self.root.absolute(rel);
        let temp = persistence::reserve_temp(target, PREVIEW_SUFFIX)?;

        match tokio::time::timeout(self.timeout, self.transcoder.transcode(&source, &temp)).await {
            Ok(result) => result?,
            Err(_) => return Err(ToolError::TimedOut(self.timeout)),
        }

        let len = tokio::fs::metadata(&temp).await?.len();
        if len == 0 {
            return Err(ToolError::InvalidOutput(
                "transcoder produced an empty preview".to_string(),
            ));
        }

        temp.persist(target).map_err(|e| ToolError::Io(e.error))?;
        Ok(())
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
