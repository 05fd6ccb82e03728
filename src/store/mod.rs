//! Sidecar Metadata Store
//!
//! One JSON record per regular file, stored next to it as `<file>.meta`.
//! Records are materialized lazily: the first [`SidecarMetadataStore::load_or_create`]
//! for a file writes a default record (enriched from EXIF when possible).
//!
//! The store does no locking of its own. Callers serialize access per path
//! through [`crate::concurrency::PathLockManager`].
//!
//! Record I/O is one small read or write and runs inline on the calling
//! task. A bookmark toggle performs it while holding the index lock, which
//! cannot be held across an await.

pub mod enrich;
pub mod persistence;

use crate::error::{GalleryError, Result};
use crate::paths::{self, DataRoot, META_SUFFIX};
use chrono::{DateTime, Utc};
use enrich::MetadataEnricher;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Structured EXIF record with snake_case keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Exif(pub BTreeMap<String, Value>);

impl Exif {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Persisted per-file metadata
///
/// Missing fields take their defaults, unknown fields make the record
/// corrupt. The aliases read sidecars written by older gallery builds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Metadata {
    #[serde(alias = "hide")]
    pub hidden: bool,
    #[serde(alias = "hide_time", deserialize_with = "lenient_timestamp")]
    pub hidden_at: Option<DateTime<Utc>>,
    #[serde(alias = "bookmark")]
    pub bookmarked: bool,
    #[serde(alias = "bookmark_time", deserialize_with = "lenient_timestamp")]
    pub bookmarked_at: Option<DateTime<Utc>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "non_empty_string"
    )]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Exif::is_empty")]
    pub exif: Exif,
}

impl Metadata {
    /// Mark hidden. Returns false when it already was; the first
    /// timestamp is kept in that case.
    pub fn hide(&mut self, at: DateTime<Utc>) -> bool {
        if self.hidden {
            return false;
        }
        self.hidden = true;
        self.hidden_at = Some(at);
        true
    }

    /// Flip the bookmark flag and stamp the transition. Returns the new state.
    pub fn toggle_bookmark(&mut self, at: DateTime<Utc>) -> bool {
        self.bookmarked = !self.bookmarked;
        self.bookmarked_at = Some(at);
        self.bookmarked
    }
}

/// RFC 3339, or the `2023-05-01 12:34:56.789 +0800 CST m=+0.1` layout of
/// older builds. Null and empty strings are unset.
fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;

    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(at.with_timezone(&Utc)));
    }

    let prefix = raw.split_whitespace().take(3).collect::<Vec<_>>().join(" ");
    DateTime::parse_from_str(&prefix, "%Y-%m-%d %H:%M:%S%.f %z")
        .map(|at| Some(at.with_timezone(&Utc)))
        .map_err(|_| D::Error::custom(format!("unrecognized timestamp: {}", raw)))
}

fn non_empty_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

/// Outcome of [`SidecarMetadataStore::load_or_create`]
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataLoad {
    /// An existing sidecar was read
    Existing(Metadata),
    /// No sidecar existed; a default record was written
    Created(Metadata),
}

impl MetadataLoad {
    pub fn was_created(&self) -> bool {
        matches!(self, MetadataLoad::Created(_))
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            MetadataLoad::Existing(m) | MetadataLoad::Created(m) => m,
        }
    }

    pub fn into_metadata(self) -> Metadata {
        match self {
            MetadataLoad::Existing(m) | MetadataLoad::Created(m) => m,
        }
    }
}

/// Reads and writes `<file>.meta` records
pub struct SidecarMetadataStore {
    root: DataRoot,
    enricher: Option<Arc<dyn MetadataEnricher>>,
    enrich_timeout: Duration,
}

impl SidecarMetadataStore {
    pub fn new(root: DataRoot) -> Self {
        Self {
            root,
            enricher: None,
            enrich_timeout: Duration::from_secs(10),
        }
    }

    /// Enrich newly created records through `enricher`, bounded by `timeout`.
    pub fn with_enricher(mut self, enricher: Arc<dyn MetadataEnricher>, timeout: Duration) -> Self {
        self.enricher = Some(enricher);
        self.enrich_timeout = timeout;
        self
    }

    /// Read an existing record without creating one.
    ///
    /// Malformed content is reported as [`GalleryError::CorruptMetadata`],
    /// never reset to a default.
    pub fn load(&self, rel: &str) -> Result<Option<Metadata>> {
        let meta_rel = paths::meta_of(rel);
        let bytes = match std::fs::read(self.root.absolute(&meta_rel)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(GalleryError::Io {
                    path: meta_rel,
                    source,
                })
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| GalleryError::CorruptMetadata {
                path: meta_rel,
                source,
            })
    }

    /// Read the record for `rel`, creating and persisting a default one if absent.
    ///
    /// Not a pure read: the first call for a file writes its sidecar.
    /// Enrichment failure is logged and the record is created without it.
    pub async fn load_or_create(&self, rel: &str) -> Result<MetadataLoad> {
        if let Some(existing) = self.load(rel)? {
            return Ok(MetadataLoad::Existing(existing));
        }

        let metadata = self.enriched_default(rel).await;
        self.save(rel, &metadata)?;
        debug!(path = rel, "created metadata record");
        Ok(MetadataLoad::Created(metadata))
    }

    /// Overwrite the sidecar for `rel`.
    pub fn save(&self, rel: &str, metadata: &Metadata) -> Result<()> {
        let meta_rel = paths::meta_of(rel);
        let bytes = serde_json::to_vec(metadata).map_err(|e| GalleryError::PersistenceFailed {
            path: meta_rel.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        persistence::write_atomic(&self.root.absolute(&meta_rel), &bytes, META_SUFFIX).map_err(
            |source| GalleryError::PersistenceFailed {
                path: meta_rel,
                source,
            },
        )
    }

    async fn enriched_default(&self, rel: &str) -> Metadata {
        let mut metadata = Metadata::default();
        let Some(enricher) = &self.enricher else {
            return metadata;
        };

        let source = self.root.absolute(rel);
        let outcome = tokio::time::timeout(self.enrich_timeout, enricher.enrich(&source)).await;
        let failure = match outcome {
            Ok(Ok(record)) => {
                let exif = enrich::normalize_keys(record);
                metadata.resolution = enrich::derive_resolution(&exif);
                metadata.exif = Exif(exif);
                return metadata;
            }
            Ok(Err(e)) => e,
            Err(_) => crate::error::ToolError::TimedOut(self.enrich_timeout),
        };

        let err = GalleryError::EnrichmentFailed {
            path: rel.to_string(),
            source: failure,
        };
        warn!(path = rel, error = %err, "metadata enrichment failed, creating record without it");
        metadata
    }
}
