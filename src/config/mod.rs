//! Configuration
//!
//! Layered settings for the gallery store: built-in defaults, an optional
//! `gallery.toml`, then `GALLERY_*` environment variables.

pub mod facade;
pub mod merge;
pub mod sources;

pub use facade::ConfigLoader;

use crate::error::{GalleryError, Result};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_listing_concurrency() -> usize {
    8
}

/// Top-level gallery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryConfig {
    /// Root directory of media files and their sidecars
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Entries resolved in parallel while assembling a listing
    #[serde(default = "default_listing_concurrency")]
    pub listing_concurrency: usize,

    #[serde(default)]
    pub preview: PreviewConfig,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            listing_concurrency: default_listing_concurrency(),
            preview: PreviewConfig::default(),
            enrichment: EnrichmentConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl GalleryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.listing_concurrency == 0 {
            return Err(GalleryError::ConfigError(
                "listing_concurrency must be at least 1".to_string(),
            ));
        }
        self.preview.validate()?;
        self.enrichment.validate()
    }
}

fn default_preview_program() -> String {
    "ffmpeg".to_string()
}

fn default_scale_height() -> u32 {
    360
}

fn default_preview_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent() -> usize {
    4
}

/// Preview transcoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_preview_program")]
    pub program: String,

    /// Output height in pixels; width keeps the aspect ratio
    #[serde(default = "default_scale_height")]
    pub scale_height: u32,

    #[serde(default = "default_preview_timeout_secs")]
    pub timeout_secs: u64,

    /// Size of the transcoder worker pool
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            program: default_preview_program(),
            scale_height: default_scale_height(),
            timeout_secs: default_preview_timeout_secs(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

impl PreviewConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.program.trim().is_empty() {
            return Err(GalleryError::ConfigError(
                "preview.program must not be empty".to_string(),
            ));
        }
        if self.scale_height == 0 || self.timeout_secs == 0 || self.max_concurrent == 0 {
            return Err(GalleryError::ConfigError(
                "preview.scale_height, preview.timeout_secs and preview.max_concurrent must be positive"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_enrichment_program() -> String {
    "exiftool".to_string()
}

fn default_enrichment_timeout_secs() -> u64 {
    10
}

/// EXIF enrichment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_enrichment_program")]
    pub program: String,

    #[serde(default = "default_enrichment_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            program: default_enrichment_program(),
            timeout_secs: default_enrichment_timeout_secs(),
        }
    }
}

impl EnrichmentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.program.trim().is_empty() || self.timeout_secs == 0 {
            return Err(GalleryError::ConfigError(
                "enrichment.program must be set and enrichment.timeout_secs positive".to_string(),
            ));
        }
        Ok(())
    }
}
