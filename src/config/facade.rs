//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::GalleryConfig;
use config::ConfigError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from `gallery.toml` in `working_dir` (if any) and environment.
    pub fn load(working_dir: &Path) -> Result<GalleryConfig, ConfigError> {
        MergeService::load(working_dir)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<GalleryConfig, ConfigError> {
        MergeService::load_from_file(path)
    }

    /// Create default configuration.
    pub fn default() -> GalleryConfig {
        GalleryConfig::default()
    }
}
