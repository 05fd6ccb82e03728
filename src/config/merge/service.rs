//! MergeService: orchestrates sources, applies precedence, deserializes to GalleryConfig.

use crate::config::sources::{environment, file};
use crate::config::GalleryConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};
use std::path::Path;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: defaults (lowest) -> working dir file -> environment (highest).
    pub fn load(working_dir: &Path) -> Result<GalleryConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = file::add_working_dir_file(builder, working_dir)?;
        let builder = environment::add_to_builder(builder)?;

        builder.build()?.try_deserialize()
    }

    /// Load config from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<GalleryConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = file::add_required_file(builder, path)?;
        let builder = environment::add_to_builder(builder)?;

        builder.build()?.try_deserialize()
    }
}

fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("data_dir", "data")?
        .set_default("listing_concurrency", 8)
}
