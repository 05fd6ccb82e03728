//! File sources: optional `gallery.toml` in the working directory, or an explicit file.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "gallery.toml";

/// Add `<working_dir>/gallery.toml` if it exists.
pub fn add_working_dir_file(
    builder: ConfigBuilder<DefaultState>,
    working_dir: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = working_dir.join(CONFIG_FILE_NAME);
    Ok(builder.add_source(File::from(path).required(false)))
}

/// Add an explicitly requested file; it must exist.
pub fn add_required_file(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    Ok(builder.add_source(File::from(path).required(true)))
}
