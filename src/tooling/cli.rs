//! CLI command definitions and execution.

use crate::config::{ConfigLoader, GalleryConfig};
use crate::error::{GalleryError, Result};
use crate::gallery::{GalleryAssembler, Resolved};
use crate::store::Metadata;
use crate::types::FileEntry;
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use std::path::PathBuf;

/// Browse a media directory with hide and bookmark state
#[derive(Parser, Debug)]
#[command(name = "gallery", version, about)]
pub struct Cli {
    /// Configuration file (defaults to ./gallery.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the data root
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List a directory, newest first
    List {
        /// Directory relative to the data root
        #[arg(default_value = "")]
        dir: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show one file, or list a directory
    Show {
        path: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Hide a file from listings
    Hide { path: String },
    /// Toggle a file's bookmark
    Bookmark { path: String },
    /// List bookmarked files
    Bookmarks {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

impl Cli {
    /// Resolve configuration for this invocation.
    pub fn load_config(&self) -> Result<GalleryConfig> {
        let loaded = match &self.config {
            Some(path) => ConfigLoader::load_from_file(path),
            None => {
                let cwd = std::env::current_dir().map_err(|e| {
                    GalleryError::ConfigError(format!("Failed to read working directory: {}", e))
                })?;
                ConfigLoader::load(&cwd)
            }
        };
        let mut config = loaded.map_err(|e| GalleryError::ConfigError(e.to_string()))?;
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        Ok(config)
    }
}

/// Gallery bound to one data root for the lifetime of a command
pub struct CliContext {
    gallery: GalleryAssembler,
}

impl CliContext {
    pub fn new(config: &GalleryConfig) -> Result<Self> {
        Ok(Self {
            gallery: GalleryAssembler::from_config(config)?,
        })
    }

    pub fn with_gallery(gallery: GalleryAssembler) -> Self {
        Self { gallery }
    }

    /// Run a command and render its output.
    pub async fn execute(&self, command: &Commands) -> Result<String> {
        match command {
            Commands::List { dir, format } => {
                let entries = self.gallery.list_directory(dir).await?;
                render_entries(&entries, *format)
            }
            Commands::Show { path, format } => match self.gallery.resolve(path).await? {
                Resolved::File(entry) => render_entries(std::slice::from_ref(&entry), *format),
                Resolved::Directory(entries) => render_entries(&entries, *format),
            },
            Commands::Hide { path } => {
                self.gallery.hide(path).await?;
                Ok(format!("Hidden: {}", path))
            }
            Commands::Bookmark { path } => {
                let metadata = self.gallery.toggle_bookmark(path).await?;
                Ok(if metadata.bookmarked {
                    format!("Bookmarked: {}", path)
                } else {
                    format!("Bookmark removed: {}", path)
                })
            }
            Commands::Bookmarks { format } => {
                let entries = self.gallery.bookmarked_entries().await?;
                render_entries(&entries, *format)
            }
        }
    }
}

fn render_entries(entries: &[FileEntry], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(entries)
            .map_err(|e| GalleryError::ConfigError(format!("Failed to serialize output: {}", e))),
        OutputFormat::Text => Ok(render_table(entries)),
    }
}

fn render_table(entries: &[FileEntry]) -> String {
    if entries.is_empty() {
        return "No entries.".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Kind", "Path", "Modified", "Preview", "Flags", "Resolution"]);

    for entry in entries {
        let kind = if entry.is_directory() { "dir" } else { "file" };
        let preview = if entry.has_distinct_preview() {
            entry.preview_path.as_str()
        } else {
            "-"
        };
        table.add_row(vec![
            kind.to_string(),
            entry.path.clone(),
            entry.modified_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            preview.to_string(),
            flags(&entry.metadata),
            entry.metadata.resolution.clone().unwrap_or_default(),
        ]);
    }
    table.to_string()
}

fn flags(metadata: &Metadata) -> String {
    let mut flags = String::new();
    if metadata.bookmarked {
        flags.push('B');
    }
    if metadata.hidden {
        flags.push('H');
    }
    flags
}
