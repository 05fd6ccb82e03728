//! Error types for the gallery store.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by gallery operations.
#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid target {path}: {reason}")]
    InvalidTarget { path: String, reason: String },

    #[error("Corrupt metadata for {path}: {source}")]
    CorruptMetadata {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to persist {path}: {source}")]
    PersistenceFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Logged, never returned: previews degrade to the source path.
    #[error("Preview generation failed for {path}: {source}")]
    PreviewGenerationFailed {
        path: String,
        #[source]
        source: ToolError,
    },

    /// Logged, never returned: the record is created without enrichment.
    #[error("Metadata enrichment failed for {path}: {source}")]
    EnrichmentFailed {
        path: String,
        #[source]
        source: ToolError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl GalleryError {
    pub(crate) fn invalid_target(path: &str, reason: impl Into<String>) -> Self {
        GalleryError::InvalidTarget {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Map a stat/read failure, turning `NotFound` into the dedicated variant.
    pub(crate) fn from_io(path: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            GalleryError::NotFound(path.to_string())
        } else {
            GalleryError::Io {
                path: path.to_string(),
                source,
            }
        }
    }
}

/// Failure of an external tool invocation (transcoder, enricher).
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("invalid output: {0}")]
    InvalidOutput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GalleryError>;
