//! External transcoder used to render preview artifacts.

use crate::error::ToolError;
use crate::process::run_tool;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;

/// Renders a scaled preview of `source` into `target`
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, source: &Path, target: &Path) -> Result<(), ToolError>;
}

/// ffmpeg backed transcoder producing a single scaled frame
pub struct FfmpegTranscoder {
    program: String,
    scale_height: u32,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<String>, scale_height: u32) -> Self {
        Self {
            program: program.into(),
            scale_height,
        }
    }

    /// Argument vector for one preview render.
    pub fn args(&self, source: &Path, target: &Path) -> Vec<OsString> {
        vec![
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            source.as_os_str().to_owned(),
            "-vf".into(),
            format!("scale=-2:{}", self.scale_height).into(),
            "-frames:v".into(),
            "1".into(),
            "-f".into(),
            "image2".into(),
            "-y".into(),
            target.as_os_str().to_owned(),
        ]
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg", 360)
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, source: &Path, target: &Path) -> Result<(), ToolError> {
        run_tool(&self.program, self.args(source, target)).await?;
        Ok(())
    }
}
