//! Metadata enrichment through an external EXIF reader.

use crate::error::ToolError;
use crate::process::run_tool;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::Path;

/// Raw key/value record produced by an enricher, keys as the tool emits them.
pub type RawRecord = Map<String, Value>;

/// Source of derived metadata for a media file
#[async_trait]
pub trait MetadataEnricher: Send + Sync {
    async fn enrich(&self, source: &Path) -> Result<RawRecord, ToolError>;
}

/// `exiftool -j <file>` backed enricher
pub struct ExiftoolEnricher {
    program: String,
}

impl ExiftoolEnricher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ExiftoolEnricher {
    fn default() -> Self {
        Self::new("exiftool")
    }
}

#[async_trait]
impl MetadataEnricher for ExiftoolEnricher {
    async fn enrich(&self, source: &Path) -> Result<RawRecord, ToolError> {
        let stdout = run_tool(&self.program, [source.as_os_str(), OsStr::new("-j")]).await?;
        parse_exiftool_output(&stdout)
    }
}

/// exiftool prints a JSON array with one object per input file.
pub fn parse_exiftool_output(stdout: &[u8]) -> Result<RawRecord, ToolError> {
    let records: Vec<RawRecord> = serde_json::from_slice(stdout)
        .map_err(|e| ToolError::InvalidOutput(format!("exiftool JSON: {}", e)))?;
    records
        .into_iter()
        .next()
        .ok_or_else(|| ToolError::InvalidOutput("exiftool returned no records".to_string()))
}

/// Normalize every key of an enrichment record to snake_case.
pub fn normalize_keys(record: RawRecord) -> BTreeMap<String, Value> {
    record
        .into_iter()
        .map(|(k, v)| (to_snake_case(&k), v))
        .collect()
}

/// `ImageWidth` -> `image_width`, `MIMEType` -> `mime_type`, `XResolution` -> `x_resolution`.
pub fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' || c == ':' {
            if !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if c.is_uppercase() {
            let prev = if i > 0 { chars.get(i - 1).copied() } else { None };
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.map(|n| n.is_lowercase()).unwrap_or(false),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Derive a `WIDTHxHEIGHT` resolution from a normalized record.
pub fn derive_resolution(exif: &BTreeMap<String, Value>) -> Option<String> {
    if let Some(Value::String(size)) = exif.get("image_size") {
        let size = size.trim();
        if let Some((w, h)) = size.split_once(['x', ' ']) {
            if let (Ok(w), Ok(h)) = (w.trim().parse::<u64>(), h.trim().parse::<u64>()) {
                return Some(format!("{}x{}", w, h));
            }
        }
    }
    let width = exif.get("image_width").and_then(Value::as_u64)?;
    let height = exif.get("image_height").and_then(Value::as_u64)?;
    Some(format!("{}x{}", width, height))
}
