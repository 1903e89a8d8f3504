use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Output format for normalized images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::WebP),
            _ => Err(anyhow!("Invalid format: {}", s)),
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }

    /// Lossless formats get a single encode pass; the size target cannot be chased.
    pub fn is_lossy(self) -> bool {
        !matches!(self, OutputFormat::Png)
    }
}

/// Target the compressor aims for.
///
/// `max_size_bytes` is a soft target: the compressor lowers quality a few times to get
/// under it and then gives up, keeping the smallest output it produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionProfile {
    pub max_size_bytes: usize,
    pub output_format: OutputFormat,
    /// Initial encode quality in (0, 1]
    pub quality: f32,
    pub preserve_resolution: bool,
    pub preserve_metadata: bool,
}

impl Default for CompressionProfile {
    fn default() -> Self {
        Self {
            max_size_bytes: 1024 * 1024,
            output_format: OutputFormat::WebP,
            quality: 0.95,
            preserve_resolution: true,
            preserve_metadata: true,
        }
    }
}
