//! Configuration module
//!
//! Settings for the remote endpoints, the compression profile and the orchestrator's
//! throttling, read from `SCRIBE_*` environment variables.

use serde::Deserialize;
use std::time::Duration;

use crate::error::IngestError;
use crate::models::{CompressionProfile, OutputFormat};

const ENV_PREFIX: &str = "SCRIBE_";
const MAX_START_DELAY_MS: u64 = 5_000;

fn default_api_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_compression_start_delay_ms() -> u64 {
    150
}

fn default_max_size_bytes() -> usize {
    1024 * 1024
}

fn default_output_format() -> String {
    "webp".to_string()
}

fn default_quality() -> f32 {
    0.95
}

fn default_true() -> bool {
    true
}

fn default_event_capacity() -> usize {
    256
}

/// Ingestion pipeline configuration
#[derive(Clone, Debug, Deserialize)]
pub struct IngestConfig {
    /// Base URL of the control plane and catalog API
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Bearer token sent to the control plane and catalog (never to the object store)
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Timeout applied to every individual network call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Delay between two compression starts
    #[serde(default = "default_compression_start_delay_ms")]
    pub compression_start_delay_ms: u64,
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: usize,
    #[serde(default = "default_output_format")]
    pub output_format: String,
    #[serde(default = "default_quality")]
    pub quality: f32,
    #[serde(default = "default_true")]
    pub preserve_metadata: bool,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_token: None,
            api_version: default_api_version(),
            request_timeout_secs: default_request_timeout_secs(),
            compression_start_delay_ms: default_compression_start_delay_ms(),
            max_size_bytes: default_max_size_bytes(),
            output_format: default_output_format(),
            quality: default_quality(),
            preserve_metadata: true,
            event_capacity: default_event_capacity(),
        }
    }
}

impl IngestConfig {
    /// Load from the process environment, after reading an optional `.env` file.
    pub fn from_env() -> Result<Self, IngestError> {
        dotenvy::dotenv().ok();
        let config: IngestConfig = envy::prefixed(ENV_PREFIX).from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from explicit key/value pairs (same names as the environment variables).
    pub fn from_pairs<I>(pairs: I) -> Result<Self, IngestError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: IngestConfig = envy::prefixed(ENV_PREFIX).from_iter(pairs)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), IngestError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(IngestError::Configuration(
                "SCRIBE_API_URL must be an http(s) URL".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(IngestError::Configuration(
                "SCRIBE_REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        if self.compression_start_delay_ms > MAX_START_DELAY_MS {
            return Err(IngestError::Configuration(format!(
                "SCRIBE_COMPRESSION_START_DELAY_MS must be at most {}",
                MAX_START_DELAY_MS
            )));
        }

        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(IngestError::Configuration(
                "SCRIBE_QUALITY must be in (0, 1]".to_string(),
            ));
        }

        if self.event_capacity == 0 {
            return Err(IngestError::Configuration(
                "SCRIBE_EVENT_CAPACITY must be greater than zero".to_string(),
            ));
        }

        OutputFormat::parse(&self.output_format)
            .map_err(|e| IngestError::Configuration(format!("SCRIBE_OUTPUT_FORMAT: {}", e)))?;

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn compression_start_delay(&self) -> Duration {
        Duration::from_millis(self.compression_start_delay_ms)
    }

    /// API path prefix (e.g. "/api/v1").
    pub fn api_prefix(&self) -> String {
        format!("/api/{}", self.api_version)
    }

    pub fn compression_profile(&self) -> Result<CompressionProfile, IngestError> {
        let output_format = OutputFormat::parse(&self.output_format)
            .map_err(|e| IngestError::Configuration(format!("SCRIBE_OUTPUT_FORMAT: {}", e)))?;

        Ok(CompressionProfile {
            max_size_bytes: self.max_size_bytes,
            output_format,
            quality: self.quality,
            preserve_resolution: true,
            preserve_metadata: self.preserve_metadata,
        })
    }
}
