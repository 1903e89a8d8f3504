//! Compressor seam used by the orchestrator.

use async_trait::async_trait;
use bytes::Bytes;
use scribe_core::{CompressionProfile, IngestError, MediaKind, NormalizedPayload, ProgressSink};
use std::sync::Arc;

use crate::document::DocumentNormalizer;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompressionError {
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("invalid text document: {0}")]
    InvalidText(String),

    #[error("{0} payloads are not supported by this build")]
    Unsupported(MediaKind),

    #[error("compression worker failed: {0}")]
    Worker(String),
}

impl From<CompressionError> for IngestError {
    fn from(err: CompressionError) -> Self {
        IngestError::CompressionFailed(err.to_string())
    }
}

/// Turns an accepted raw payload into the payload that gets uploaded.
///
/// Implementations run CPU-bound work off the async executor and report progress through
/// `progress`; the outcome is returned, never reported through the sink.
#[async_trait]
pub trait Compressor: Send + Sync {
    async fn compress(
        &self,
        raw: Bytes,
        kind: MediaKind,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<NormalizedPayload, CompressionError>;
}

/// Compressor dispatching on payload kind: images are re-encoded with the profile,
/// article bodies are normalized text.
#[derive(Debug, Clone)]
pub struct PayloadCompressor {
    profile: CompressionProfile,
}

impl PayloadCompressor {
    pub fn new(profile: CompressionProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &CompressionProfile {
        &self.profile
    }

    fn compress_blocking(
        profile: &CompressionProfile,
        raw: &[u8],
        kind: MediaKind,
        progress: &dyn ProgressSink,
    ) -> Result<NormalizedPayload, CompressionError> {
        match kind {
            MediaKind::Document => DocumentNormalizer::normalize(raw, progress),
            #[cfg(feature = "image")]
            MediaKind::Image => crate::compression::ImageCompressor::compress(raw, profile, progress),
            #[cfg(not(feature = "image"))]
            MediaKind::Image => {
                let _ = profile;
                Err(CompressionError::Unsupported(kind))
            }
        }
    }
}

impl Default for PayloadCompressor {
    fn default() -> Self {
        Self::new(CompressionProfile::default())
    }
}

#[async_trait]
impl Compressor for PayloadCompressor {
    async fn compress(
        &self,
        raw: Bytes,
        kind: MediaKind,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<NormalizedPayload, CompressionError> {
        let profile = self.profile;
        // Decoding and encoding are CPU-bound; run off the async pool to avoid blocking other tasks.
        tokio::task::spawn_blocking(move || {
            Self::compress_blocking(&profile, &raw, kind, progress.as_ref())
        })
        .await
        .map_err(|e| CompressionError::Worker(e.to_string()))?
    }
}
