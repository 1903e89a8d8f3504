//! Error types module
//!
//! `IngestError` is the taxonomy every pipeline failure is reduced to before it is attached
//! to an item. Failures inside the pipeline are data: the orchestrator records them on the
//! offending item and keeps going, so only lookup failures, `ItemUploading` and
//! `Configuration` ever reach a caller as an `Err`.

use crate::models::ItemId;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected outcomes like rejected files
    Debug,
    /// Warning level - for item-local failures
    Warn,
    /// Error level - for batch-wide or unexpected failures
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error("Unsupported media type: {content_type}")]
    UnsupportedMediaType { content_type: String },

    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Registration failed: {0}")]
    RegistrationFailed(String),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("No item at position {0}")]
    PositionOutOfRange(usize),

    #[error("Item {0} is uploading and cannot be removed")]
    ItemUploading(ItemId),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IngestError {
    /// Machine-readable error code (e.g., "UPLOAD_FAILED")
    pub fn error_code(&self) -> &'static str {
        match self {
            IngestError::UnsupportedMediaType { .. } => "UNSUPPORTED_MEDIA_TYPE",
            IngestError::CompressionFailed(_) => "COMPRESSION_FAILED",
            IngestError::AuthorizationFailed(_) => "AUTHORIZATION_FAILED",
            IngestError::UploadFailed(_) => "UPLOAD_FAILED",
            IngestError::RegistrationFailed(_) => "REGISTRATION_FAILED",
            IngestError::ItemNotFound(_) | IngestError::PositionOutOfRange(_) => "ITEM_NOT_FOUND",
            IngestError::ItemUploading(_) => "ITEM_UPLOADING",
            IngestError::Configuration(_) => "CONFIGURATION_ERROR",
            IngestError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Log level for this error
    pub fn log_level(&self) -> LogLevel {
        match self {
            IngestError::UnsupportedMediaType { .. }
            | IngestError::ItemNotFound(_)
            | IngestError::PositionOutOfRange(_)
            | IngestError::ItemUploading(_) => LogLevel::Debug,
            IngestError::CompressionFailed(_)
            | IngestError::AuthorizationFailed(_)
            | IngestError::UploadFailed(_) => LogLevel::Warn,
            IngestError::RegistrationFailed(_)
            | IngestError::Configuration(_)
            | IngestError::Internal(_) => LogLevel::Error,
        }
    }
}

impl From<anyhow::Error> for IngestError {
    fn from(err: anyhow::Error) -> Self {
        IngestError::Internal(format!("{:#}", err))
    }
}

impl From<envy::Error> for IngestError {
    fn from(err: envy::Error) -> Self {
        IngestError::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            IngestError::UnsupportedMediaType {
                content_type: "image/gif".to_string()
            }
            .error_code(),
            "UNSUPPORTED_MEDIA_TYPE"
        );
        assert_eq!(
            IngestError::UploadFailed("503".to_string()).error_code(),
            "UPLOAD_FAILED"
        );
        assert_eq!(
            IngestError::ItemUploading(ItemId::new()).error_code(),
            "ITEM_UPLOADING"
        );
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(
            IngestError::CompressionFailed("corrupt".to_string()).log_level(),
            LogLevel::Warn
        );
        assert_eq!(
            IngestError::RegistrationFailed("timeout".to_string()).log_level(),
            LogLevel::Error
        );
        assert_eq!(
            IngestError::ItemNotFound(ItemId::new()).log_level(),
            LogLevel::Debug
        );
    }

    #[test]
    fn test_display_includes_detail() {
        let err = IngestError::UploadFailed("status 500".to_string());
        assert_eq!(err.to_string(), "Upload failed: status 500");
    }
}
