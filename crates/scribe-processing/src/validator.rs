use scribe_core::{IngestError, MediaKind, RawFile};
use std::path::Path;

/// Media types accepted for gallery and inline editor images.
pub const IMAGE_CONTENT_TYPES: &[&str] = &["image/webp", "image/jpeg", "image/png"];

/// Media types accepted for article bodies.
pub const DOCUMENT_CONTENT_TYPES: &[&str] = &["text/markdown", "text/x-markdown"];

/// Validation errors for submitted files
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unsupported media type: {content_type} (allowed: {allowed:?})")]
    UnsupportedMediaType {
        content_type: String,
        allowed: Vec<String>,
    },
}

impl From<ValidationError> for IngestError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::UnsupportedMediaType { content_type, .. } => {
                IngestError::UnsupportedMediaType { content_type }
            }
        }
    }
}

/// Media file validator
///
/// Accepts a file iff its declared media type is in the allow-list. Validation has no side
/// effects; a rejected file never reaches the batch.
#[derive(Debug, Clone)]
pub struct MediaValidator {
    allowed_content_types: Vec<String>,
}

impl MediaValidator {
    pub fn new(allowed_content_types: Vec<String>) -> Self {
        Self {
            allowed_content_types: allowed_content_types
                .iter()
                .map(|ct| normalize_content_type(ct))
                .collect(),
        }
    }

    /// Validator for image widgets (gallery, inline editor images).
    pub fn images() -> Self {
        Self::from_static(IMAGE_CONTENT_TYPES)
    }

    /// Validator for article body uploads.
    pub fn documents() -> Self {
        Self::from_static(DOCUMENT_CONTENT_TYPES)
    }

    /// Validator accepting both images and article bodies.
    pub fn all() -> Self {
        Self::from_static(
            &IMAGE_CONTENT_TYPES
                .iter()
                .chain(DOCUMENT_CONTENT_TYPES)
                .copied()
                .collect::<Vec<_>>(),
        )
    }

    fn from_static(types: &[&str]) -> Self {
        Self::new(types.iter().map(|s| s.to_string()).collect())
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.allowed_content_types
    }

    /// Validate a submitted file and return the kind of payload it carries.
    pub fn validate(&self, file: &RawFile) -> Result<MediaKind, ValidationError> {
        self.validate_content_type(&file.content_type)
    }

    /// Validate a declared content type
    pub fn validate_content_type(&self, content_type: &str) -> Result<MediaKind, ValidationError> {
        let normalized = normalize_content_type(content_type);

        let kind = self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
            .then(|| kind_for_content_type(&normalized))
            .flatten();

        kind.ok_or_else(|| ValidationError::UnsupportedMediaType {
            content_type: content_type.to_string(),
            allowed: self.allowed_content_types.clone(),
        })
    }
}

/// Lowercase a MIME type and drop its parameters (`text/markdown; charset=utf-8` becomes
/// `text/markdown`).
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

/// Payload kind implied by a normalized media type.
pub fn kind_for_content_type(content_type: &str) -> Option<MediaKind> {
    if content_type.starts_with("image/") {
        Some(MediaKind::Image)
    } else if content_type.starts_with("text/") {
        Some(MediaKind::Document)
    } else {
        None
    }
}

/// Declared media type for a filename, inferred from its extension.
///
/// Used by front ends that only have a path at hand. Unknown extensions yield `None` and
/// are left for the validator to reject.
pub fn content_type_for_filename(filename: &str) -> Option<&'static str> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())?;

    let content_type = match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "md" | "markdown" => "text/markdown",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        _ => {
            tracing::debug!(extension = %extension, "Unknown extension, no media type inferred");
            return None;
        }
    };

    Some(content_type)
}
