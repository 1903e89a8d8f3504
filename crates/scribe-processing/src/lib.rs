//! Scribe Processing Library
//!
//! Everything that happens to a file before it leaves the machine: media type validation
//! and normalization (image re-encoding, article body cleanup).

#[cfg(feature = "image")]
pub mod compression;
pub mod compressor;
pub mod document;
pub mod validator;

#[cfg(feature = "image")]
pub use compression::ImageCompressor;
pub use compressor::{CompressionError, Compressor, PayloadCompressor};
pub use document::{DocumentNormalizer, DOCUMENT_CONTENT_TYPE};
pub use validator::{
    content_type_for_filename, normalize_content_type, MediaValidator, ValidationError,
    DOCUMENT_CONTENT_TYPES, IMAGE_CONTENT_TYPES,
};
