//! Scribe Core Library
//!
//! This crate provides the domain models, error types, configuration and object key
//! derivation shared by every stage of the asset ingestion pipeline.

pub mod config;
pub mod error;
pub mod models;
pub mod object_key;
pub mod progress;

// Re-export commonly used types
pub use config::IngestConfig;
pub use error::{IngestError, LogLevel};
pub use models::{
    AuthorizationGrant, CatalogEntry, CatalogRecord, CompressionProfile, CompressionState, ItemId,
    MediaKind, NormalizedPayload, OutputFormat, RawFile, UploadState,
};
pub use object_key::derive_object_key;
pub use progress::{NoProgress, ProgressSink};
