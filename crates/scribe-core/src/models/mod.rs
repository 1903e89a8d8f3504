//! Data models for the ingestion pipeline
//!
//! Organized by stage: the asset being ingested, the compression profile applied to it,
//! and the remote catalog types produced once it is uploaded.

mod asset;
mod catalog;
mod profile;

pub use asset::*;
pub use catalog::*;
pub use profile::*;
