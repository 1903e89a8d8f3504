//! Seams the orchestrator depends on.
//!
//! The orchestrator only sees these traits, so tests and alternative transports can stand
//! in for the HTTP implementation on [`ApiClient`](crate::ApiClient).

use async_trait::async_trait;
use scribe_core::{AuthorizationGrant, CatalogEntry, MediaKind, NormalizedPayload, ProgressSink};

use crate::error::ClientError;

/// Obtains single-use write locations from the control plane.
#[async_trait]
pub trait AuthorizationClient: Send + Sync {
    /// Derive a fresh object key from `filename` and request a write grant for it.
    ///
    /// Never retries; a failure is reported once and left to the caller.
    async fn authorize(
        &self,
        filename: &str,
        kind: MediaKind,
    ) -> Result<AuthorizationGrant, ClientError>;
}

/// Transfers payload bytes to a granted write location.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Single direct transfer. Reports at least transfer start and confirmation to
    /// `progress`.
    async fn upload(
        &self,
        grant: &AuthorizationGrant,
        payload: &NormalizedPayload,
        progress: &dyn ProgressSink,
    ) -> Result<(), ClientError>;
}

/// Makes uploaded objects visible in the catalog.
#[async_trait]
pub trait CatalogRegistrar: Send + Sync {
    /// Register every entry with one call.
    async fn register(&self, entries: &[CatalogEntry]) -> Result<(), ClientError>;
}
