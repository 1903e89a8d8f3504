//! Batch ingestion for blog assets.
//!
//! An [`IngestOrchestrator`] owns one batch: it validates submitted files, compresses them
//! in the background, uploads them on commit and registers the uploads in the catalog.
//! Subscribers follow every change through [`IngestEvent`]s.

pub mod batch;
pub mod events;
pub mod orchestrator;
pub mod progress;
pub mod store;

pub use batch::Batch;
pub use events::{EventBus, IngestEvent};
pub use orchestrator::{
    Collaborators, CommitReport, IngestOrchestrator, OrchestratorConfig, RegistrationOutcome,
    RejectedFile, SubmitOutcome,
};
pub use progress::{CompressionProgress, UploadProgress};
pub use store::{AssetItem, AssetView, BatchStore};
