//! Pipeline orchestrator: compression phase, commit phase and catalog registration.
//!
//! Compression starts automatically on submission, one start at a time with a fixed delay
//! between starts; started compressions then run concurrently on blocking workers. Commit
//! is explicit: compressed items are authorized and uploaded strictly one after the other
//! in batch order, then every item uploaded by that commit is registered with one call.
//!
//! Item failures are recorded on the item and never abort a phase.

use scribe_api_client::{ApiClient, AuthorizationClient, CatalogRegistrar, Uploader};
use scribe_core::{CatalogEntry, IngestConfig, IngestError, ItemId, LogLevel, RawFile};
use scribe_processing::{Compressor, MediaValidator, PayloadCompressor};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::time::Instant;
use tokio_util::task::task_tracker::TaskTrackerToken;
use tokio_util::task::TaskTracker;

use crate::batch::Batch;
use crate::events::{EventBus, IngestEvent};
use crate::progress::{CompressionProgress, UploadProgress};
use crate::store::AssetView;

/// Remote and CPU-bound stages the orchestrator drives.
#[derive(Clone)]
pub struct Collaborators {
    pub compressor: Arc<dyn Compressor>,
    pub authorizer: Arc<dyn AuthorizationClient>,
    pub uploader: Arc<dyn Uploader>,
    pub registrar: Arc<dyn CatalogRegistrar>,
}

impl Collaborators {
    /// HTTP client for every remote stage and the kind-dispatching compressor.
    pub fn http(client: ApiClient, compressor: PayloadCompressor) -> Self {
        let client = Arc::new(client);
        Self {
            compressor: Arc::new(compressor),
            authorizer: client.clone(),
            uploader: client.clone(),
            registrar: client,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Delay between two compression starts
    pub compression_start_delay: Duration,
    pub event_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            compression_start_delay: Duration::from_millis(150),
            event_capacity: 256,
        }
    }
}

impl From<&IngestConfig> for OrchestratorConfig {
    fn from(config: &IngestConfig) -> Self {
        Self {
            compression_start_delay: config.compression_start_delay(),
            event_capacity: config.event_capacity,
        }
    }
}

/// Result of validating a submission.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubmitOutcome {
    pub accepted: Vec<AssetView>,
    pub rejected: Vec<RejectedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedFile {
    pub name: String,
    pub error: String,
    pub error_code: &'static str,
}

/// Outcome of the single catalog call closing a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationOutcome {
    /// Nothing was uploaded; the catalog was not called.
    Skipped,
    Registered { entries: Vec<CatalogEntry> },
    Failed { message: String },
}

/// Summary of one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    /// Items that entered `Authorizing`
    pub attempted: usize,
    pub uploaded: usize,
    pub failed: usize,
    pub registration: RegistrationOutcome,
}

/// An accepted item waiting for its compression to start.
///
/// The token keeps `wait_for_compression` pending until the start has happened.
struct QueuedStart {
    id: ItemId,
    _pending: TaskTrackerToken,
}

struct Inner {
    batch: Batch,
    validator: MediaValidator,
    collaborators: Collaborators,
    /// Locked for a whole submission so queue order matches batch order.
    start_queue: parking_lot::Mutex<mpsc::UnboundedSender<QueuedStart>>,
    compressions: TaskTracker,
    commit_lock: Mutex<()>,
}

/// Single task starting compressions in queue order, one start per delay.
///
/// Ends once every orchestrator handle is dropped and the queue is drained.
struct Starter {
    queue: mpsc::UnboundedReceiver<QueuedStart>,
    batch: Batch,
    compressor: Arc<dyn Compressor>,
    compressions: TaskTracker,
    delay: Duration,
}

/// Drives a batch through validation, compression, upload and registration.
///
/// Cheap to clone; clones share the batch. Must be used from within a Tokio runtime.
#[derive(Clone)]
pub struct IngestOrchestrator {
    inner: Arc<Inner>,
}

impl IngestOrchestrator {
    /// Spawns the compression starter, so this must be called within a Tokio runtime.
    pub fn new(
        validator: MediaValidator,
        collaborators: Collaborators,
        config: OrchestratorConfig,
    ) -> Self {
        let compressions = TaskTracker::new();
        // Kept closed: `wait()` then resolves whenever nothing is in flight.
        compressions.close();

        let batch = Batch::new(EventBus::new(config.event_capacity));
        let (start_tx, start_rx) = mpsc::unbounded_channel();
        let starter = Starter {
            queue: start_rx,
            batch: batch.clone(),
            compressor: collaborators.compressor.clone(),
            compressions: compressions.clone(),
            delay: config.compression_start_delay,
        };
        tokio::spawn(starter.run());

        Self {
            inner: Arc::new(Inner {
                batch,
                validator,
                collaborators,
                start_queue: parking_lot::Mutex::new(start_tx),
                compressions,
                commit_lock: Mutex::new(()),
            }),
        }
    }

    /// Orchestrator wired to the HTTP endpoints described by `config`.
    pub fn from_config(config: &IngestConfig, validator: MediaValidator) -> Result<Self, IngestError> {
        let client = ApiClient::from_config(config)
            .map_err(|e| IngestError::Configuration(e.to_string()))?;
        let compressor = PayloadCompressor::new(config.compression_profile()?);

        Ok(Self::new(
            validator,
            Collaborators::http(client, compressor),
            OrchestratorConfig::from(config),
        ))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IngestEvent> {
        self.inner.batch.subscribe()
    }

    pub fn snapshot(&self) -> Vec<AssetView> {
        self.inner.batch.snapshot()
    }

    pub fn item(&self, id: ItemId) -> Option<AssetView> {
        self.inner.batch.view(id)
    }

    /// Validate `files`, append the accepted ones and schedule their compression.
    ///
    /// Rejected files never enter the batch.
    pub fn submit(&self, files: Vec<RawFile>) -> SubmitOutcome {
        let mut outcome = SubmitOutcome::default();
        let start_queue = self.inner.start_queue.lock();

        for file in files {
            match self.inner.validator.validate(&file) {
                Ok(kind) => {
                    let view = self.inner.batch.insert(file, kind);
                    tracing::debug!(item_id = %view.id, name = %view.display_name, kind = %kind, "File accepted");
                    let queued = QueuedStart {
                        id: view.id,
                        _pending: self.inner.compressions.token(),
                    };
                    if start_queue.send(queued).is_err() {
                        tracing::error!(item_id = %view.id, "Compression starter is gone, item stays pending");
                    }
                    outcome.accepted.push(view);
                }
                Err(err) => {
                    let err = IngestError::from(err);
                    tracing::debug!(name = %file.name, "File rejected");
                    log_failure(None, &err);
                    outcome.rejected.push(RejectedFile {
                        name: file.name,
                        error: err.to_string(),
                        error_code: err.error_code(),
                    });
                }
            }
        }

        outcome
    }

    /// Resolves once every scheduled and running compression has finished.
    pub async fn wait_for_compression(&self) {
        self.inner.compressions.wait().await;
    }

    /// Authorize and upload every compressed item, one at a time, then register the
    /// uploaded ones with a single catalog call.
    ///
    /// Commits are serialized: a second caller waits for the first to finish.
    #[tracing::instrument(skip(self))]
    pub async fn commit(&self) -> CommitReport {
        let _commit = self.inner.commit_lock.lock().await;
        let batch = &self.inner.batch;
        let candidates = batch.commit_candidates();

        let mut attempted = 0;
        let mut failed = 0;
        let mut uploaded: Vec<ItemId> = Vec::new();

        for id in candidates {
            let Some(view) = batch.begin_authorization(id) else {
                continue;
            };
            attempted += 1;

            match self.upload_item(id, &view).await {
                Ok(true) => uploaded.push(id),
                Ok(false) => {}
                Err(err) => {
                    failed += 1;
                    log_failure(Some(id), &err);
                }
            }
        }

        let registration = self.register(&uploaded).await;

        tracing::info!(
            attempted,
            uploaded = uploaded.len(),
            failed,
            "Commit finished"
        );

        CommitReport {
            attempted,
            uploaded: uploaded.len(),
            failed,
            registration,
        }
    }

    /// `Ok(false)` when the item disappeared while its grant was requested.
    async fn upload_item(&self, id: ItemId, view: &AssetView) -> Result<bool, IngestError> {
        let batch = &self.inner.batch;
        let collaborators = &self.inner.collaborators;

        let grant = match collaborators
            .authorizer
            .authorize(&view.display_name, view.media_kind)
            .await
        {
            Ok(grant) => grant,
            Err(e) => {
                let err = IngestError::AuthorizationFailed(e.to_string());
                batch.fail_authorization(id, &err);
                return Err(err);
            }
        };

        let Some(payload) = batch.begin_upload(id, &grant.object_key) else {
            tracing::debug!(item_id = %id, object_key = %grant.object_key, "Item removed during authorization, grant discarded");
            return Ok(false);
        };

        let progress = UploadProgress::new(batch.clone(), id);
        match collaborators.uploader.upload(&grant, &payload, &progress).await {
            Ok(()) => {
                batch.finish_upload(id, Ok(()));
                tracing::debug!(item_id = %id, object_key = %grant.object_key, "Item uploaded");
                Ok(true)
            }
            Err(e) => {
                let err = IngestError::UploadFailed(e.to_string());
                batch.finish_upload(id, Err(err.clone()));
                Err(err)
            }
        }
    }

    async fn register(&self, uploaded: &[ItemId]) -> RegistrationOutcome {
        let batch = &self.inner.batch;
        let entries = batch.catalog_entries(uploaded);
        if entries.is_empty() {
            return RegistrationOutcome::Skipped;
        }

        match self.inner.collaborators.registrar.register(&entries).await {
            Ok(()) => {
                tracing::info!(count = entries.len(), "Catalog entries registered");
                batch.events().publish(IngestEvent::CatalogChanged {
                    entries: entries.clone(),
                });
                RegistrationOutcome::Registered { entries }
            }
            Err(e) => {
                let err = IngestError::RegistrationFailed(e.to_string());
                log_failure(None, &err);
                tracing::info!(count = entries.len(), "Uploaded objects remain unregistered");
                batch.mark_unregistered(uploaded, &err);
                batch.events().publish(IngestEvent::RegistrationFailed {
                    items: uploaded.to_vec(),
                    message: err.to_string(),
                });
                RegistrationOutcome::Failed {
                    message: err.to_string(),
                }
            }
        }
    }

    /// Remove an item unless it is uploading. In-flight compression results for it are
    /// discarded.
    pub fn remove(&self, id: ItemId) -> Result<AssetView, IngestError> {
        self.inner.batch.remove(id)
    }

    pub fn remove_at(&self, position: usize) -> Result<AssetView, IngestError> {
        self.inner.batch.remove_at(position)
    }

    /// Discard the whole batch. Rejected while an item is uploading.
    pub fn clear(&self) -> Result<usize, IngestError> {
        self.inner.batch.clear()
    }
}

/// Log a pipeline failure at the level its kind calls for.
fn log_failure(item_id: Option<ItemId>, error: &IngestError) {
    let item_id = item_id.map(tracing::field::display);
    let error_code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(item_id, error_code, error = %error, "Pipeline step failed");
        }
        LogLevel::Warn => {
            tracing::warn!(item_id, error_code, error = %error, "Pipeline step failed");
        }
        LogLevel::Error => {
            tracing::error!(item_id, error_code, error = %error, "Pipeline step failed");
        }
    }
}

impl Starter {
    async fn run(mut self) {
        let mut last_start: Option<Instant> = None;

        while let Some(QueuedStart { id, _pending }) = self.queue.recv().await {
            if let Some(previous) = last_start {
                tokio::time::sleep_until(previous + self.delay).await;
            }

            let Some((raw, kind)) = self.batch.begin_compression(id) else {
                tracing::debug!(item_id = %id, "Item removed before compression started");
                continue;
            };
            last_start = Some(Instant::now());

            let batch = self.batch.clone();
            let compressor = self.compressor.clone();
            self.compressions.spawn(async move {
                let progress = Arc::new(CompressionProgress::new(batch.clone(), id));
                let outcome = compressor
                    .compress(raw, kind, progress)
                    .await
                    .map_err(IngestError::from);

                if let Err(err) = &outcome {
                    log_failure(Some(id), err);
                }
                if batch.finish_compression(id, outcome).is_none() {
                    tracing::debug!(item_id = %id, "Compression result discarded");
                }
            });
        }
    }
}
