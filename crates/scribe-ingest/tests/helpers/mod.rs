//! Test helpers: in-process collaborators and an orchestrator wired to them.
//!
//! Run from workspace root: `cargo test -p scribe-ingest`.

#![allow(dead_code)]

pub mod fixtures;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use scribe_api_client::{AuthorizationClient, CatalogRegistrar, ClientError, Uploader};
use scribe_core::{
    derive_object_key, AuthorizationGrant, CatalogEntry, ItemId, MediaKind, NormalizedPayload,
    ProgressSink, RawFile,
};
use scribe_ingest::{
    AssetView, Collaborators, IngestEvent, IngestOrchestrator, OrchestratorConfig,
};
use scribe_processing::{CompressionError, Compressor, MediaValidator};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Notify};
use tokio::time::Instant;

/// Raw payloads starting with this marker fail to compress.
pub const CORRUPT: &[u8] = b"corrupt";

/// Compressor that halves the payload, fails on [`CORRUPT`] payloads and can hold
/// selected payloads until released.
#[derive(Default)]
pub struct FakeCompressor {
    gates: Mutex<HashMap<Vec<u8>, Arc<Notify>>>,
    starts: Mutex<Vec<(Vec<u8>, Instant)>>,
}

impl FakeCompressor {
    /// Hold compression of `raw` until [`FakeCompressor::release`] is called.
    pub fn hold(&self, raw: &[u8]) {
        self.gates.lock().insert(raw.to_vec(), Arc::new(Notify::new()));
    }

    pub fn release(&self, raw: &[u8]) {
        if let Some(gate) = self.gates.lock().get(raw) {
            gate.notify_one();
        }
    }

    pub fn starts(&self) -> Vec<(Vec<u8>, Instant)> {
        self.starts.lock().clone()
    }
}

#[async_trait]
impl Compressor for FakeCompressor {
    async fn compress(
        &self,
        raw: Bytes,
        kind: MediaKind,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<NormalizedPayload, CompressionError> {
        self.starts.lock().push((raw.to_vec(), Instant::now()));
        progress.on_progress(5);

        let gate = self.gates.lock().get(raw.as_ref()).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        progress.on_progress(50);

        if raw.starts_with(CORRUPT) {
            return Err(CompressionError::Decode("unexpected end of file".to_string()));
        }

        let content_type = match kind {
            MediaKind::Image => "image/webp",
            MediaKind::Document => "text/plain",
        };
        Ok(NormalizedPayload {
            bytes: raw.slice(..raw.len().div_ceil(2)),
            content_type,
        })
    }
}

/// Authorizer deriving real object keys. Refuses names containing `denied`.
#[derive(Default)]
pub struct FakeAuthorizer {
    calls: Mutex<Vec<String>>,
    gate: Mutex<Option<Arc<Notify>>>,
    pub started: Notify,
}

impl FakeAuthorizer {
    /// Hold every authorization until [`FakeAuthorizer::release`] is called.
    pub fn hold(&self) {
        *self.gate.lock() = Some(Arc::new(Notify::new()));
    }

    pub fn release(&self) {
        if let Some(gate) = self.gate.lock().as_ref() {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl AuthorizationClient for FakeAuthorizer {
    async fn authorize(
        &self,
        filename: &str,
        _kind: MediaKind,
    ) -> Result<AuthorizationGrant, ClientError> {
        self.calls.lock().push(filename.to_string());
        self.started.notify_one();

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if filename.contains("denied") {
            return Err(ClientError::Api {
                code: 403,
                msg: "write access denied".to_string(),
            });
        }

        let object_key = derive_object_key(filename);
        Ok(AuthorizationGrant {
            write_url: format!("memory://bucket/{}", object_key),
            object_key,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub object_key: String,
    pub content_type: &'static str,
    pub size: usize,
}

/// Object store stand-in. Rejects keys whose stem contains `broken`.
#[derive(Default)]
pub struct FakeUploader {
    stored: Mutex<Vec<StoredObject>>,
    gate: Mutex<Option<Arc<Notify>>>,
    pub started: Notify,
}

impl FakeUploader {
    pub fn hold(&self) {
        *self.gate.lock() = Some(Arc::new(Notify::new()));
    }

    pub fn release(&self) {
        if let Some(gate) = self.gate.lock().as_ref() {
            gate.notify_one();
        }
    }

    pub fn stored(&self) -> Vec<StoredObject> {
        self.stored.lock().clone()
    }
}

#[async_trait]
impl Uploader for FakeUploader {
    async fn upload(
        &self,
        grant: &AuthorizationGrant,
        payload: &NormalizedPayload,
        progress: &dyn ProgressSink,
    ) -> Result<(), ClientError> {
        progress.on_progress(50);
        self.started.notify_one();

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if grant.object_key.contains("broken") {
            return Err(ClientError::Status {
                status: 500,
                body: "InternalError".to_string(),
            });
        }

        self.stored.lock().push(StoredObject {
            object_key: grant.object_key.clone(),
            content_type: payload.content_type,
            size: payload.len(),
        });
        progress.on_progress(100);
        Ok(())
    }
}

/// Catalog stand-in recording every registration call.
#[derive(Default)]
pub struct FakeRegistrar {
    calls: Mutex<Vec<Vec<CatalogEntry>>>,
    failing: Mutex<bool>,
}

impl FakeRegistrar {
    pub fn fail(&self) {
        *self.failing.lock() = true;
    }

    pub fn calls(&self) -> Vec<Vec<CatalogEntry>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CatalogRegistrar for FakeRegistrar {
    async fn register(&self, entries: &[CatalogEntry]) -> Result<(), ClientError> {
        self.calls.lock().push(entries.to_vec());
        if *self.failing.lock() {
            return Err(ClientError::Api {
                code: 503,
                msg: "catalog unavailable".to_string(),
            });
        }
        Ok(())
    }
}

pub const START_DELAY: Duration = Duration::from_millis(150);

/// Orchestrator over fakes, plus handles to inspect them.
pub struct TestPipeline {
    pub orchestrator: IngestOrchestrator,
    pub compressor: Arc<FakeCompressor>,
    pub authorizer: Arc<FakeAuthorizer>,
    pub uploader: Arc<FakeUploader>,
    pub registrar: Arc<FakeRegistrar>,
}

impl TestPipeline {
    pub fn new() -> Self {
        Self::with_validator(MediaValidator::all())
    }

    pub fn with_validator(validator: MediaValidator) -> Self {
        Self::build(validator, START_DELAY)
    }

    pub fn with_start_delay(delay: Duration) -> Self {
        Self::build(MediaValidator::all(), delay)
    }

    fn build(validator: MediaValidator, start_delay: Duration) -> Self {
        let compressor = Arc::new(FakeCompressor::default());
        let authorizer = Arc::new(FakeAuthorizer::default());
        let uploader = Arc::new(FakeUploader::default());
        let registrar = Arc::new(FakeRegistrar::default());

        let orchestrator = IngestOrchestrator::new(
            validator,
            Collaborators {
                compressor: compressor.clone(),
                authorizer: authorizer.clone(),
                uploader: uploader.clone(),
                registrar: registrar.clone(),
            },
            OrchestratorConfig {
                compression_start_delay: start_delay,
                event_capacity: 1024,
            },
        );

        Self {
            orchestrator,
            compressor,
            authorizer,
            uploader,
            registrar,
        }
    }

    pub fn item(&self, id: ItemId) -> AssetView {
        self.orchestrator
            .item(id)
            .unwrap_or_else(|| panic!("item {} not in batch", id))
    }
}

pub fn image(name: &str, bytes: &'static [u8]) -> RawFile {
    RawFile::new(name, "image/jpeg", Bytes::from_static(bytes))
}

pub fn markdown(name: &str, bytes: &'static [u8]) -> RawFile {
    RawFile::new(name, "text/markdown", Bytes::from_static(bytes))
}

/// Receive events until one matches `predicate`.
pub async fn wait_for_event<F>(rx: &mut broadcast::Receiver<IngestEvent>, mut predicate: F) -> IngestEvent
where
    F: FnMut(&IngestEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Drain every event already published.
pub fn drain(rx: &mut broadcast::Receiver<IngestEvent>) -> Vec<IngestEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}
