//! Shared handle over the batch store.
//!
//! Every mutation goes through the store lock and publishes the resulting view while the
//! lock is held, so subscribers observe transitions in the order they were applied.

use parking_lot::Mutex;
use scribe_core::{CatalogEntry, IngestError, ItemId, MediaKind, NormalizedPayload, RawFile};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::events::{EventBus, IngestEvent};
use crate::store::{AssetView, BatchStore};

#[derive(Clone, Debug)]
pub struct Batch {
    store: Arc<Mutex<BatchStore>>,
    events: EventBus,
}

impl Batch {
    pub fn new(events: EventBus) -> Self {
        Self {
            store: Arc::new(Mutex::new(BatchStore::new())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IngestEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn snapshot(&self) -> Vec<AssetView> {
        self.store.lock().views()
    }

    pub fn view(&self, id: ItemId) -> Option<AssetView> {
        self.store.lock().view(id)
    }

    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    pub fn insert(&self, file: RawFile, kind: MediaKind) -> AssetView {
        let mut store = self.store.lock();
        let view = store.insert(file, kind);
        self.events.publish(IngestEvent::ItemAdded(view.clone()));
        view
    }

    fn update<F>(&self, apply: F) -> Option<AssetView>
    where
        F: FnOnce(&mut BatchStore) -> Option<AssetView>,
    {
        let mut store = self.store.lock();
        let view = apply(&mut *store)?;
        self.events.publish(IngestEvent::ItemUpdated(view.clone()));
        Some(view)
    }

    pub fn begin_compression(&self, id: ItemId) -> Option<(bytes::Bytes, MediaKind)> {
        let mut store = self.store.lock();
        let started = store.begin_compression(id)?;
        if let Some(view) = store.view(id) {
            self.events.publish(IngestEvent::ItemUpdated(view));
        }
        Some(started)
    }

    pub fn report_compression_progress(&self, id: ItemId, percent: u8) {
        self.update(|store| store.set_compression_progress(id, percent));
    }

    pub fn finish_compression(
        &self,
        id: ItemId,
        outcome: Result<NormalizedPayload, IngestError>,
    ) -> Option<AssetView> {
        self.update(|store| store.finish_compression(id, outcome))
    }

    pub fn commit_candidates(&self) -> Vec<ItemId> {
        self.store.lock().commit_candidates()
    }

    pub fn begin_authorization(&self, id: ItemId) -> Option<AssetView> {
        self.update(|store| store.begin_authorization(id))
    }

    pub fn fail_authorization(&self, id: ItemId, err: &IngestError) -> Option<AssetView> {
        self.update(|store| store.fail_authorization(id, err))
    }

    pub fn begin_upload(&self, id: ItemId, object_key: &str) -> Option<NormalizedPayload> {
        let mut store = self.store.lock();
        let (payload, view) = store.begin_upload(id, object_key)?;
        self.events.publish(IngestEvent::ItemUpdated(view));
        Some(payload)
    }

    pub fn report_upload_progress(&self, id: ItemId, percent: u8) {
        self.update(|store| store.set_upload_progress(id, percent));
    }

    pub fn finish_upload(&self, id: ItemId, outcome: Result<(), IngestError>) -> Option<AssetView> {
        self.update(|store| store.finish_upload(id, outcome))
    }

    pub fn catalog_entries(&self, ids: &[ItemId]) -> Vec<CatalogEntry> {
        self.store.lock().catalog_entries(ids)
    }

    pub fn mark_unregistered(&self, ids: &[ItemId], err: &IngestError) {
        let mut store = self.store.lock();
        for view in store.mark_unregistered(ids, err) {
            self.events.publish(IngestEvent::ItemUpdated(view));
        }
    }

    pub fn remove(&self, id: ItemId) -> Result<AssetView, IngestError> {
        let mut store = self.store.lock();
        self.remove_locked(&mut store, id)
    }

    pub fn remove_at(&self, position: usize) -> Result<AssetView, IngestError> {
        let mut store = self.store.lock();
        let id = store
            .id_at(position)
            .ok_or(IngestError::PositionOutOfRange(position))?;
        self.remove_locked(&mut store, id)
    }

    fn remove_locked(&self, store: &mut BatchStore, id: ItemId) -> Result<AssetView, IngestError> {
        let view = store.remove(id)?;
        self.events.publish(IngestEvent::ItemRemoved {
            id,
            position: view.position,
        });
        Ok(view)
    }

    pub fn clear(&self) -> Result<usize, IngestError> {
        let mut store = self.store.lock();
        let removed = store.clear()?;
        // Positions are reported back to front so each one is valid when applied in order.
        for (position, id) in removed.iter().enumerate().rev() {
            self.events.publish(IngestEvent::ItemRemoved {
                id: *id,
                position,
            });
        }
        Ok(removed.len())
    }
}
