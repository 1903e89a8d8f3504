//! Batch store: the ordered, identity-keyed collection of items in one session.
//!
//! Items are addressed by [`ItemId`]. Positions are derived from the order index on every
//! read, so a completion that arrives after a removal still lands on the item it was
//! started for, or is dropped when that item is gone.

use bytes::Bytes;
use scribe_core::{
    CatalogEntry, CompressionState, IngestError, ItemId, MediaKind, NormalizedPayload, RawFile,
    UploadState,
};
use serde::Serialize;
use std::collections::HashMap;

/// One user-submitted candidate.
#[derive(Debug, Clone)]
pub struct AssetItem {
    id: ItemId,
    display_name: String,
    media_kind: MediaKind,
    raw_payload: Option<Bytes>,
    original_size_bytes: usize,
    compression_state: CompressionState,
    compression_progress_percent: u8,
    normalized_payload: Option<NormalizedPayload>,
    upload_state: UploadState,
    upload_progress_percent: u8,
    object_key: Option<String>,
    error_message: Option<String>,
}

impl AssetItem {
    fn new(file: RawFile, media_kind: MediaKind) -> Self {
        Self {
            id: ItemId::new(),
            original_size_bytes: file.bytes.len(),
            display_name: file.name,
            media_kind,
            raw_payload: Some(file.bytes),
            compression_state: CompressionState::Pending,
            compression_progress_percent: 0,
            normalized_payload: None,
            upload_state: UploadState::NotStarted,
            upload_progress_percent: 0,
            object_key: None,
            error_message: None,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn media_kind(&self) -> MediaKind {
        self.media_kind
    }

    pub fn compression_state(&self) -> CompressionState {
        self.compression_state
    }

    pub fn upload_state(&self) -> UploadState {
        self.upload_state
    }

    /// Only present once compressed.
    pub fn normalized_payload(&self) -> Option<&NormalizedPayload> {
        match self.compression_state {
            CompressionState::Compressed => self.normalized_payload.as_ref(),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    fn is_commit_candidate(&self) -> bool {
        self.compression_state == CompressionState::Compressed
            && self.upload_state == UploadState::NotStarted
    }
}

/// Read-only snapshot of an item, as exposed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetView {
    pub id: ItemId,
    pub position: usize,
    pub display_name: String,
    pub media_kind: MediaKind,
    pub original_size_bytes: usize,
    pub compression_state: CompressionState,
    pub compression_progress_percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_size_bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<&'static str>,
    pub upload_state: UploadState,
    pub upload_progress_percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AssetView {
    fn of(item: &AssetItem, position: usize) -> Self {
        let normalized = item.normalized_payload();
        Self {
            id: item.id,
            position,
            display_name: item.display_name.clone(),
            media_kind: item.media_kind,
            original_size_bytes: item.original_size_bytes,
            compression_state: item.compression_state,
            compression_progress_percent: item.compression_progress_percent,
            normalized_size_bytes: normalized.map(NormalizedPayload::len),
            content_type: normalized.map(|p| p.content_type),
            upload_state: item.upload_state,
            upload_progress_percent: item.upload_progress_percent,
            object_key: item.object_key.clone(),
            error_message: item.error_message.clone(),
        }
    }
}

/// Ordered item collection.
///
/// Every transition checks the item's current state and returns `None` when the item is
/// missing or not in the expected state; callers treat that as "result discarded".
#[derive(Debug, Default)]
pub struct BatchStore {
    order: Vec<ItemId>,
    items: HashMap<ItemId, AssetItem>,
}

impl BatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&AssetItem> {
        self.items.get(&id)
    }

    pub fn position_of(&self, id: ItemId) -> Option<usize> {
        self.order.iter().position(|candidate| *candidate == id)
    }

    pub fn id_at(&self, position: usize) -> Option<ItemId> {
        self.order.get(position).copied()
    }

    pub fn view(&self, id: ItemId) -> Option<AssetView> {
        let position = self.position_of(id)?;
        self.items.get(&id).map(|item| AssetView::of(item, position))
    }

    pub fn views(&self) -> Vec<AssetView> {
        self.order
            .iter()
            .enumerate()
            .filter_map(|(position, id)| self.items.get(id).map(|item| AssetView::of(item, position)))
            .collect()
    }

    /// Append an accepted file as a `Pending` item.
    pub fn insert(&mut self, file: RawFile, media_kind: MediaKind) -> AssetView {
        let item = AssetItem::new(file, media_kind);
        let id = item.id;
        let view = AssetView::of(&item, self.order.len());
        self.order.push(id);
        self.items.insert(id, item);
        view
    }

    /// `Pending -> Compressing`. Hands the raw payload over to the compressor.
    pub fn begin_compression(&mut self, id: ItemId) -> Option<(Bytes, MediaKind)> {
        let item = self.items.get_mut(&id)?;
        if item.compression_state != CompressionState::Pending {
            return None;
        }
        let raw = item.raw_payload.take()?;
        item.compression_state = CompressionState::Compressing;
        item.compression_progress_percent = 0;
        Some((raw, item.media_kind))
    }

    /// Raise compression progress. Lower or repeated values are ignored.
    pub fn set_compression_progress(&mut self, id: ItemId, percent: u8) -> Option<AssetView> {
        let item = self.items.get_mut(&id)?;
        let percent = percent.min(100);
        if item.compression_state != CompressionState::Compressing
            || percent <= item.compression_progress_percent
        {
            return None;
        }
        item.compression_progress_percent = percent;
        self.view(id)
    }

    /// `Compressing -> Compressed | CompressionFailed`.
    pub fn finish_compression(
        &mut self,
        id: ItemId,
        outcome: Result<NormalizedPayload, IngestError>,
    ) -> Option<AssetView> {
        let item = self.items.get_mut(&id)?;
        if item.compression_state != CompressionState::Compressing {
            return None;
        }
        match outcome {
            Ok(payload) => {
                item.compression_state = CompressionState::Compressed;
                item.compression_progress_percent = 100;
                item.normalized_payload = Some(payload);
                item.error_message = None;
            }
            Err(err) => {
                item.compression_state = CompressionState::CompressionFailed;
                item.compression_progress_percent = 0;
                item.error_message = Some(err.to_string());
            }
        }
        self.view(id)
    }

    /// Items eligible for the commit phase, in batch order.
    pub fn commit_candidates(&self) -> Vec<ItemId> {
        self.order
            .iter()
            .filter(|id| self.items.get(*id).is_some_and(AssetItem::is_commit_candidate))
            .copied()
            .collect()
    }

    /// `NotStarted -> Authorizing`, only for compressed items.
    pub fn begin_authorization(&mut self, id: ItemId) -> Option<AssetView> {
        let item = self.items.get_mut(&id)?;
        if !item.is_commit_candidate() {
            return None;
        }
        item.upload_state = UploadState::Authorizing;
        self.view(id)
    }

    /// `Authorizing -> Uploading`. Returns the payload to transfer.
    pub fn begin_upload(&mut self, id: ItemId, object_key: &str) -> Option<(NormalizedPayload, AssetView)> {
        let item = self.items.get_mut(&id)?;
        if item.upload_state != UploadState::Authorizing {
            return None;
        }
        let payload = item.normalized_payload()?.clone();
        item.upload_state = UploadState::Uploading;
        item.upload_progress_percent = 0;
        item.object_key = Some(object_key.to_string());
        let view = self.view(id)?;
        Some((payload, view))
    }

    /// Raise upload progress. Lower or repeated values are ignored.
    pub fn set_upload_progress(&mut self, id: ItemId, percent: u8) -> Option<AssetView> {
        let item = self.items.get_mut(&id)?;
        let percent = percent.min(100);
        if item.upload_state != UploadState::Uploading || percent <= item.upload_progress_percent {
            return None;
        }
        item.upload_progress_percent = percent;
        self.view(id)
    }

    /// `Uploading -> Uploaded | UploadFailed`.
    pub fn finish_upload(&mut self, id: ItemId, outcome: Result<(), IngestError>) -> Option<AssetView> {
        let item = self.items.get_mut(&id)?;
        if item.upload_state != UploadState::Uploading {
            return None;
        }
        match outcome {
            Ok(()) => {
                item.upload_state = UploadState::Uploaded;
                item.upload_progress_percent = 100;
            }
            Err(err) => {
                item.upload_state = UploadState::UploadFailed;
                item.upload_progress_percent = 0;
                item.error_message = Some(err.to_string());
            }
        }
        self.view(id)
    }

    /// `Authorizing -> UploadFailed`, when no write grant could be obtained.
    pub fn fail_authorization(&mut self, id: ItemId, err: &IngestError) -> Option<AssetView> {
        let item = self.items.get_mut(&id)?;
        if item.upload_state != UploadState::Authorizing {
            return None;
        }
        item.upload_state = UploadState::UploadFailed;
        item.error_message = Some(err.to_string());
        self.view(id)
    }

    /// Catalog entries for the given items that are still present and `Uploaded`.
    pub fn catalog_entries(&self, ids: &[ItemId]) -> Vec<CatalogEntry> {
        ids.iter()
            .filter_map(|id| self.items.get(id))
            .filter(|item| item.upload_state == UploadState::Uploaded)
            .filter_map(|item| {
                item.object_key.clone().map(|object_key| CatalogEntry {
                    object_key,
                    media_kind: item.media_kind,
                })
            })
            .collect()
    }

    /// Attach a registration failure to uploaded items. States are left untouched.
    pub fn mark_unregistered(&mut self, ids: &[ItemId], err: &IngestError) -> Vec<AssetView> {
        let message = err.to_string();
        let mut touched = Vec::new();
        for id in ids {
            if let Some(item) = self.items.get_mut(id) {
                if item.upload_state == UploadState::Uploaded {
                    item.error_message = Some(message.clone());
                    touched.push(*id);
                }
            }
        }
        touched.into_iter().filter_map(|id| self.view(id)).collect()
    }

    /// Remove an item unless it is uploading. Returns its last view.
    pub fn remove(&mut self, id: ItemId) -> Result<AssetView, IngestError> {
        let view = self.view(id).ok_or(IngestError::ItemNotFound(id))?;
        if view.upload_state == UploadState::Uploading {
            return Err(IngestError::ItemUploading(id));
        }
        self.order.retain(|candidate| *candidate != id);
        self.items.remove(&id);
        Ok(view)
    }

    /// Drop every item. Rejected while any item is uploading.
    pub fn clear(&mut self) -> Result<Vec<ItemId>, IngestError> {
        if let Some(uploading) = self
            .order
            .iter()
            .find(|id| self.items.get(*id).is_some_and(|item| item.upload_state == UploadState::Uploading))
        {
            return Err(IngestError::ItemUploading(*uploading));
        }
        self.items.clear();
        Ok(std::mem::take(&mut self.order))
    }
}
