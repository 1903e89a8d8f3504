//! Progress sinks that write into the batch by item identity.

use scribe_core::{ItemId, ProgressSink};

use crate::batch::Batch;

/// Forwards compressor progress to one item. Reports for a removed item are dropped.
#[derive(Debug, Clone)]
pub struct CompressionProgress {
    batch: Batch,
    id: ItemId,
}

impl CompressionProgress {
    pub fn new(batch: Batch, id: ItemId) -> Self {
        Self { batch, id }
    }
}

impl ProgressSink for CompressionProgress {
    fn on_progress(&self, percent: u8) {
        self.batch.report_compression_progress(self.id, percent);
    }
}

/// Forwards uploader progress to one item.
#[derive(Debug, Clone)]
pub struct UploadProgress {
    batch: Batch,
    id: ItemId,
}

impl UploadProgress {
    pub fn new(batch: Batch, id: ItemId) -> Self {
        Self { batch, id }
    }
}

impl ProgressSink for UploadProgress {
    fn on_progress(&self, percent: u8) {
        self.batch.report_upload_progress(self.id, percent);
    }
}
