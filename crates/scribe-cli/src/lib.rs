//! Helpers shared by the `scribe` binary.

use anyhow::Context;
use scribe_core::{CatalogRecord, RawFile};
use scribe_ingest::IngestEvent;
use scribe_processing::{content_type_for_filename, MediaValidator};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

/// Declared type for files whose extension is unknown; the validator rejects it.
pub const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn validator_for(images_only: bool, documents_only: bool) -> MediaValidator {
    match (images_only, documents_only) {
        (true, false) => MediaValidator::images(),
        (false, true) => MediaValidator::documents(),
        _ => MediaValidator::all(),
    }
}

/// Read a file from disk, declaring its media type from the extension.
pub fn load_file(path: &Path) -> anyhow::Result<RawFile> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string());
    let content_type = content_type_for_filename(&name).unwrap_or(UNKNOWN_CONTENT_TYPE);

    Ok(RawFile::new(name, content_type, bytes.into()))
}

pub fn load_files(paths: &[PathBuf]) -> anyhow::Result<Vec<RawFile>> {
    paths.iter().map(|path| load_file(path)).collect()
}

/// Log batch events until the bus closes. Returns whether the catalog changed.
pub async fn watch_events(mut events: broadcast::Receiver<IngestEvent>) -> bool {
    let mut catalog_changed = false;
    loop {
        match events.recv().await {
            Ok(IngestEvent::ItemUpdated(view)) => tracing::debug!(
                name = %view.display_name,
                compression = ?view.compression_state,
                compression_progress = view.compression_progress_percent,
                upload = ?view.upload_state,
                upload_progress = view.upload_progress_percent,
                "Item updated"
            ),
            Ok(IngestEvent::CatalogChanged { entries }) => {
                tracing::info!(count = entries.len(), "Catalog changed");
                catalog_changed = true;
            }
            Ok(IngestEvent::RegistrationFailed { items, message }) => {
                tracing::warn!(count = items.len(), error = %message, "Uploaded items are not registered")
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Event listener lagged")
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    catalog_changed
}

/// Fixed-width table of catalog records.
pub fn format_catalog_table(records: &[CatalogRecord]) -> String {
    let mut out = format!("{:<42} {:<10} {}\n", "NAME", "KIND", "CREATED");
    for record in records {
        out.push_str(&format!(
            "{:<42} {:<10} {}\n",
            truncate_string(&record.name, 42),
            record.kind.as_str(),
            record.created_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    out
}
