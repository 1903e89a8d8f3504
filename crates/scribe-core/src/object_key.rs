//! Object key derivation.
//!
//! Key format: `{stem}-{millis}`. The stem is the filename without directory or final
//! extension, restricted to `[A-Za-z0-9._-]`. No format extension is appended: the catalog
//! records the media kind separately.

use chrono::Utc;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

const MAX_STEM_LEN: usize = 200;
const FALLBACK_STEM: &str = "asset";

/// Last suffix issued by this process.
static LAST_SUFFIX: AtomicI64 = AtomicI64::new(0);

/// Derive a fresh object key for `filename` using the wall clock.
///
/// Two calls never return the same key within one process, even within the same
/// millisecond: the suffix is bumped past the previously issued one.
pub fn derive_object_key(filename: &str) -> String {
    derive_object_key_at(filename, Utc::now().timestamp_millis())
}

/// Same as [`derive_object_key`] with an explicit clock reading.
pub fn derive_object_key_at(filename: &str, now_millis: i64) -> String {
    format!("{}-{}", object_stem(filename), next_suffix(now_millis))
}

fn next_suffix(now_millis: i64) -> i64 {
    let previous = LAST_SUFFIX
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now_millis.max(last + 1))
        })
        .unwrap_or_else(|last| last);
    now_millis.max(previous + 1)
}

pub(crate) fn object_stem(filename: &str) -> String {
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);

    let sanitized: String = stem
        .chars()
        .take(MAX_STEM_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches(|c| c == '_' || c == '.').is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        sanitized
    }
}
