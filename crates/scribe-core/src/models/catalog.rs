use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MediaKind;

/// Write location issued by the control plane for one object.
///
/// Expires implicitly on the remote side and is single-use: a grant is requested
/// per item and dropped once the transfer finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationGrant {
    pub object_key: String,
    pub write_url: String,
}

/// Unit submitted to the catalog once an object is uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "name")]
    pub object_key: String,
    #[serde(rename = "kind")]
    pub media_kind: MediaKind,
}

/// Registered object as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub name: String,
    pub kind: MediaKind,
    pub created_at: DateTime<Utc>,
}
