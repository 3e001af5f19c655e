//! Catalog store abstraction.
//!
//! The durable catalog itself is an external collaborator; only the listing
//! path the API delegates to is modeled here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// One entry of the catalog tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    /// Entry kind as the catalog reports it (e.g. "folder", "artifact").
    pub kind: String,
    pub size_bytes: u64,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_children(&self, parent_id: &str) -> Result<Vec<CatalogEntry>>;
}
