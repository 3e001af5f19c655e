//! Catalog store read path.
//!
//! The catalog is populated by the (external) workers; the control plane only
//! lists children on behalf of the browsing API.

use async_trait::async_trait;
use flotilla_core::catalog::{CatalogEntry, CatalogStore};
use sqlx::PgPool;

/// Database row shape for catalog entries.
#[derive(Debug, sqlx::FromRow)]
struct CatalogRow {
    id: String,
    parent_id: String,
    name: String,
    kind: String,
    size_bytes: i64,
}

impl From<CatalogRow> for CatalogEntry {
    fn from(row: CatalogRow) -> Self {
        CatalogEntry {
            id: row.id,
            parent_id: row.parent_id,
            name: row.name,
            kind: row.kind,
            size_bytes: row.size_bytes.max(0) as u64,
        }
    }
}

/// PostgreSQL implementation of CatalogStore.
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn list_children(&self, parent_id: &str) -> flotilla_core::Result<Vec<CatalogEntry>> {
        let rows = sqlx::query_as::<_, CatalogRow>(
            "SELECT * FROM catalog_entries WHERE parent_id = $1 ORDER BY name",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| flotilla_core::Error::Store(e.to_string()))?;
        Ok(rows.into_iter().map(CatalogEntry::from).collect())
    }
}
