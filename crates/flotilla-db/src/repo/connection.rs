//! Observer connection repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flotilla_core::connection::ConnectionRecord;
use sqlx::PgPool;

use crate::DbResult;

/// Per-key insert/delete/scan over connection records. Deleting an absent row
/// is not an error; a scan may race a concurrent delete.
#[async_trait]
pub trait ConnectionRepo: Send + Sync {
    async fn insert(&self, record: &ConnectionRecord) -> DbResult<()>;

    /// Idempotent delete.
    async fn delete(&self, connection_id: &str) -> DbResult<()>;

    /// Ids of all records whose expiry is still in the future.
    async fn list_live(&self, now: DateTime<Utc>) -> DbResult<Vec<String>>;

    /// Remove records past their expiry, returning how many were dropped.
    async fn delete_expired(&self, now: DateTime<Utc>) -> DbResult<u64>;
}

/// PostgreSQL implementation of ConnectionRepo.
pub struct PgConnectionRepo {
    pool: PgPool,
}

impl PgConnectionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectionRepo for PgConnectionRepo {
    async fn insert(&self, record: &ConnectionRecord) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO connections (connection_id, expires_at)
            VALUES ($1, $2)
            ON CONFLICT (connection_id) DO UPDATE SET expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(&record.connection_id)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, connection_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM connections WHERE connection_id = $1")
            .bind(connection_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_live(&self, now: DateTime<Utc>) -> DbResult<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT connection_id FROM connections WHERE expires_at > $1",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM connections WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
