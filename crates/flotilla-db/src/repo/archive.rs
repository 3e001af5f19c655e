//! Event archive repository.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use flotilla_core::archive::EventArchive;
use flotilla_core::event::Envelope;
use sqlx::PgPool;

use crate::DbResult;

/// PostgreSQL event archive with a fixed retention window.
pub struct PgEventArchive {
    pool: PgPool,
    retention: Duration,
}

impl PgEventArchive {
    pub fn new(pool: PgPool, retention_days: u32) -> Self {
        Self {
            pool,
            retention: Duration::days(retention_days as i64),
        }
    }

    /// Drop archived events past their retention, returning how many.
    pub async fn prune_expired(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM event_archive WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl EventArchive for PgEventArchive {
    async fn record(&self, envelope: &Envelope) -> flotilla_core::Result<()> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO event_archive (id, source, detail_type, detail, received_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(uuid::Uuid::now_v7())
        .bind(&envelope.source)
        .bind(&envelope.detail_type)
        .bind(&envelope.detail)
        .bind(now)
        .bind(now + self.retention)
        .execute(&self.pool)
        .await
        .map_err(|e| flotilla_core::Error::Store(e.to_string()))?;
        Ok(())
    }
}
