//! Postgres-backed work queue.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flotilla_core::event::Envelope;
use flotilla_core::queue::{QueueDepth, WorkQueue};
use sqlx::PgPool;

use crate::DbResult;

/// A queued message awaiting worker consumption.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QueuedMessage {
    pub id: uuid::Uuid,
    pub envelope: serde_json::Value,
    pub status: String,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Work queue backed by PostgreSQL.
///
/// The control plane only enqueues and samples depth; `claim`/`complete` are
/// the consumption interface for the (external) worker processes.
pub struct PgWorkQueue {
    pool: PgPool,
}

impl PgWorkQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Claim the next available message.
    /// Uses SKIP LOCKED to prevent contention in distributed environments.
    pub async fn claim(&self, worker_id: &str) -> DbResult<Option<QueuedMessage>> {
        let message = sqlx::query_as::<_, QueuedMessage>(
            r#"
            UPDATE work_queue
            SET status = 'claimed', claimed_by = $1, claimed_at = NOW()
            WHERE id = (
                SELECT id FROM work_queue
                WHERE status = 'pending'
                ORDER BY created_at ASC
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }

    /// Acknowledge a claimed message.
    pub async fn complete(&self, id: uuid::Uuid) -> DbResult<()> {
        sqlx::query("UPDATE work_queue SET status = 'completed' WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl WorkQueue for PgWorkQueue {
    async fn enqueue(&self, envelope: &Envelope) -> flotilla_core::Result<()> {
        let body = serde_json::to_value(envelope)
            .map_err(|e| flotilla_core::Error::Queue(e.to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO work_queue (id, envelope, status, created_at)
            VALUES ($1, $2, 'pending', NOW())
            "#,
        )
        .bind(uuid::Uuid::now_v7())
        .bind(body)
        .execute(&self.pool)
        .await
        .map_err(|e| flotilla_core::Error::Queue(e.to_string()))?;
        Ok(())
    }

    async fn approx_depth(&self) -> flotilla_core::Result<Option<QueueDepth>> {
        let (visible, in_flight) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'pending'),
                COUNT(*) FILTER (WHERE status = 'claimed')
            FROM work_queue
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| flotilla_core::Error::Queue(e.to_string()))?;

        Ok(Some(QueueDepth {
            visible: visible.max(0) as u64,
            in_flight: in_flight.max(0) as u64,
        }))
    }
}
