//! Status record repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flotilla_core::TaskId;
use flotilla_core::status::{CURRENT_SORT_KEY, ChangeKind, JobState, JobType, StatusRecord};
use sqlx::PgPool;

use crate::DbResult;

/// Point read/write of current-snapshot rows plus the two secondary lookup
/// paths (by state, by job type), each ordered by update time descending.
#[async_trait]
pub trait StatusRepo: Send + Sync {
    async fn get_current(&self, task_id: &TaskId) -> DbResult<Option<StatusRecord>>;

    /// Overwrite the `(task_id, "STATUS")` row, reporting whether it existed.
    async fn put_current(&self, record: &StatusRecord) -> DbResult<ChangeKind>;

    async fn list_by_state(&self, state: &JobState, limit: i64) -> DbResult<Vec<StatusRecord>>;

    async fn list_by_job_type(&self, job_type: &JobType, limit: i64)
    -> DbResult<Vec<StatusRecord>>;

    /// Most recently updated RUNNING row, excluding the given job types.
    async fn find_active(&self, exclude: &[JobType]) -> DbResult<Option<StatusRecord>>;

    /// Count of RUNNING rows with the given job type.
    async fn count_active(&self, job_type: &JobType) -> DbResult<u64>;
}

/// Database row shape; label columns are plain text.
#[derive(Debug, sqlx::FromRow)]
struct StatusRow {
    task_id: String,
    sort_key: String,
    state: String,
    job_type: String,
    processed: i64,
    total: i64,
    message: String,
    level: String,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StatusRow> for StatusRecord {
    fn from(row: StatusRow) -> Self {
        StatusRecord {
            task_id: TaskId::from(row.task_id),
            sort_key: row.sort_key,
            state: JobState::from_label(&row.state),
            job_type: JobType::from_label(&row.job_type),
            processed: row.processed.max(0) as u64,
            total: row.total.max(0) as u64,
            message: row.message,
            level: row.level,
            started_at: row.started_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL implementation of StatusRepo.
pub struct PgStatusRepo {
    pool: PgPool,
}

impl PgStatusRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatusRepo for PgStatusRepo {
    async fn get_current(&self, task_id: &TaskId) -> DbResult<Option<StatusRecord>> {
        let row = sqlx::query_as::<_, StatusRow>(
            "SELECT * FROM status_records WHERE task_id = $1 AND sort_key = $2",
        )
        .bind(task_id.as_str())
        .bind(CURRENT_SORT_KEY)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(StatusRecord::from))
    }

    async fn put_current(&self, record: &StatusRecord) -> DbResult<ChangeKind> {
        // xmax = 0 distinguishes a fresh insert from a conflict-overwrite.
        let inserted = sqlx::query_scalar::<_, bool>(
            r#"
            INSERT INTO status_records
                (task_id, sort_key, state, job_type, processed, total, message, level, started_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (task_id, sort_key) DO UPDATE SET
                state = EXCLUDED.state,
                job_type = EXCLUDED.job_type,
                processed = EXCLUDED.processed,
                total = EXCLUDED.total,
                message = EXCLUDED.message,
                level = EXCLUDED.level,
                updated_at = EXCLUDED.updated_at
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(record.task_id.as_str())
        .bind(CURRENT_SORT_KEY)
        .bind(record.state.as_label())
        .bind(record.job_type.as_label())
        .bind(record.processed as i64)
        .bind(record.total as i64)
        .bind(&record.message)
        .bind(&record.level)
        .bind(record.started_at)
        .bind(record.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(if inserted {
            ChangeKind::Insert
        } else {
            ChangeKind::Modify
        })
    }

    async fn list_by_state(&self, state: &JobState, limit: i64) -> DbResult<Vec<StatusRecord>> {
        let rows = sqlx::query_as::<_, StatusRow>(
            r#"
            SELECT * FROM status_records
            WHERE sort_key = $1 AND state = $2
            ORDER BY updated_at DESC
            LIMIT $3
            "#,
        )
        .bind(CURRENT_SORT_KEY)
        .bind(state.as_label())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(StatusRecord::from).collect())
    }

    async fn list_by_job_type(
        &self,
        job_type: &JobType,
        limit: i64,
    ) -> DbResult<Vec<StatusRecord>> {
        let rows = sqlx::query_as::<_, StatusRow>(
            r#"
            SELECT * FROM status_records
            WHERE sort_key = $1 AND job_type = $2
            ORDER BY updated_at DESC
            LIMIT $3
            "#,
        )
        .bind(CURRENT_SORT_KEY)
        .bind(job_type.as_label())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(StatusRecord::from).collect())
    }

    async fn find_active(&self, exclude: &[JobType]) -> DbResult<Option<StatusRecord>> {
        let excluded: Vec<String> = exclude.iter().map(|t| t.as_label().to_string()).collect();
        let row = sqlx::query_as::<_, StatusRow>(
            r#"
            SELECT * FROM status_records
            WHERE sort_key = $1 AND state = $2 AND job_type <> ALL($3)
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(CURRENT_SORT_KEY)
        .bind(JobState::Running.as_label())
        .bind(&excluded)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(StatusRecord::from))
    }

    async fn count_active(&self, job_type: &JobType) -> DbResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM status_records
            WHERE sort_key = $1 AND state = $2 AND job_type = $3
            "#,
        )
        .bind(CURRENT_SORT_KEY)
        .bind(JobState::Running.as_label())
        .bind(job_type.as_label())
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }
}
