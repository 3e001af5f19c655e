//! Storage layer for Flotilla.
//!
//! Provides repository traits with PostgreSQL implementations, the
//! deduplicating status store with its change feed, the Postgres-backed work
//! queue, and in-memory implementations for tests and local development.

pub mod error;
pub mod memory;
pub mod repo;
pub mod store;

pub use error::{DbError, DbResult};
pub use repo::*;
pub use store::{StatusStore, UpsertOutcome};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a new database connection pool.
pub async fn create_pool(database_url: &str) -> DbResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run database migrations.
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
