//! PostgreSQL persistence for the client project portal.
//!
//! Repositories are zero-sized structs whose async methods take the pool
//! (or an open transaction) as their first argument. Soft-deleted rows are
//! excluded from every read.

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;
pub mod sequence;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations embedded from `./migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
