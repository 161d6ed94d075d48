use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::store::ensure_schema;

/// Creates the PostgreSQL connection pool and makes sure the result tables exist.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    ensure_schema(&pool).await?;
    info!("PostgreSQL connection pool established");
    Ok(pool)
}
