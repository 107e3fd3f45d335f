//! Database migrations
//!
//! Migrations are handled by SQLx and stored in the `migrations/` directory.
//! This module reports their state for the readiness probe.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::SqlitePool;

/// Applied migration summary
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub applied: i64,
    pub latest_version: Option<i64>,
}

/// Check that the database answers and report applied migrations
pub async fn status(pool: &SqlitePool) -> Result<MigrationStatus> {
    let (applied, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success = 1",
    )
    .fetch_one(pool)
    .await
    .context("Failed to read migration status")?;

    Ok(MigrationStatus {
        applied,
        latest_version,
    })
}
