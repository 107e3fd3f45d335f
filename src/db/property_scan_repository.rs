//! Property scan repository

use anyhow::{Context, Result};
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use super::{format_timestamp, parse_optional_timestamp, parse_timestamp, parse_uuid};
use crate::models::{Pagination, PropertyScan, ScanStatus};

#[derive(Debug, FromRow)]
struct PropertyScanRow {
    id: String,
    property_id: String,
    name: String,
    status: String,
    total_items: Option<i64>,
    scanned_items: Option<i64>,
    completed_at: Option<String>,
    created_at: String,
    updated_at: String,
}

const SELECT_SCAN: &str = r#"
    SELECT id, property_id, name, status, total_items, scanned_items, completed_at,
           created_at, updated_at
    FROM property_scans
"#;

pub struct PropertyScanRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> PropertyScanRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    /// Insert a scan. A second `in_progress` scan for the same property
    /// violates `uq_scans_in_progress`.
    pub async fn create(&mut self, scan: &PropertyScan) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO property_scans (id, property_id, name, status, total_items,
                                        scanned_items, completed_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(scan.id.to_string())
        .bind(scan.property_id.to_string())
        .bind(&scan.name)
        .bind(scan.status.as_str())
        .bind(scan.total_items)
        .bind(scan.scanned_items)
        .bind(scan.completed_at.as_ref().map(format_timestamp))
        .bind(format_timestamp(&scan.created_at))
        .bind(format_timestamp(&scan.updated_at))
        .execute(&mut *self.conn)
        .await
        .context("Failed to create property scan")?;

        Ok(())
    }

    pub async fn get(&mut self, property_id: Uuid, id: Uuid) -> Result<Option<PropertyScan>> {
        let row = sqlx::query_as::<_, PropertyScanRow>(&format!(
            "{} WHERE property_id = ? AND id = ?",
            SELECT_SCAN
        ))
        .bind(property_id.to_string())
        .bind(id.to_string())
        .fetch_optional(&mut *self.conn)
        .await
        .context("Failed to get property scan")?;

        Ok(row.map(row_to_scan))
    }

    pub async fn get_in_progress(&mut self, property_id: Uuid) -> Result<Option<PropertyScan>> {
        let row = sqlx::query_as::<_, PropertyScanRow>(&format!(
            "{} WHERE property_id = ? AND status = 'in_progress'",
            SELECT_SCAN
        ))
        .bind(property_id.to_string())
        .fetch_optional(&mut *self.conn)
        .await
        .context("Failed to get running scan")?;

        Ok(row.map(row_to_scan))
    }

    pub async fn list(
        &mut self,
        property_id: Uuid,
        pagination: Pagination,
    ) -> Result<(Vec<PropertyScan>, u64)> {
        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM property_scans WHERE property_id = ?")
                .bind(property_id.to_string())
                .fetch_one(&mut *self.conn)
                .await
                .context("Failed to count property scans")?;

        let rows = sqlx::query_as::<_, PropertyScanRow>(&format!(
            "{} WHERE property_id = ? ORDER BY created_at DESC, id LIMIT ? OFFSET ?",
            SELECT_SCAN
        ))
        .bind(property_id.to_string())
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&mut *self.conn)
        .await
        .context("Failed to list property scans")?;

        Ok((rows.into_iter().map(row_to_scan).collect(), total.max(0) as u64))
    }

    pub async fn update(&mut self, scan: &PropertyScan) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE property_scans
            SET name = ?, status = ?, total_items = ?, scanned_items = ?, completed_at = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&scan.name)
        .bind(scan.status.as_str())
        .bind(scan.total_items)
        .bind(scan.scanned_items)
        .bind(scan.completed_at.as_ref().map(format_timestamp))
        .bind(format_timestamp(&scan.updated_at))
        .bind(scan.id.to_string())
        .execute(&mut *self.conn)
        .await
        .context("Failed to update property scan")?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&mut self, property_id: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM property_scans WHERE property_id = ? AND id = ?")
            .bind(property_id.to_string())
            .bind(id.to_string())
            .execute(&mut *self.conn)
            .await
            .context("Failed to delete property scan")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_scan(row: PropertyScanRow) -> PropertyScan {
    PropertyScan {
        id: parse_uuid(&row.id),
        property_id: parse_uuid(&row.property_id),
        name: row.name,
        status: ScanStatus::parse(&row.status).unwrap_or(ScanStatus::Completed),
        total_items: row.total_items,
        scanned_items: row.scanned_items,
        completed_at: parse_optional_timestamp(row.completed_at.as_deref()),
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    }
}
