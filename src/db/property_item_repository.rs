//! Property item repository

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use super::{
    format_timestamp, like_pattern, parse_optional_timestamp, parse_optional_uuid,
    parse_timestamp, parse_uuid,
};
use crate::models::{ItemIdentifier, ItemScanStatus, Pagination, PropertyItem};

#[derive(Debug, FromRow)]
struct PropertyItemRow {
    id: String,
    property_id: String,
    employee_id: Option<String>,
    name: String,
    description: Option<String>,
    category: Option<String>,
    location: Option<String>,
    inventory_number: String,
    registration_number: Option<String>,
    serial_number: Option<String>,
    document_number: Option<String>,
    price: Option<f64>,
    scan_status: String,
    last_scanned_at: Option<String>,
    created_at: String,
    updated_at: String,
}

const SELECT_ITEM: &str = r#"
    SELECT id, property_id, employee_id, name, description, category, location,
           inventory_number, registration_number, serial_number, document_number, price,
           scan_status, last_scanned_at, created_at, updated_at
    FROM property_items
"#;

/// Item list filter
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub employee_id: Option<Uuid>,
    pub scan_status: Option<ItemScanStatus>,
    /// Matches name and every identifier
    pub search: Option<String>,
}

pub struct PropertyItemRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> PropertyItemRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, item: &PropertyItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO property_items (
                id, property_id, employee_id, name, description, category, location,
                inventory_number, registration_number, serial_number, document_number, price,
                scan_status, last_scanned_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.id.to_string())
        .bind(item.property_id.to_string())
        .bind(item.employee_id.map(|id| id.to_string()))
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.category)
        .bind(&item.location)
        .bind(&item.inventory_number)
        .bind(&item.registration_number)
        .bind(&item.serial_number)
        .bind(&item.document_number)
        .bind(item.price)
        .bind(item.scan_status.as_str())
        .bind(item.last_scanned_at.as_ref().map(format_timestamp))
        .bind(format_timestamp(&item.created_at))
        .bind(format_timestamp(&item.updated_at))
        .execute(&mut *self.conn)
        .await
        .context("Failed to create property item")?;

        Ok(())
    }

    pub async fn get(&mut self, property_id: Uuid, id: Uuid) -> Result<Option<PropertyItem>> {
        let row = sqlx::query_as::<_, PropertyItemRow>(&format!(
            "{} WHERE property_id = ? AND id = ?",
            SELECT_ITEM
        ))
        .bind(property_id.to_string())
        .bind(id.to_string())
        .fetch_optional(&mut *self.conn)
        .await
        .context("Failed to get property item")?;

        Ok(row.map(row_to_item))
    }

    pub async fn list(
        &mut self,
        property_id: Uuid,
        filter: &ItemFilter,
        pagination: Pagination,
    ) -> Result<(Vec<PropertyItem>, u64)> {
        let mut count: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM property_items");
        push_filter(&mut count, property_id, filter);
        let (total,): (i64,) = count
            .build_query_as()
            .fetch_one(&mut *self.conn)
            .await
            .context("Failed to count property items")?;

        let mut select: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_ITEM);
        push_filter(&mut select, property_id, filter);
        select.push(" ORDER BY inventory_number, id LIMIT ");
        select.push_bind(pagination.limit());
        select.push(" OFFSET ");
        select.push_bind(pagination.offset());

        let rows = select
            .build_query_as::<PropertyItemRow>()
            .fetch_all(&mut *self.conn)
            .await
            .context("Failed to list property items")?;

        Ok((rows.into_iter().map(row_to_item).collect(), total.max(0) as u64))
    }

    /// Whether another item of the property already uses `value` for `identifier`
    pub async fn identifier_taken(
        &mut self,
        property_id: Uuid,
        identifier: ItemIdentifier,
        value: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<bool> {
        // Column name comes from a closed enum, never from input
        let sql = format!(
            "SELECT COUNT(*) FROM property_items WHERE property_id = ? AND {} = ? AND id != ?",
            identifier.column()
        );
        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(property_id.to_string())
            .bind(value)
            .bind(exclude_id.map(|id| id.to_string()).unwrap_or_default())
            .fetch_one(&mut *self.conn)
            .await
            .context("Failed to check item identifier")?;

        Ok(count > 0)
    }

    pub async fn update(&mut self, item: &PropertyItem) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE property_items
            SET employee_id = ?, name = ?, description = ?, category = ?, location = ?,
                inventory_number = ?, registration_number = ?, serial_number = ?,
                document_number = ?, price = ?, scan_status = ?, last_scanned_at = ?,
                updated_at = ?
            WHERE id = ? AND property_id = ?
            "#,
        )
        .bind(item.employee_id.map(|id| id.to_string()))
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.category)
        .bind(&item.location)
        .bind(&item.inventory_number)
        .bind(&item.registration_number)
        .bind(&item.serial_number)
        .bind(&item.document_number)
        .bind(item.price)
        .bind(item.scan_status.as_str())
        .bind(item.last_scanned_at.as_ref().map(format_timestamp))
        .bind(format_timestamp(&item.updated_at))
        .bind(item.id.to_string())
        .bind(item.property_id.to_string())
        .execute(&mut *self.conn)
        .await
        .context("Failed to update property item")?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&mut self, property_id: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM property_items WHERE property_id = ? AND id = ?")
            .bind(property_id.to_string())
            .bind(id.to_string())
            .execute(&mut *self.conn)
            .await
            .context("Failed to delete property item")?;

        Ok(result.rows_affected() > 0)
    }

    /// Reset every item of the property to `not_scanned` for a new campaign
    pub async fn reset_scan_status(&mut self, property_id: Uuid, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE property_items
            SET scan_status = 'not_scanned', updated_at = ?
            WHERE property_id = ? AND scan_status != 'not_scanned'
            "#,
        )
        .bind(format_timestamp(&now))
        .bind(property_id.to_string())
        .execute(&mut *self.conn)
        .await
        .context("Failed to reset item scan status")?;

        Ok(result.rows_affected())
    }

    /// `(total, scanned)` item counts for the property
    pub async fn scan_counts(&mut self, property_id: Uuid) -> Result<(i64, i64)> {
        let counts: (i64, Option<i64>) = sqlx::query_as(
            r#"
            SELECT COUNT(*), SUM(CASE WHEN scan_status = 'scanned' THEN 1 ELSE 0 END)
            FROM property_items
            WHERE property_id = ?
            "#,
        )
        .bind(property_id.to_string())
        .fetch_one(&mut *self.conn)
        .await
        .context("Failed to count scanned items")?;

        Ok((counts.0, counts.1.unwrap_or(0)))
    }

    /// Clear assignments of an employee leaving the organization
    pub async fn unassign_employee(&mut self, property_id: Uuid, employee_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE property_items
            SET employee_id = NULL, updated_at = ?
            WHERE property_id = ? AND employee_id = ?
            "#,
        )
        .bind(format_timestamp(&Utc::now()))
        .bind(property_id.to_string())
        .bind(employee_id.to_string())
        .execute(&mut *self.conn)
        .await
        .context("Failed to unassign employee items")?;

        Ok(result.rows_affected())
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, property_id: Uuid, filter: &ItemFilter) {
    builder.push(" WHERE property_id = ");
    builder.push_bind(property_id.to_string());

    if let Some(employee_id) = filter.employee_id {
        builder.push(" AND employee_id = ");
        builder.push_bind(employee_id.to_string());
    }
    if let Some(status) = filter.scan_status {
        builder.push(" AND scan_status = ");
        builder.push_bind(status.as_str());
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        builder.push(" AND (");
        let columns = [
            "name",
            "inventory_number",
            "registration_number",
            "serial_number",
            "document_number",
        ];
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder.push(*column);
            builder.push(" LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\'");
        }
        builder.push(")");
    }
}

fn row_to_item(row: PropertyItemRow) -> PropertyItem {
    PropertyItem {
        id: parse_uuid(&row.id),
        property_id: parse_uuid(&row.property_id),
        employee_id: parse_optional_uuid(row.employee_id.as_deref()),
        name: row.name,
        description: row.description,
        category: row.category,
        location: row.location,
        inventory_number: row.inventory_number,
        registration_number: row.registration_number,
        serial_number: row.serial_number,
        document_number: row.document_number,
        price: row.price,
        scan_status: ItemScanStatus::parse(&row.scan_status).unwrap_or_default(),
        last_scanned_at: parse_optional_timestamp(row.last_scanned_at.as_deref()),
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    }
}
