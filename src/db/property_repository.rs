//! Property repository

use anyhow::{Context, Result};
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::models::Property;

#[derive(Debug, FromRow)]
struct PropertyRow {
    id: String,
    organization_id: String,
    name: String,
    description: Option<String>,
    created_at: String,
    updated_at: String,
}

pub struct PropertyRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> PropertyRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_organization(&mut self, organization_id: Uuid) -> Result<Option<Property>> {
        let row = sqlx::query_as::<_, PropertyRow>(
            r#"
            SELECT id, organization_id, name, description, created_at, updated_at
            FROM properties
            WHERE organization_id = ?
            "#,
        )
        .bind(organization_id.to_string())
        .fetch_optional(&mut *self.conn)
        .await
        .context("Failed to get property")?;

        Ok(row.map(row_to_property))
    }

    pub async fn create(&mut self, property: &Property) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO properties (id, organization_id, name, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(property.id.to_string())
        .bind(property.organization_id.to_string())
        .bind(&property.name)
        .bind(&property.description)
        .bind(format_timestamp(&property.created_at))
        .bind(format_timestamp(&property.updated_at))
        .execute(&mut *self.conn)
        .await
        .context("Failed to create property")?;

        Ok(())
    }

    pub async fn update(&mut self, property: &Property) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE properties SET name = ?, description = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&property.name)
        .bind(&property.description)
        .bind(format_timestamp(&property.updated_at))
        .bind(property.id.to_string())
        .execute(&mut *self.conn)
        .await
        .context("Failed to update property")?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&mut self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM properties WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *self.conn)
            .await
            .context("Failed to delete property")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_property(row: PropertyRow) -> Property {
    Property {
        id: parse_uuid(&row.id),
        organization_id: parse_uuid(&row.organization_id),
        name: row.name,
        description: row.description,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    }
}
