//! Organization (tenant) repository

use anyhow::{Context, Result};
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::models::Organization;

#[derive(Debug, FromRow)]
struct OrganizationRow {
    id: String,
    admin_id: String,
    name: String,
    description: Option<String>,
    created_at: String,
    updated_at: String,
}

pub struct OrganizationRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> OrganizationRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&mut self, id: Uuid) -> Result<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, admin_id, name, description, created_at, updated_at
            FROM organizations
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&mut *self.conn)
        .await
        .context("Failed to get organization")?;

        Ok(row.map(row_to_org))
    }

    /// The organization owned by an admin, if any
    pub async fn get_by_admin(&mut self, admin_id: Uuid) -> Result<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, admin_id, name, description, created_at, updated_at
            FROM organizations
            WHERE admin_id = ?
            "#,
        )
        .bind(admin_id.to_string())
        .fetch_optional(&mut *self.conn)
        .await
        .context("Failed to get organization by admin")?;

        Ok(row.map(row_to_org))
    }

    pub async fn create(&mut self, org: &Organization) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO organizations (id, admin_id, name, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(org.id.to_string())
        .bind(org.admin_id.to_string())
        .bind(&org.name)
        .bind(&org.description)
        .bind(format_timestamp(&org.created_at))
        .bind(format_timestamp(&org.updated_at))
        .execute(&mut *self.conn)
        .await
        .context("Failed to create organization")?;

        Ok(())
    }

    pub async fn update(&mut self, org: &Organization) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE organizations
            SET name = ?, description = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&org.name)
        .bind(&org.description)
        .bind(format_timestamp(&org.updated_at))
        .bind(org.id.to_string())
        .execute(&mut *self.conn)
        .await
        .context("Failed to update organization")?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an organization. The property and everything under it cascade;
    /// member employees are detached.
    pub async fn delete(&mut self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *self.conn)
            .await
            .context("Failed to delete organization")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_org(row: OrganizationRow) -> Organization {
    Organization {
        id: parse_uuid(&row.id),
        admin_id: parse_uuid(&row.admin_id),
        name: row.name,
        description: row.description,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    }
}
