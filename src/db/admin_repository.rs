//! Admin account repository

use anyhow::{Context, Result};
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use super::{format_timestamp, parse_optional_timestamp, parse_timestamp, parse_uuid};
use crate::models::Admin;

#[derive(Debug, FromRow)]
struct AdminRow {
    id: String,
    email: String,
    full_name: String,
    password_hash: String,
    is_verified: bool,
    verified_at: Option<String>,
    created_at: String,
    updated_at: String,
}

const SELECT_ADMIN: &str = r#"
    SELECT id, email, full_name, password_hash, is_verified, verified_at, created_at, updated_at
    FROM admins
"#;

pub struct AdminRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> AdminRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, admin: &Admin) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO admins (id, email, full_name, password_hash, is_verified, verified_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(admin.id.to_string())
        .bind(&admin.email)
        .bind(&admin.full_name)
        .bind(&admin.password_hash)
        .bind(admin.is_verified)
        .bind(admin.verified_at.as_ref().map(format_timestamp))
        .bind(format_timestamp(&admin.created_at))
        .bind(format_timestamp(&admin.updated_at))
        .execute(&mut *self.conn)
        .await
        .context("Failed to create admin")?;

        Ok(())
    }

    pub async fn get_by_id(&mut self, id: Uuid) -> Result<Option<Admin>> {
        let row = sqlx::query_as::<_, AdminRow>(&format!("{} WHERE id = ?", SELECT_ADMIN))
            .bind(id.to_string())
            .fetch_optional(&mut *self.conn)
            .await
            .context("Failed to get admin")?;

        Ok(row.map(row_to_admin))
    }

    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<Admin>> {
        let row = sqlx::query_as::<_, AdminRow>(&format!("{} WHERE email = ?", SELECT_ADMIN))
            .bind(email)
            .fetch_optional(&mut *self.conn)
            .await
            .context("Failed to get admin by email")?;

        Ok(row.map(row_to_admin))
    }

    /// Persist mutable account fields
    pub async fn update(&mut self, admin: &Admin) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE admins
            SET full_name = ?, password_hash = ?, is_verified = ?, verified_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&admin.full_name)
        .bind(&admin.password_hash)
        .bind(admin.is_verified)
        .bind(admin.verified_at.as_ref().map(format_timestamp))
        .bind(format_timestamp(&admin.updated_at))
        .bind(admin.id.to_string())
        .execute(&mut *self.conn)
        .await
        .context("Failed to update admin")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_admin(row: AdminRow) -> Admin {
    Admin {
        id: parse_uuid(&row.id),
        email: row.email,
        full_name: row.full_name,
        password_hash: row.password_hash,
        is_verified: row.is_verified,
        verified_at: parse_optional_timestamp(row.verified_at.as_deref()),
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    }
}
