//! Employee account repository

use anyhow::{Context, Result};
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use super::{
    format_timestamp, parse_optional_timestamp, parse_optional_uuid, parse_timestamp, parse_uuid,
};
use crate::models::{Employee, Pagination};

#[derive(Debug, FromRow)]
struct EmployeeRow {
    id: String,
    organization_id: Option<String>,
    email: String,
    full_name: String,
    password_hash: String,
    is_verified: bool,
    verified_at: Option<String>,
    created_at: String,
    updated_at: String,
}

const SELECT_EMPLOYEE: &str = r#"
    SELECT id, organization_id, email, full_name, password_hash, is_verified, verified_at,
           created_at, updated_at
    FROM employees
"#;

pub struct EmployeeRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> EmployeeRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, employee: &Employee) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO employees (id, organization_id, email, full_name, password_hash,
                                   is_verified, verified_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(employee.id.to_string())
        .bind(employee.organization_id.map(|id| id.to_string()))
        .bind(&employee.email)
        .bind(&employee.full_name)
        .bind(&employee.password_hash)
        .bind(employee.is_verified)
        .bind(employee.verified_at.as_ref().map(format_timestamp))
        .bind(format_timestamp(&employee.created_at))
        .bind(format_timestamp(&employee.updated_at))
        .execute(&mut *self.conn)
        .await
        .context("Failed to create employee")?;

        Ok(())
    }

    pub async fn get_by_id(&mut self, id: Uuid) -> Result<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>(&format!("{} WHERE id = ?", SELECT_EMPLOYEE))
            .bind(id.to_string())
            .fetch_optional(&mut *self.conn)
            .await
            .context("Failed to get employee")?;

        Ok(row.map(row_to_employee))
    }

    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<Employee>> {
        let row =
            sqlx::query_as::<_, EmployeeRow>(&format!("{} WHERE email = ?", SELECT_EMPLOYEE))
                .bind(email)
                .fetch_optional(&mut *self.conn)
                .await
                .context("Failed to get employee by email")?;

        Ok(row.map(row_to_employee))
    }

    /// Members of an organization, newest first
    pub async fn list_by_organization(
        &mut self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> Result<(Vec<Employee>, u64)> {
        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM employees WHERE organization_id = ?")
                .bind(organization_id.to_string())
                .fetch_one(&mut *self.conn)
                .await
                .context("Failed to count employees")?;

        let rows = sqlx::query_as::<_, EmployeeRow>(&format!(
            "{} WHERE organization_id = ? ORDER BY created_at DESC, id LIMIT ? OFFSET ?",
            SELECT_EMPLOYEE
        ))
        .bind(organization_id.to_string())
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&mut *self.conn)
        .await
        .context("Failed to list employees")?;

        Ok((
            rows.into_iter().map(row_to_employee).collect(),
            total.max(0) as u64,
        ))
    }

    /// Persist mutable account fields, including organization membership
    pub async fn update(&mut self, employee: &Employee) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE employees
            SET organization_id = ?, full_name = ?, password_hash = ?, is_verified = ?,
                verified_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(employee.organization_id.map(|id| id.to_string()))
        .bind(&employee.full_name)
        .bind(&employee.password_hash)
        .bind(employee.is_verified)
        .bind(employee.verified_at.as_ref().map(format_timestamp))
        .bind(format_timestamp(&employee.updated_at))
        .bind(employee.id.to_string())
        .execute(&mut *self.conn)
        .await
        .context("Failed to update employee")?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_employee(row: EmployeeRow) -> Employee {
    Employee {
        id: parse_uuid(&row.id),
        organization_id: parse_optional_uuid(row.organization_id.as_deref()),
        email: row.email,
        full_name: row.full_name,
        password_hash: row.password_hash,
        is_verified: row.is_verified,
        verified_at: parse_optional_timestamp(row.verified_at.as_deref()),
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    }
}
