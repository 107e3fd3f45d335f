//! Organization invitation repository

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::models::{invitation_expires_at, InvitationView, OrganizationInvitation};

#[derive(Debug, FromRow)]
struct InvitationRow {
    id: String,
    organization_id: String,
    employee_id: String,
    created_at: String,
}

#[derive(Debug, FromRow)]
struct InvitationViewRow {
    id: String,
    organization_id: String,
    organization_name: String,
    employee_id: String,
    employee_email: String,
    created_at: String,
}

const SELECT_VIEW: &str = r#"
    SELECT i.id, i.organization_id, o.name AS organization_name,
           i.employee_id, e.email AS employee_email, i.created_at
    FROM organization_invitations i
    JOIN organizations o ON o.id = i.organization_id
    JOIN employees e ON e.id = i.employee_id
"#;

pub struct InvitationRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> InvitationRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, invitation: &OrganizationInvitation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO organization_invitations (id, organization_id, employee_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(invitation.id.to_string())
        .bind(invitation.organization_id.to_string())
        .bind(invitation.employee_id.to_string())
        .bind(format_timestamp(&invitation.created_at))
        .execute(&mut *self.conn)
        .await
        .context("Failed to create invitation")?;

        Ok(())
    }

    pub async fn get_by_id(&mut self, id: Uuid) -> Result<Option<OrganizationInvitation>> {
        let row = sqlx::query_as::<_, InvitationRow>(
            r#"
            SELECT id, organization_id, employee_id, created_at
            FROM organization_invitations
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&mut *self.conn)
        .await
        .context("Failed to get invitation")?;

        Ok(row.map(row_to_invitation))
    }

    pub async fn exists(&mut self, organization_id: Uuid, employee_id: Uuid) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM organization_invitations WHERE organization_id = ? AND employee_id = ?",
        )
        .bind(organization_id.to_string())
        .bind(employee_id.to_string())
        .fetch_one(&mut *self.conn)
        .await
        .context("Failed to check invitation")?;

        Ok(count > 0)
    }

    pub async fn list_by_organization(
        &mut self,
        organization_id: Uuid,
        expiry_days: i64,
    ) -> Result<Vec<InvitationView>> {
        let rows = sqlx::query_as::<_, InvitationViewRow>(&format!(
            "{} WHERE i.organization_id = ? ORDER BY i.created_at DESC",
            SELECT_VIEW
        ))
        .bind(organization_id.to_string())
        .fetch_all(&mut *self.conn)
        .await
        .context("Failed to list organization invitations")?;

        Ok(rows.into_iter().map(|r| row_to_view(r, expiry_days)).collect())
    }

    pub async fn list_by_employee(
        &mut self,
        employee_id: Uuid,
        expiry_days: i64,
    ) -> Result<Vec<InvitationView>> {
        let rows = sqlx::query_as::<_, InvitationViewRow>(&format!(
            "{} WHERE i.employee_id = ? ORDER BY i.created_at DESC",
            SELECT_VIEW
        ))
        .bind(employee_id.to_string())
        .fetch_all(&mut *self.conn)
        .await
        .context("Failed to list employee invitations")?;

        Ok(rows.into_iter().map(|r| row_to_view(r, expiry_days)).collect())
    }

    pub async fn delete(&mut self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM organization_invitations WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *self.conn)
            .await
            .context("Failed to delete invitation")?;

        Ok(result.rows_affected() > 0)
    }

    /// Drop every invitation addressed to an employee
    pub async fn delete_for_employee(&mut self, employee_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM organization_invitations WHERE employee_id = ?")
            .bind(employee_id.to_string())
            .execute(&mut *self.conn)
            .await
            .context("Failed to delete employee invitations")?;

        Ok(result.rows_affected())
    }

    /// Delete invitations created before `cutoff`
    pub async fn delete_created_before(&mut self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM organization_invitations WHERE created_at < ?")
            .bind(format_timestamp(&cutoff))
            .execute(&mut *self.conn)
            .await
            .context("Failed to delete expired invitations")?;

        Ok(result.rows_affected())
    }
}

fn row_to_invitation(row: InvitationRow) -> OrganizationInvitation {
    OrganizationInvitation {
        id: parse_uuid(&row.id),
        organization_id: parse_uuid(&row.organization_id),
        employee_id: parse_uuid(&row.employee_id),
        created_at: parse_timestamp(&row.created_at),
    }
}

fn row_to_view(row: InvitationViewRow, expiry_days: i64) -> InvitationView {
    let created_at = parse_timestamp(&row.created_at);
    InvitationView {
        id: parse_uuid(&row.id),
        organization_id: parse_uuid(&row.organization_id),
        organization_name: row.organization_name,
        employee_id: parse_uuid(&row.employee_id),
        employee_email: row.employee_email,
        created_at,
        expires_at: invitation_expires_at(created_at, expiry_days),
    }
}
