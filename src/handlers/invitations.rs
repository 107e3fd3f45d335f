//! Organization invitations

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use super::{Command, HandlerContext, Query};
use crate::{
    config::AppConfig,
    db::{EmployeeRepository, InvitationRepository, OrganizationRepository},
    middleware::AuthUser,
    models::{
        InvitationView, InviteEmployeeRequest, Organization, OrganizationInvitation,
    },
    services::{
        identity::{self, Actor},
        mailer::{MailKind, MailMessage},
    },
    utils::{validation::normalize_email, AppError, AppResult},
};

pub struct InviteEmployee {
    pub user: AuthUser,
    pub request: InviteEmployeeRequest,
}

#[async_trait]
impl Command for InviteEmployee {
    type Output = InvitationView;

    fn validate(&self, _config: &AppConfig) -> Result<(), ValidationErrors> {
        self.request.validate()
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<InvitationView> {
        let (_, organization) = identity::admin_organization(&mut *ctx.conn, &self.user).await?;

        let email = normalize_email(&self.request.email);
        let employee = EmployeeRepository::new(&mut *ctx.conn)
            .get_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("No employee account with that email"))?;
        if employee.organization_id.is_some() {
            return Err(AppError::conflict(
                "Employee already belongs to an organization",
            ));
        }

        let mut repo = InvitationRepository::new(&mut *ctx.conn);
        if repo.exists(organization.id, employee.id).await? {
            return Err(AppError::conflict("Employee has already been invited"));
        }
        let invitation = OrganizationInvitation::new(organization.id, employee.id);
        repo.create(&invitation).await?;

        ctx.mailer
            .send(MailMessage {
                to: employee.email.clone(),
                kind: MailKind::Invitation,
                subject: format!("You have been invited to join {}", organization.name),
                token: None,
            })
            .await?;

        info!(
            invitation_id = %invitation.id,
            organization_id = %organization.id,
            employee_id = %employee.id,
            "Employee invited"
        );
        Ok(InvitationView {
            id: invitation.id,
            organization_id: organization.id,
            organization_name: organization.name,
            employee_id: employee.id,
            employee_email: employee.email,
            created_at: invitation.created_at,
            expires_at: invitation.expires_at(ctx.config.cleanup.invitation_expiry_days),
        })
    }
}

/// Admins see invitations sent by their organization, employees the ones
/// addressed to them
pub struct ListInvitations {
    pub user: AuthUser,
}

#[async_trait]
impl Query for ListInvitations {
    type Output = Vec<InvitationView>;

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<Vec<InvitationView>> {
        let expiry_days = ctx.config.cleanup.invitation_expiry_days;
        let invitations = match identity::load_actor(&mut *ctx.conn, &self.user).await? {
            Actor::Admin(_) => {
                let (_, organization) =
                    identity::admin_organization(&mut *ctx.conn, &self.user).await?;
                InvitationRepository::new(&mut *ctx.conn)
                    .list_by_organization(organization.id, expiry_days)
                    .await?
            }
            Actor::Employee(employee) => {
                InvitationRepository::new(&mut *ctx.conn)
                    .list_by_employee(employee.id, expiry_days)
                    .await?
            }
        };
        Ok(invitations)
    }
}

async fn load_own_invitation(
    ctx: &mut HandlerContext<'_>,
    employee_id: Uuid,
    invitation_id: Uuid,
) -> AppResult<OrganizationInvitation> {
    let invitation = InvitationRepository::new(&mut *ctx.conn)
        .get_by_id(invitation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Invitation not found"))?;
    if invitation.employee_id != employee_id {
        return Err(AppError::unauthorized(
            "Invitation is addressed to another employee",
        ));
    }
    Ok(invitation)
}

/// Join the inviting organization. All other pending invitations of the
/// employee are dropped.
pub struct AcceptInvitation {
    pub user: AuthUser,
    pub invitation_id: Uuid,
}

#[async_trait]
impl Command for AcceptInvitation {
    type Output = Organization;

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<Organization> {
        let mut employee = identity::load_employee(&mut *ctx.conn, &self.user).await?;
        let invitation = load_own_invitation(ctx, employee.id, self.invitation_id).await?;

        if invitation.is_expired(Utc::now(), ctx.config.cleanup.invitation_expiry_days) {
            return Err(AppError::bad_request("Invitation has expired"));
        }
        let organization = OrganizationRepository::new(&mut *ctx.conn)
            .get_by_id(invitation.organization_id)
            .await?
            .ok_or_else(|| AppError::not_found("Organization not found"))?;

        employee.assign_organization(organization.id)?;
        EmployeeRepository::new(&mut *ctx.conn)
            .update(&employee)
            .await?;
        let dropped = InvitationRepository::new(&mut *ctx.conn)
            .delete_for_employee(employee.id)
            .await?;

        info!(
            employee_id = %employee.id,
            organization_id = %organization.id,
            dropped_invitations = dropped,
            "Invitation accepted"
        );
        Ok(organization)
    }
}

pub struct DeclineInvitation {
    pub user: AuthUser,
    pub invitation_id: Uuid,
}

#[async_trait]
impl Command for DeclineInvitation {
    type Output = ();

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<()> {
        let employee = identity::load_employee(&mut *ctx.conn, &self.user).await?;
        let invitation = load_own_invitation(ctx, employee.id, self.invitation_id).await?;
        InvitationRepository::new(&mut *ctx.conn)
            .delete(invitation.id)
            .await?;
        Ok(())
    }
}

pub struct CancelInvitation {
    pub user: AuthUser,
    pub invitation_id: Uuid,
}

#[async_trait]
impl Command for CancelInvitation {
    type Output = ();

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<()> {
        let (_, organization) = identity::admin_organization(&mut *ctx.conn, &self.user).await?;
        let mut repo = InvitationRepository::new(&mut *ctx.conn);
        let invitation = repo
            .get_by_id(self.invitation_id)
            .await?
            .filter(|invitation| invitation.organization_id == organization.id)
            .ok_or_else(|| AppError::not_found("Invitation not found"))?;

        repo.delete(invitation.id).await?;
        info!(invitation_id = %invitation.id, "Invitation cancelled");
        Ok(())
    }
}
