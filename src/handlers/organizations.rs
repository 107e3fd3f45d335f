//! Organization aggregate

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;
use validator::{Validate, ValidationErrors};

use super::{Command, HandlerContext, Query};
use crate::{
    config::AppConfig,
    db::OrganizationRepository,
    middleware::AuthUser,
    models::{CreateOrganizationRequest, Organization, UpdateOrganizationRequest},
    services::identity,
    utils::{AppError, AppResult},
};

pub struct CreateOrganization {
    pub user: AuthUser,
    pub request: CreateOrganizationRequest,
}

#[async_trait]
impl Command for CreateOrganization {
    type Output = Organization;

    fn validate(&self, _config: &AppConfig) -> Result<(), ValidationErrors> {
        self.request.validate()
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<Organization> {
        let admin = identity::load_admin(&mut *ctx.conn, &self.user).await?;
        let mut repo = OrganizationRepository::new(&mut *ctx.conn);
        if repo.get_by_admin(admin.id).await?.is_some() {
            return Err(AppError::conflict("Admin already owns an organization"));
        }

        let organization = Organization::new(
            admin.id,
            self.request.name.trim().to_string(),
            self.request.description,
        );
        repo.create(&organization).await?;

        info!(organization_id = %organization.id, admin_id = %admin.id, "Organization created");
        Ok(organization)
    }
}

/// Visible to the owning admin and to member employees
pub struct GetOrganization {
    pub user: AuthUser,
}

#[async_trait]
impl Query for GetOrganization {
    type Output = Organization;

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<Organization> {
        let (_, organization) = identity::actor_organization(&mut *ctx.conn, &self.user).await?;
        Ok(organization)
    }
}

pub struct UpdateOrganization {
    pub user: AuthUser,
    pub request: UpdateOrganizationRequest,
}

#[async_trait]
impl Command for UpdateOrganization {
    type Output = Organization;

    fn validate(&self, _config: &AppConfig) -> Result<(), ValidationErrors> {
        self.request.validate()
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<Organization> {
        let (_, mut organization) =
            identity::admin_organization(&mut *ctx.conn, &self.user).await?;

        if let Some(name) = self.request.name {
            organization.name = name.trim().to_string();
        }
        if self.request.description.is_some() {
            organization.description = self.request.description;
        }
        organization.updated_at = Utc::now();

        OrganizationRepository::new(&mut *ctx.conn)
            .update(&organization)
            .await?;
        Ok(organization)
    }
}

/// Deleting cascades to the property, items, scans, suggestions and
/// invitations. Employees are detached.
pub struct DeleteOrganization {
    pub user: AuthUser,
}

#[async_trait]
impl Command for DeleteOrganization {
    type Output = ();

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<()> {
        let (admin, organization) =
            identity::admin_organization(&mut *ctx.conn, &self.user).await?;
        OrganizationRepository::new(&mut *ctx.conn)
            .delete(organization.id)
            .await?;

        info!(organization_id = %organization.id, admin_id = %admin.id, "Organization deleted");
        Ok(())
    }
}
