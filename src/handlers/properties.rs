//! The organization's property

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;
use validator::{Validate, ValidationErrors};

use super::{Command, HandlerContext, Query};
use crate::{
    config::AppConfig,
    db::PropertyRepository,
    middleware::AuthUser,
    models::{CreatePropertyRequest, Property, UpdatePropertyRequest},
    services::identity,
    utils::{AppError, AppResult},
};

pub struct CreateProperty {
    pub user: AuthUser,
    pub request: CreatePropertyRequest,
}

#[async_trait]
impl Command for CreateProperty {
    type Output = Property;

    fn validate(&self, _config: &AppConfig) -> Result<(), ValidationErrors> {
        self.request.validate()
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<Property> {
        let (_, organization) = identity::admin_organization(&mut *ctx.conn, &self.user).await?;
        let mut repo = PropertyRepository::new(&mut *ctx.conn);
        if repo.get_by_organization(organization.id).await?.is_some() {
            return Err(AppError::conflict("Organization already has a property"));
        }

        let property = Property::new(
            organization.id,
            self.request.name.trim().to_string(),
            self.request.description,
        );
        repo.create(&property).await?;

        info!(property_id = %property.id, organization_id = %organization.id, "Property created");
        Ok(property)
    }
}

pub struct GetProperty {
    pub user: AuthUser,
}

#[async_trait]
impl Query for GetProperty {
    type Output = Property;

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<Property> {
        let scope = identity::property_scope(&mut *ctx.conn, &self.user).await?;
        Ok(scope.property)
    }
}

pub struct UpdateProperty {
    pub user: AuthUser,
    pub request: UpdatePropertyRequest,
}

#[async_trait]
impl Command for UpdateProperty {
    type Output = Property;

    fn validate(&self, _config: &AppConfig) -> Result<(), ValidationErrors> {
        self.request.validate()
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<Property> {
        let mut property = identity::admin_property_scope(&mut *ctx.conn, &self.user)
            .await?
            .property;

        if let Some(name) = self.request.name {
            property.name = name.trim().to_string();
        }
        if self.request.description.is_some() {
            property.description = self.request.description;
        }
        property.updated_at = Utc::now();

        PropertyRepository::new(&mut *ctx.conn)
            .update(&property)
            .await?;
        Ok(property)
    }
}

/// Removes the property with its items, scans and suggestions
pub struct DeleteProperty {
    pub user: AuthUser,
}

#[async_trait]
impl Command for DeleteProperty {
    type Output = ();

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<()> {
        let scope = identity::admin_property_scope(&mut *ctx.conn, &self.user).await?;
        PropertyRepository::new(&mut *ctx.conn)
            .delete(scope.property.id)
            .await?;

        info!(property_id = %scope.property.id, "Property deleted");
        Ok(())
    }
}
