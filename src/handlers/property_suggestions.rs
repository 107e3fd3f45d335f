//! Suggestion workflow
//!
//! Employees propose a batch of item changes. The organization admin either
//! accepts it, which replays the batch through the item functions and marks the
//! suggestion approved inside one transaction, or declines it with optional
//! feedback. Both decisions are a compare-and-swap on the suggestion version.

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;
use validator::ValidationErrors;

use super::{
    property_items::{create_items, delete_items, update_items},
    Command, HandlerContext, Query,
};
use crate::{
    config::AppConfig,
    db::{PropertySuggestionRepository, SuggestionFilter},
    middleware::AuthUser,
    models::{
        DeclineSuggestionRequest, Paginated, Pagination, PropertySuggestion, SuggestionListQuery,
        SuggestionPayload,
    },
    services::identity::{self, Actor, PropertyScope},
    utils::{validation::field_error, AppError, AppResult},
};

async fn load_suggestion(
    ctx: &mut HandlerContext<'_>,
    scope: &PropertyScope,
    id: Uuid,
) -> AppResult<PropertySuggestion> {
    PropertySuggestionRepository::new(&mut *ctx.conn)
        .get(scope.property.id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Suggestion not found"))
}

/// Employees only see their own suggestions
fn ensure_visible(scope: &PropertyScope, suggestion: &PropertySuggestion) -> AppResult<()> {
    match &scope.actor {
        Actor::Admin(_) => Ok(()),
        Actor::Employee(employee) if suggestion.is_proposed_by(employee.id) => Ok(()),
        Actor::Employee(_) => Err(AppError::unauthorized(
            "Suggestion was proposed by another employee",
        )),
    }
}

pub struct CreateSuggestion {
    pub user: AuthUser,
    pub payload: SuggestionPayload,
}

#[async_trait]
impl Command for CreateSuggestion {
    type Output = PropertySuggestion;

    fn validate(&self, config: &AppConfig) -> Result<(), ValidationErrors> {
        self.payload
            .validate_batch(config.suggestions.max_items_per_request)
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<PropertySuggestion> {
        let scope = identity::property_scope(&mut *ctx.conn, &self.user).await?;
        let employee = scope.require_employee()?;

        let suggestion = PropertySuggestion::new(scope.property.id, employee.id, self.payload);
        PropertySuggestionRepository::new(&mut *ctx.conn)
            .create(&suggestion)
            .await?;

        info!(
            suggestion_id = %suggestion.id,
            request_type = suggestion.payload.request_type().as_str(),
            entries = suggestion.payload.len(),
            "Suggestion created"
        );
        Ok(suggestion)
    }
}

pub struct AcceptSuggestion {
    pub user: AuthUser,
    pub suggestion_id: Uuid,
}

#[async_trait]
impl Command for AcceptSuggestion {
    type Output = PropertySuggestion;

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<PropertySuggestion> {
        let scope = identity::admin_property_scope(&mut *ctx.conn, &self.user).await?;
        let mut suggestion = load_suggestion(ctx, &scope, self.suggestion_id).await?;
        let expected_version = suggestion.version;
        suggestion.approve()?;

        // A failing replay aborts the transaction and leaves the suggestion pending
        match &suggestion.payload {
            SuggestionPayload::Create(items) => {
                create_items(&mut *ctx.conn, &scope.property, items).await?;
            }
            SuggestionPayload::Update(items) => {
                update_items(&mut *ctx.conn, &scope.property, items).await?;
            }
            SuggestionPayload::Delete(ids) => {
                delete_items(&mut *ctx.conn, &scope.property, ids).await?;
            }
        }

        let transitioned = PropertySuggestionRepository::new(&mut *ctx.conn)
            .transition(&suggestion, expected_version)
            .await?;
        if !transitioned {
            warn!(suggestion_id = %suggestion.id, "Suggestion changed during acceptance");
            return Err(AppError::conflict(
                "Suggestion was decided by another request",
            ));
        }
        suggestion.version = expected_version + 1;

        info!(
            suggestion_id = %suggestion.id,
            request_type = suggestion.payload.request_type().as_str(),
            "Suggestion approved"
        );
        Ok(suggestion)
    }
}

pub struct DeclineSuggestion {
    pub user: AuthUser,
    pub suggestion_id: Uuid,
    pub request: DeclineSuggestionRequest,
}

#[async_trait]
impl Command for DeclineSuggestion {
    type Output = PropertySuggestion;

    fn validate(&self, config: &AppConfig) -> Result<(), ValidationErrors> {
        let max = config.suggestions.feedback_max_length;
        match &self.request.feedback {
            Some(feedback) if feedback.chars().count() > max => Err(field_error(
                "feedback",
                "length",
                format!("must be at most {} characters", max),
            )),
            _ => Ok(()),
        }
    }

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<PropertySuggestion> {
        let scope = identity::admin_property_scope(&mut *ctx.conn, &self.user).await?;
        let mut suggestion = load_suggestion(ctx, &scope, self.suggestion_id).await?;
        let expected_version = suggestion.version;

        let feedback = self
            .request
            .feedback
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());
        suggestion.decline(feedback)?;

        let transitioned = PropertySuggestionRepository::new(&mut *ctx.conn)
            .transition(&suggestion, expected_version)
            .await?;
        if !transitioned {
            return Err(AppError::conflict(
                "Suggestion was decided by another request",
            ));
        }
        suggestion.version = expected_version + 1;

        info!(suggestion_id = %suggestion.id, "Suggestion declined");
        Ok(suggestion)
    }
}

pub struct DeleteSuggestion {
    pub user: AuthUser,
    pub suggestion_id: Uuid,
}

#[async_trait]
impl Command for DeleteSuggestion {
    type Output = ();

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<()> {
        let scope = identity::property_scope(&mut *ctx.conn, &self.user).await?;
        let suggestion = load_suggestion(ctx, &scope, self.suggestion_id).await?;

        if let Actor::Employee(employee) = &scope.actor {
            if !suggestion.can_be_deleted_by_employee(employee.id) {
                return Err(AppError::unauthorized(
                    "Employees may only delete their own suggestions that are not approved",
                ));
            }
        }

        PropertySuggestionRepository::new(&mut *ctx.conn)
            .delete(scope.property.id, suggestion.id)
            .await?;
        info!(suggestion_id = %suggestion.id, "Suggestion deleted");
        Ok(())
    }
}

pub struct GetSuggestion {
    pub user: AuthUser,
    pub suggestion_id: Uuid,
}

#[async_trait]
impl Query for GetSuggestion {
    type Output = PropertySuggestion;

    async fn handle(self, ctx: &mut HandlerContext<'_>) -> AppResult<PropertySuggestion> {
        let scope = identity::property_scope(&mut *ctx.conn, &self.user).await?;
        let suggestion = load_suggestion(ctx, &scope, self.suggestion_id).await?;
        ensure_visible(&scope, &suggestion)?;
        Ok(suggestion)
    }
}

pub struct ListSuggestions {
    pub user: AuthUser,
    pub query: SuggestionListQuery,
}

#[async_trait]
impl Query for ListSuggestions {
    type Output = Paginated<PropertySuggestion>;

    async fn handle(
        self,
        ctx: &mut HandlerContext<'_>,
    ) -> AppResult<Paginated<PropertySuggestion>> {
        let scope = identity::property_scope(&mut *ctx.conn, &self.user).await?;
        let filter = SuggestionFilter {
            employee_id: match &scope.actor {
                Actor::Admin(_) => None,
                Actor::Employee(employee) => Some(employee.id),
            },
            status: self.query.status,
        };
        let pagination = Pagination::new(self.query.page, self.query.page_size);

        let (suggestions, total) = PropertySuggestionRepository::new(&mut *ctx.conn)
            .list(scope.property.id, &filter, pagination)
            .await?;
        Ok(Paginated::new(suggestions, total, pagination))
    }
}
