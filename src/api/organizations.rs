//! Organization (tenant) API endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use super::extract::ApiJson;
use crate::{
    handlers::{
        employees::LeaveOrganization,
        organizations::{
            CreateOrganization, DeleteOrganization, GetOrganization, UpdateOrganization,
        },
    },
    middleware::AuthUser,
    models::{
        AccountProfile, CreateOrganizationRequest, Organization, UpdateOrganizationRequest,
    },
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organization",
            get(get_organization)
                .post(create_organization)
                .put(update_organization)
                .delete(delete_organization),
        )
        .route("/organization/leave", post(leave_organization))
}

async fn create_organization(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<Organization>), AppError> {
    let organization = state
        .mediator
        .send(CreateOrganization { user, request })
        .await?;
    Ok((StatusCode::CREATED, Json(organization)))
}

async fn get_organization(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Organization>, AppError> {
    Ok(Json(state.mediator.query(GetOrganization { user }).await?))
}

async fn update_organization(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<UpdateOrganizationRequest>,
) -> Result<Json<Organization>, AppError> {
    let organization = state
        .mediator
        .send(UpdateOrganization { user, request })
        .await?;
    Ok(Json(organization))
}

async fn delete_organization(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<StatusCode, AppError> {
    state.mediator.send(DeleteOrganization { user }).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn leave_organization(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<AccountProfile>, AppError> {
    Ok(Json(state.mediator.send(LeaveOrganization { user }).await?))
}
