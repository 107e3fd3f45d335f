//! The caller's own account

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use super::extract::ApiJson;
use crate::{
    handlers::auth::{ChangePassword, GetProfile, UpdateProfile},
    middleware::AuthUser,
    models::{AccountProfile, ChangePasswordRequest, MessageResponse, UpdateProfileRequest},
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_profile).put(update_profile))
        .route("/me/password", post(change_password))
}

async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<AccountProfile>, AppError> {
    Ok(Json(state.mediator.query(GetProfile { user }).await?))
}

async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<AccountProfile>, AppError> {
    Ok(Json(
        state.mediator.send(UpdateProfile { user, request }).await?,
    ))
}

async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.mediator.send(ChangePassword { user, request }).await?;
    Ok(Json(MessageResponse::new("Password changed")))
}
