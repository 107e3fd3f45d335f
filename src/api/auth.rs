//! Authentication API endpoints
//!
//! Registration, login, token refresh, email verification and password
//! recovery. All routes here are public and rate limited per client IP.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use super::extract::ApiJson;
use crate::{
    handlers::auth::{
        Login, RefreshToken, RegisterAdmin, RegisterEmployee, RequestPasswordRecovery,
        ResendVerification, ResetPassword, VerifyEmail,
    },
    models::{
        AccountProfile, AuthResponse, EmailRequest, LoginRequest, MessageResponse,
        RefreshTokenRequest, RegisterRequest, ResetPasswordRequest, TokenResponse,
        VerifyEmailRequest,
    },
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/admins/register", post(register_admin))
        .route("/auth/employees/register", post(register_employee))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh_token))
        .route("/auth/verify-email", post(verify_email))
        .route("/auth/resend-verification", post(resend_verification))
        .route("/auth/recover-password", post(recover_password))
        .route("/auth/reset-password", post(reset_password))
}

/// POST /api/v1/auth/admins/register
async fn register_admin(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountProfile>), AppError> {
    let profile = state.mediator.send(RegisterAdmin { request }).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// POST /api/v1/auth/employees/register
async fn register_employee(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountProfile>), AppError> {
    let profile = state.mediator.send(RegisterEmployee { request }).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    Ok(Json(state.mediator.query(Login { request }).await?))
}

/// POST /api/v1/auth/refresh
async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let response = state
        .mediator
        .query(RefreshToken {
            refresh_token: request.refresh_token,
        })
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/verify-email
async fn verify_email(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyEmailRequest>,
) -> Result<Json<AccountProfile>, AppError> {
    let profile = state
        .mediator
        .send(VerifyEmail {
            token: request.token,
        })
        .await?;
    Ok(Json(profile))
}

/// POST /api/v1/auth/resend-verification
///
/// Always answers the same way so callers cannot tell which accounts exist.
async fn resend_verification(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .mediator
        .query(ResendVerification {
            email: request.email,
        })
        .await?;
    Ok(Json(MessageResponse::new(
        "If the account exists and is not verified, a verification email has been sent",
    )))
}

/// POST /api/v1/auth/recover-password
async fn recover_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .mediator
        .query(RequestPasswordRecovery {
            email: request.email,
        })
        .await?;
    Ok(Json(MessageResponse::new(
        "If the account exists, a password recovery email has been sent",
    )))
}

/// POST /api/v1/auth/reset-password
async fn reset_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.mediator.send(ResetPassword { request }).await?;
    Ok(Json(MessageResponse::new("Password has been reset")))
}
