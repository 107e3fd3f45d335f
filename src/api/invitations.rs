//! Invitation endpoints
//!
//! Admins manage invitations under `/organization/invitations`; employees
//! answer the ones addressed to them under `/invitations`.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath};
use crate::{
    handlers::invitations::{
        AcceptInvitation, CancelInvitation, DeclineInvitation, InviteEmployee, ListInvitations,
    },
    middleware::AuthUser,
    models::{InvitationView, InviteEmployeeRequest, Organization},
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organization/invitations",
            get(list_invitations).post(invite_employee),
        )
        .route("/organization/invitations/{id}", delete(cancel_invitation))
        .route("/invitations", get(list_invitations))
        .route("/invitations/{id}/accept", post(accept_invitation))
        .route("/invitations/{id}/decline", post(decline_invitation))
}

async fn invite_employee(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<InviteEmployeeRequest>,
) -> Result<(StatusCode, Json<InvitationView>), AppError> {
    let invitation = state.mediator.send(InviteEmployee { user, request }).await?;
    Ok((StatusCode::CREATED, Json(invitation)))
}

async fn list_invitations(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<InvitationView>>, AppError> {
    Ok(Json(state.mediator.query(ListInvitations { user }).await?))
}

async fn cancel_invitation(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(invitation_id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .mediator
        .send(CancelInvitation {
            user,
            invitation_id,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn accept_invitation(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(invitation_id): ApiPath<Uuid>,
) -> Result<Json<Organization>, AppError> {
    let organization = state
        .mediator
        .send(AcceptInvitation {
            user,
            invitation_id,
        })
        .await?;
    Ok(Json(organization))
}

async fn decline_invitation(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(invitation_id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .mediator
        .send(DeclineInvitation {
            user,
            invitation_id,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
