//! Suggestion workflow endpoints
//!
//! Employees propose (`POST`), admins accept or decline. The request body of a
//! proposal is `{"request_type": "create" | "update" | "delete", "request_body": [...]}`.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::{
    handlers::property_suggestions::{
        AcceptSuggestion, CreateSuggestion, DeclineSuggestion, DeleteSuggestion, GetSuggestion,
        ListSuggestions,
    },
    middleware::AuthUser,
    models::{
        DeclineSuggestionRequest, Paginated, PropertySuggestion, SuggestionListQuery,
        SuggestionPayload,
    },
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/property/suggestions",
            get(list_suggestions).post(create_suggestion),
        )
        .route(
            "/property/suggestions/{id}",
            get(get_suggestion).delete(delete_suggestion),
        )
        .route("/property/suggestions/{id}/accept", post(accept_suggestion))
        .route(
            "/property/suggestions/{id}/decline",
            post(decline_suggestion),
        )
}

async fn create_suggestion(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<SuggestionPayload>,
) -> Result<(StatusCode, Json<PropertySuggestion>), AppError> {
    let suggestion = state
        .mediator
        .send(CreateSuggestion { user, payload })
        .await?;
    Ok((StatusCode::CREATED, Json(suggestion)))
}

async fn list_suggestions(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<SuggestionListQuery>,
) -> Result<Json<Paginated<PropertySuggestion>>, AppError> {
    Ok(Json(
        state.mediator.query(ListSuggestions { user, query }).await?,
    ))
}

async fn get_suggestion(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(suggestion_id): ApiPath<Uuid>,
) -> Result<Json<PropertySuggestion>, AppError> {
    let suggestion = state
        .mediator
        .query(GetSuggestion {
            user,
            suggestion_id,
        })
        .await?;
    Ok(Json(suggestion))
}

async fn delete_suggestion(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(suggestion_id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .mediator
        .send(DeleteSuggestion {
            user,
            suggestion_id,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn accept_suggestion(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(suggestion_id): ApiPath<Uuid>,
) -> Result<Json<PropertySuggestion>, AppError> {
    let suggestion = state
        .mediator
        .send(AcceptSuggestion {
            user,
            suggestion_id,
        })
        .await?;
    Ok(Json(suggestion))
}

/// The body is optional; an empty request declines without feedback
async fn decline_suggestion(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(suggestion_id): ApiPath<Uuid>,
    body: Bytes,
) -> Result<Json<PropertySuggestion>, AppError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        DeclineSuggestionRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::bad_request(format!("Invalid decline request: {e}")))?
    };
    let suggestion = state
        .mediator
        .send(DeclineSuggestion {
            user,
            suggestion_id,
            request,
        })
        .await?;
    Ok(Json(suggestion))
}
