//! Property endpoints

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use super::extract::ApiJson;
use crate::{
    handlers::properties::{CreateProperty, DeleteProperty, GetProperty, UpdateProperty},
    middleware::AuthUser,
    models::{CreatePropertyRequest, Property, UpdatePropertyRequest},
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/property",
        get(get_property)
            .post(create_property)
            .put(update_property)
            .delete(delete_property),
    )
}

async fn create_property(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<Property>), AppError> {
    let property = state.mediator.send(CreateProperty { user, request }).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

async fn get_property(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Property>, AppError> {
    Ok(Json(state.mediator.query(GetProperty { user }).await?))
}

async fn update_property(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<UpdatePropertyRequest>,
) -> Result<Json<Property>, AppError> {
    Ok(Json(
        state.mediator.send(UpdateProperty { user, request }).await?,
    ))
}

async fn delete_property(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<StatusCode, AppError> {
    state.mediator.send(DeleteProperty { user }).await?;
    Ok(StatusCode::NO_CONTENT)
}
