//! Property item endpoints
//!
//! Writes take a JSON array and are applied as one batch; any failing entry
//! rolls the whole batch back.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::{
    handlers::property_items::{CreateItems, DeleteItems, GetItem, ListItems, UpdateItems},
    middleware::AuthUser,
    models::{
        CreatePropertyItemRequest, ItemListQuery, Paginated, PropertyItem,
        UpdatePropertyItemRequest,
    },
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/property/items",
            get(list_items)
                .post(create_items)
                .put(update_items)
                .delete(delete_items),
        )
        .route("/property/items/{id}", get(get_item))
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

async fn list_items(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ItemListQuery>,
) -> Result<Json<Paginated<PropertyItem>>, AppError> {
    Ok(Json(state.mediator.query(ListItems { user, query }).await?))
}

async fn get_item(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(item_id): ApiPath<Uuid>,
) -> Result<Json<PropertyItem>, AppError> {
    Ok(Json(state.mediator.query(GetItem { user, item_id }).await?))
}

async fn create_items(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(items): ApiJson<Vec<CreatePropertyItemRequest>>,
) -> Result<(StatusCode, Json<Vec<PropertyItem>>), AppError> {
    let created = state.mediator.send(CreateItems { user, items }).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_items(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(items): ApiJson<Vec<UpdatePropertyItemRequest>>,
) -> Result<Json<Vec<PropertyItem>>, AppError> {
    Ok(Json(state.mediator.send(UpdateItems { user, items }).await?))
}

async fn delete_items(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(ids): ApiJson<Vec<Uuid>>,
) -> Result<Json<DeletedResponse>, AppError> {
    let deleted = state.mediator.send(DeleteItems { user, ids }).await?;
    Ok(Json(DeletedResponse { deleted }))
}
