//! Scan campaign endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::{
    handlers::property_scans::{
        CompleteScan, CreateScan, DeleteScan, GetScan, ListScans, ScanItem,
    },
    middleware::AuthUser,
    models::{CreateScanRequest, PageQuery, Paginated, PropertyItem, PropertyScan, ScanProgress},
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/property/scans", get(list_scans).post(create_scan))
        .route("/property/scans/{id}", get(get_scan).delete(delete_scan))
        .route("/property/scans/{id}/complete", post(complete_scan))
        .route("/property/scans/items/{item_id}", post(scan_item))
}

async fn create_scan(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<CreateScanRequest>,
) -> Result<(StatusCode, Json<ScanProgress>), AppError> {
    let scan = state.mediator.send(CreateScan { user, request }).await?;
    Ok((StatusCode::CREATED, Json(scan)))
}

async fn list_scans(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<Json<Paginated<PropertyScan>>, AppError> {
    Ok(Json(state.mediator.query(ListScans { user, page }).await?))
}

async fn get_scan(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(scan_id): ApiPath<Uuid>,
) -> Result<Json<ScanProgress>, AppError> {
    Ok(Json(state.mediator.query(GetScan { user, scan_id }).await?))
}

async fn delete_scan(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(scan_id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state.mediator.send(DeleteScan { user, scan_id }).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn complete_scan(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(scan_id): ApiPath<Uuid>,
) -> Result<Json<ScanProgress>, AppError> {
    Ok(Json(
        state.mediator.send(CompleteScan { user, scan_id }).await?,
    ))
}

async fn scan_item(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(item_id): ApiPath<Uuid>,
) -> Result<Json<PropertyItem>, AppError> {
    Ok(Json(state.mediator.send(ScanItem { user, item_id }).await?))
}
