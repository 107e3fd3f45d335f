//! Organization member endpoints (admin)

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use uuid::Uuid;

use super::extract::{ApiPath, ApiQuery};
use crate::{
    handlers::employees::{ListEmployees, RemoveEmployee},
    middleware::AuthUser,
    models::{AccountProfile, PageQuery, Paginated},
    utils::AppError,
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/organization/employees", get(list_employees))
        .route("/organization/employees/{id}", delete(remove_employee))
}

async fn list_employees(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<Json<Paginated<AccountProfile>>, AppError> {
    Ok(Json(
        state.mediator.query(ListEmployees { user, page }).await?,
    ))
}

async fn remove_employee(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(employee_id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .mediator
        .send(RemoveEmployee { user, employee_id })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
