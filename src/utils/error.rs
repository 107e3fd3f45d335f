//! Error types and handling
//!
//! Every handler returns [`AppResult`]. Errors are rendered as a problem-details
//! envelope `{status, type, title, detail, errors?, instance}`; the `instance`
//! field is filled in by `middleware::problem::problem_instance_middleware`.

use std::collections::BTreeMap;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid state, ownership or business-rule violation (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Role or ownership mismatch, bad credentials, wrong token purpose (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists or concurrent state change (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Structural / field-level failures, aggregated (400)
    #[error("Validation failed")]
    Validation(ValidationErrors),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(message.into())
    }

    /// HTTP status mirroring the error kind
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> (&'static str, &'static str) {
        match self {
            AppError::BadRequest(_) => ("bad_request", "Bad Request"),
            AppError::Unauthorized(_) => ("unauthorized", "Unauthorized"),
            AppError::NotFound(_) => ("not_found", "Not Found"),
            AppError::Conflict(_) => ("conflict", "Conflict"),
            AppError::Validation(_) => ("validation_error", "Validation Failed"),
            AppError::Database(_) => ("database_error", "Internal Server Error"),
            AppError::Internal(_) => ("internal_error", "Internal Server Error"),
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Validation(_) => "One or more fields are invalid".to_string(),
            // Do not leak storage details to clients
            AppError::Database(_) | AppError::Internal(_) => {
                "An unexpected error occurred".to_string()
            }
        }
    }

    /// Build a single-field validation error
    pub fn validation(field: &'static str, code: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation(super::validation::field_error(field, code, message))
    }
}

/// Problem-details error response body
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorResponse {
    pub status: u16,
    #[serde(rename = "type")]
    pub error_type: String,
    pub title: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl ErrorResponse {
    pub fn new(
        status: StatusCode,
        error_type: impl Into<String>,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status: status.as_u16(),
            error_type: error_type.into(),
            title: title.into(),
            detail: detail.into(),
            errors: None,
            instance: None,
        }
    }

    pub fn with_errors(mut self, errors: BTreeMap<String, Vec<String>>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let (error_type, title) = err.kind();
        let response = ErrorResponse::new(err.status_code(), error_type, title, err.detail());
        match err {
            AppError::Validation(errors) => response.with_errors(flatten_validation_errors(errors)),
            _ => response,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status_code().is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = ErrorResponse::from(&self);
        let mut response = (self.status_code(), Json(body.clone())).into_response();
        // Picked up by the problem-instance middleware to stamp the request path
        response.extensions_mut().insert(body);
        response
    }
}

/// Flatten nested validator errors into `path -> messages`.
///
/// Nested struct fields are joined with `.`, list entries with `[i]`.
pub fn flatten_validation_errors(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    let mut out = BTreeMap::new();
    collect_validation_errors(errors, String::new(), &mut out);
    out
}

fn collect_validation_errors(
    errors: &ValidationErrors,
    prefix: String,
    out: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = out.entry(path).or_insert_with(Vec::new);
                for e in field_errors {
                    messages.push(
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string()),
                    );
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_validation_errors(inner, path, out),
            ValidationErrorsKind::List(entries) => {
                for (index, inner) in entries {
                    collect_validation_errors(inner, format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Repositories wrap sqlx errors in anyhow context; keep their meaning
        match err.downcast::<sqlx::Error>() {
            Ok(sqlx_err) => sqlx_err.into(),
            Err(err) => AppError::Internal(format!("{:#}", err)),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation()
                    || db_err.message().contains("UNIQUE constraint failed")
                {
                    AppError::Conflict("Resource already exists".to_string())
                } else if db_err.is_foreign_key_violation() {
                    AppError::BadRequest("Referenced resource does not exist".to_string())
                } else if is_lock_contention(db_err.code().as_deref(), db_err.message()) {
                    AppError::Conflict("Concurrent update in progress, retry the request".to_string())
                } else {
                    AppError::Database(db_err.to_string())
                }
            }
            _ => AppError::Database(err.to_string()),
        }
    }
}

/// SQLite BUSY/LOCKED, including extended codes such as BUSY_SNAPSHOT
fn is_lock_contention(code: Option<&str>, message: &str) -> bool {
    let primary = code
        .and_then(|c| c.parse::<i32>().ok())
        .map(|c| c & 0xff);
    matches!(primary, Some(5) | Some(6)) || message.contains("database is locked")
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::Validation(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
