//! API routes and handlers
//!
//! Every endpoint lives under `/api/v1`. Route modules register full paths and
//! are merged rather than nested.

use std::time::Duration;

use axum::{http::StatusCode, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{middleware, AppState};

mod account;
mod auth;
mod employees;
mod extract;
mod health;
mod invitations;
mod items;
mod organizations;
mod properties;
mod scans;
mod suggestions;

pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use health::{ComponentStatus, HealthResponse, ReadinessResponse};

/// Public API routes (no authentication required)
pub fn public_routes() -> Router<AppState> {
    Router::new().merge(health::routes())
}

/// Authentication endpoints; rate limited per client IP in [`create_router`]
pub fn auth_routes() -> Router<AppState> {
    auth::routes()
}

/// Protected API routes (access token required)
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .merge(account::routes())
        .merge(organizations::routes())
        .merge(invitations::routes())
        .merge(employees::routes())
        .merge(properties::routes())
        .merge(items::routes())
        .merge(scans::routes())
        .merge(suggestions::routes())
}

/// Build the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Authentication is applied to protected routes only; public and auth
    // endpoints stay reachable without a token.
    let api = Router::new()
        .merge(public_routes())
        .merge(auth_routes().layer(axum::middleware::from_fn_with_state(
            state.rate_limit.clone(),
            middleware::rate_limit_middleware,
        )))
        .merge(
            protected_routes().layer(axum::middleware::from_fn_with_state(
                state.clone(),
                middleware::auth_middleware,
            )),
        );

    let router = Router::new()
        .nest("/api/v1", api)
        .with_state(state.clone())
        .layer(axum::middleware::from_fn(
            middleware::problem_instance_middleware,
        ));

    let router = match state.config.server.request_timeout_secs {
        Some(secs) if secs > 0 => router.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(secs),
        )),
        _ => router,
    };

    router
        .layer(CompressionLayer::new())
        .layer(trace_layer)
        .layer(cors)
}
