//! Property Inventory Library
//!
//! Multi-tenant property inventory backend: organizations, their employees,
//! a single property per organization with its items, scan campaigns and the
//! employee suggestion workflow.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

pub use config::AppConfig;
pub use db::DbPool;
pub use handlers::Mediator;
pub use middleware::{auth_middleware, AuthUser, Claims, RateLimitState};
use services::Mailer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Database connection pool
    pub db: DbPool,
    /// Dispatches commands and queries inside a database scope
    pub mediator: Mediator,
    /// Per-IP limiter for the authentication endpoints
    pub rate_limit: RateLimitState,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool, mailer: Arc<dyn Mailer>) -> Self {
        let config = Arc::new(config);
        let rate_limit = RateLimitState::new(config.rate_limit.clone());
        let mediator = Mediator::new(db.clone(), config.clone(), mailer);

        Self {
            config,
            db,
            mediator,
            rate_limit,
        }
    }
}
