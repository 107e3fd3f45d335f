//! Middleware components
//!
//! - Authentication (purpose-scoped JWT)
//! - Rate limiting of the public auth endpoints
//! - Problem-details `instance` stamping

pub mod auth;
pub mod problem;
pub mod rate_limit;

pub use auth::{auth_middleware, AuthUser, Claims};
pub use problem::problem_instance_middleware;
pub use rate_limit::{rate_limit_middleware, spawn_rate_limit_cleanup, RateLimitState};
