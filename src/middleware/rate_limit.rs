//! Rate limiting middleware
//!
//! Per-client-IP limiting of the public auth endpoints (login, registration,
//! password recovery) against credential stuffing. Uses the governor crate
//! with one direct limiter per IP.

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::DefaultClock,
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{config::RateLimitSettings, utils::ErrorResponse};

/// Tracked IPs above which half of the limiters are dropped
const MAX_TRACKED_IPS: usize = 10_000;

pub type IpRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Shared map of client IPs to their limiters
#[derive(Clone)]
pub struct RateLimitState {
    limiters: Arc<RwLock<HashMap<IpAddr, Arc<IpRateLimiter>>>>,
    settings: RateLimitSettings,
}

impl RateLimitState {
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            limiters: Arc::new(RwLock::new(HashMap::new())),
            settings,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    fn quota(&self) -> Quota {
        Quota::per_second(
            NonZeroU32::new(self.settings.auth_requests_per_second).unwrap_or(NonZeroU32::MIN),
        )
        .allow_burst(NonZeroU32::new(self.settings.auth_burst_size).unwrap_or(NonZeroU32::MIN))
    }

    async fn get_limiter(&self, ip: IpAddr) -> Arc<IpRateLimiter> {
        {
            let limiters = self.limiters.read().await;
            if let Some(limiter) = limiters.get(&ip) {
                return limiter.clone();
            }
        }

        let mut limiters = self.limiters.write().await;
        // Another request may have inserted it while we waited for the lock
        if let Some(limiter) = limiters.get(&ip) {
            return limiter.clone();
        }

        let limiter = Arc::new(RateLimiter::direct(self.quota()));
        limiters.insert(ip, limiter.clone());
        limiter
    }

    /// Bound the number of tracked IPs
    pub async fn cleanup(&self) {
        let mut limiters = self.limiters.write().await;
        let initial_count = limiters.len();
        if initial_count <= MAX_TRACKED_IPS {
            return;
        }

        let to_remove: Vec<_> = limiters.keys().take(initial_count / 2).cloned().collect();
        for ip in to_remove {
            limiters.remove(&ip);
        }
        debug!(
            "Rate limiter cleanup: {} -> {} entries",
            initial_count,
            limiters.len()
        );
    }
}

/// Client address from the connection, or loopback when served without
/// connect info (in-process requests)
fn client_ip(request: &Request<Body>) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimitState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !rate_limit.is_enabled() {
        return next.run(request).await;
    }

    let ip = client_ip(&request);
    let limiter = rate_limit.get_limiter(ip).await;

    match limiter.check() {
        Ok(_) => next.run(request).await,
        Err(_) => {
            warn!(ip = %ip, path = %request.uri().path(), "Rate limit exceeded");
            RateLimitExceeded.into_response()
        }
    }
}

/// 429 in the problem-details envelope
pub struct RateLimitExceeded;

impl IntoResponse for RateLimitExceeded {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "Too Many Requests",
            "Too many requests. Please try again later.",
        );
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            [(RETRY_AFTER, "1")],
            Json(body.clone()),
        )
            .into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Periodically bound the limiter map until `shutdown` fires
pub fn spawn_rate_limit_cleanup(state: RateLimitState, shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => state.cleanup().await,
            }
        }
    });
}
