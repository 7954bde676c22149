//! Gateway Rate Limiting Module
//!
//! Fixed-window counter of task-creation requests per client address.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::server::GatewayState;

pub const DEFAULT_MAX_REQUESTS: u32 = 120;
pub const DEFAULT_WINDOW_SECS: u64 = 60;

#[derive(Clone)]
pub struct RateLimiter {
    // client key -> (request_count, window_start)
    limits: Arc<RwLock<HashMap<String, (u32, Instant)>>>,
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_SECS)
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            limits: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Count a request from `client` and report whether it is allowed.
    pub async fn check_limit(&self, client: &str) -> bool {
        let mut limits = self.limits.write().await;
        let now = Instant::now();

        let state = limits.entry(client.to_string()).or_insert((0, now));

        if now.duration_since(state.1) >= self.window {
            state.0 = 1;
            state.1 = now;
            debug!(client, "Rate limit window reset");
            true
        } else {
            state.0 += 1;
            if state.0 > self.max_requests {
                warn!(client, "Rate limit exceeded");
                false
            } else {
                debug!(client, count = state.0, max = self.max_requests, "Rate limit OK");
                true
            }
        }
    }

    /// Drop windows that have already expired.
    pub async fn prune(&self) {
        let now = Instant::now();
        self.limits
            .write()
            .await
            .retain(|_, (_, start)| now.duration_since(*start) < self.window);
    }
}

/// Middleware applying the state's limiter to every request it wraps.
pub async fn enforce_rate_limit(
    State(state): State<GatewayState>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if !state.rate_limiter.check_limit(&client).await {
        return ApiError::RateLimited.into_response();
    }
    next.run(request).await
}
