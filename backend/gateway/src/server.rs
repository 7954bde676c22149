//! Main HTTP Gateway Server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use skyaudit_core::AuditService;

use crate::handlers;
use crate::rate_limit::{enforce_rate_limit, RateLimiter};

pub const DEFAULT_MAX_BATCH_URLS: usize = 25;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub service: Arc<dyn AuditService>,
    pub access_token: Option<String>,
    pub max_batch_urls: usize,
    pub rate_limiter: RateLimiter,
}

impl GatewayState {
    pub fn new(service: Arc<dyn AuditService>) -> Self {
        Self {
            service,
            access_token: None,
            max_batch_urls: DEFAULT_MAX_BATCH_URLS,
            rate_limiter: RateLimiter::default(),
        }
    }

    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_max_batch_urls(mut self, max: usize) -> Self {
        self.max_batch_urls = max;
        self
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = limiter;
        self
    }
}

/// Build the router: rate-limited task creation, unlimited status polling,
/// an open health check, permissive CORS and request tracing.
///
/// Polls do not count against the limit; one audit polls every running
/// task every few seconds.
pub fn build_router(state: GatewayState) -> Router {
    let create_routes = Router::new()
        .route(
            "/initiate-check-and-extract-task",
            post(handlers::initiate_check),
        )
        .route(
            "/initiate-evaluation-task-batch",
            post(handlers::initiate_evaluation_batch),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_rate_limit,
        ));

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/task-status/:task_id", get(handlers::task_status))
        .merge(create_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Starts the gateway HTTP server and runs until Ctrl-C.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    let limiter = state.rate_limiter.clone();
    let app = build_router(state);

    // Drop expired rate-limit windows periodically.
    let prune_every = limiter.window.max(std::time::Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(prune_every);
        loop {
            ticker.tick().await;
            limiter.prune().await;
        }
    });

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind gateway to {addr}"))?;
    info!("Gateway HTTP server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown signal received");
    })
    .await
    .context("gateway server error")?;

    Ok(())
}
