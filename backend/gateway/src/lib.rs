//! SkyAudit gateway: the proxy between audit clients and the task API.
//!
//! Holds the task API credential server-side and exposes three task routes
//! plus a health check.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod server;

pub use error::ApiError;
pub use rate_limit::RateLimiter;
pub use server::{build_router, start_server, GatewayState, DEFAULT_MAX_BATCH_URLS};
