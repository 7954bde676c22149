//! Config defaults: fills every unset value after loading.

use crate::schema::{
    GatewayConfig, LoggingConfig, OrchestratorConfig, RateLimitConfig, RetryConfig,
    SkyAuditConfig, SkyvernConfig,
};

pub const DEFAULT_SKYVERN_BASE_URL: &str = "https://api.skyvern.com";
pub const DEFAULT_PROXY_LOCATION: &str = "RESIDENTIAL";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;
pub const DEFAULT_RETRY_BACKOFF_FACTOR: f64 = 2.0;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;

pub const DEFAULT_GATEWAY_BIND: &str = "0.0.0.0";
pub const DEFAULT_GATEWAY_PORT: u16 = 3000;
pub const DEFAULT_MAX_BATCH_URLS: usize = 25;
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 120;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

pub const DEFAULT_PROXY_URL: &str = "http://localhost:3000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
/// 300 checks at the default interval is ten minutes per task.
pub const DEFAULT_MAX_POLLS: u32 = 300;
pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 3;
pub const DEFAULT_BATCH_SIZE: usize = 5;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: SkyAuditConfig) -> SkyAuditConfig {
    let config = apply_skyvern_defaults(config);
    let config = apply_gateway_defaults(config);
    let config = apply_orchestrator_defaults(config);
    apply_logging_defaults(config)
}

fn apply_skyvern_defaults(mut config: SkyAuditConfig) -> SkyAuditConfig {
    let skyvern = config.skyvern.get_or_insert_with(SkyvernConfig::default);
    skyvern
        .base_url
        .get_or_insert_with(|| DEFAULT_SKYVERN_BASE_URL.to_string());
    skyvern
        .proxy_location
        .get_or_insert_with(|| DEFAULT_PROXY_LOCATION.to_string());
    skyvern
        .request_timeout_secs
        .get_or_insert(DEFAULT_REQUEST_TIMEOUT_SECS);

    let retry = skyvern.retry.get_or_insert_with(RetryConfig::default);
    retry.max_attempts.get_or_insert(DEFAULT_RETRY_MAX_ATTEMPTS);
    retry.base_delay_ms.get_or_insert(DEFAULT_RETRY_BASE_DELAY_MS);
    retry.backoff_factor.get_or_insert(DEFAULT_RETRY_BACKOFF_FACTOR);
    retry.max_delay_ms.get_or_insert(DEFAULT_RETRY_MAX_DELAY_MS);
    retry.jitter.get_or_insert(true);
    config
}

fn apply_gateway_defaults(mut config: SkyAuditConfig) -> SkyAuditConfig {
    let gateway = config.gateway.get_or_insert_with(GatewayConfig::default);
    gateway
        .bind
        .get_or_insert_with(|| DEFAULT_GATEWAY_BIND.to_string());
    gateway.port.get_or_insert(DEFAULT_GATEWAY_PORT);
    gateway.max_batch_urls.get_or_insert(DEFAULT_MAX_BATCH_URLS);

    let rate_limit = gateway.rate_limit.get_or_insert_with(RateLimitConfig::default);
    rate_limit
        .max_requests
        .get_or_insert(DEFAULT_RATE_LIMIT_MAX_REQUESTS);
    rate_limit
        .window_secs
        .get_or_insert(DEFAULT_RATE_LIMIT_WINDOW_SECS);
    config
}

fn apply_orchestrator_defaults(mut config: SkyAuditConfig) -> SkyAuditConfig {
    let orchestrator = config
        .orchestrator
        .get_or_insert_with(OrchestratorConfig::default);
    orchestrator
        .proxy_url
        .get_or_insert_with(|| DEFAULT_PROXY_URL.to_string());
    orchestrator
        .poll_interval_ms
        .get_or_insert(DEFAULT_POLL_INTERVAL_MS);
    orchestrator.max_polls.get_or_insert(DEFAULT_MAX_POLLS);
    orchestrator
        .max_consecutive_errors
        .get_or_insert(DEFAULT_MAX_CONSECUTIVE_ERRORS);
    orchestrator.batch_size.get_or_insert(DEFAULT_BATCH_SIZE);
    config
}

fn apply_logging_defaults(mut config: SkyAuditConfig) -> SkyAuditConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging
        .level
        .get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.json.get_or_insert(false);
    config
}
