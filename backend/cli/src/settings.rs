//! Turns the loaded configuration into ready-to-use services and policies.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use skyaudit_config::defaults::*;
use skyaudit_config::SkyAuditConfig;
use skyaudit_core::AuditService;
use skyaudit_gateway::{GatewayState, RateLimiter};
use skyaudit_orchestrator::{PollPolicy, ProxyClient};
use skyaudit_skyvern::{RetryPolicy, SkyvernClient, TaskSubmitter};

pub fn retry_policy(config: &SkyAuditConfig) -> RetryPolicy {
    let retry = config.skyvern().retry.unwrap_or_default();
    RetryPolicy {
        max_attempts: retry.max_attempts.unwrap_or(DEFAULT_RETRY_MAX_ATTEMPTS),
        base_delay_ms: retry.base_delay_ms.unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS),
        backoff_factor: retry.backoff_factor.unwrap_or(DEFAULT_RETRY_BACKOFF_FACTOR),
        max_delay_ms: retry.max_delay_ms.unwrap_or(DEFAULT_RETRY_MAX_DELAY_MS),
        jitter: retry.jitter.unwrap_or(true),
    }
}

pub fn poll_policy(config: &SkyAuditConfig) -> PollPolicy {
    let orchestrator = config.orchestrator();
    PollPolicy {
        interval: Duration::from_millis(
            orchestrator
                .poll_interval_ms
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
        ),
        max_polls: match orchestrator.max_polls.unwrap_or(DEFAULT_MAX_POLLS) {
            0 => None,
            n => Some(n),
        },
        max_consecutive_errors: orchestrator
            .max_consecutive_errors
            .unwrap_or(DEFAULT_MAX_CONSECUTIVE_ERRORS),
    }
}

pub fn batch_size(config: &SkyAuditConfig) -> usize {
    config
        .orchestrator()
        .batch_size
        .unwrap_or(DEFAULT_BATCH_SIZE)
}

/// The in-process service that calls the task API directly.
pub fn direct_service(config: &SkyAuditConfig) -> Result<TaskSubmitter<SkyvernClient>> {
    let skyvern = config.skyvern();
    let Some(api_key) = skyvern.api_key.filter(|k| !k.trim().is_empty()) else {
        bail!("no task API key configured; set SKYVERN_API_KEY or skyvern.apiKey");
    };

    let client = SkyvernClient::new(api_key)
        .with_base_url(
            skyvern
                .base_url
                .unwrap_or_else(|| DEFAULT_SKYVERN_BASE_URL.to_string()),
        )
        .with_retry(retry_policy(config))
        .with_timeout(Duration::from_secs(
            skyvern
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        ))?;

    Ok(TaskSubmitter::new(client).with_proxy_location(
        skyvern
            .proxy_location
            .unwrap_or_else(|| DEFAULT_PROXY_LOCATION.to_string()),
    ))
}

pub fn proxy_service(config: &SkyAuditConfig) -> Result<ProxyClient> {
    let orchestrator = config.orchestrator();
    let timeout = config
        .skyvern()
        .request_timeout_secs
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    let client = ProxyClient::new(
        orchestrator
            .proxy_url
            .unwrap_or_else(|| DEFAULT_PROXY_URL.to_string()),
    )
    .with_access_token(orchestrator.access_token)
    .with_timeout(Duration::from_secs(timeout))?;
    Ok(client)
}

/// Either the gateway client or, with `direct`, the in-process service.
pub fn audit_service(config: &SkyAuditConfig, direct: bool) -> Result<Arc<dyn AuditService>> {
    if direct {
        Ok(Arc::new(direct_service(config)?))
    } else {
        Ok(Arc::new(proxy_service(config)?))
    }
}

pub fn gateway_addr(config: &SkyAuditConfig, port: Option<u16>) -> Result<SocketAddr> {
    let gateway = config.gateway();
    let bind = gateway
        .bind
        .unwrap_or_else(|| DEFAULT_GATEWAY_BIND.to_string());
    let port = port.or(gateway.port).unwrap_or(DEFAULT_GATEWAY_PORT);
    format!("{bind}:{port}")
        .parse()
        .with_context(|| format!("invalid gateway address {bind}:{port}"))
}

pub fn gateway_state(config: &SkyAuditConfig) -> Result<GatewayState> {
    let gateway = config.gateway();
    let rate_limit = gateway.rate_limit.unwrap_or_default();
    let limiter = RateLimiter::new(
        rate_limit
            .max_requests
            .unwrap_or(DEFAULT_RATE_LIMIT_MAX_REQUESTS),
        rate_limit
            .window_secs
            .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS),
    );

    Ok(GatewayState::new(Arc::new(direct_service(config)?))
        .with_access_token(gateway.access_token)
        .with_max_batch_urls(gateway.max_batch_urls.unwrap_or(DEFAULT_MAX_BATCH_URLS))
        .with_rate_limiter(limiter))
}
