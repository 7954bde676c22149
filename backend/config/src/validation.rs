//! Config validation: schema checks with user-friendly error messages.

use crate::schema::SkyAuditConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Emit every finding through `tracing`.
    pub fn log(&self) {
        for warning in &self.warnings {
            tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
        }
        for error in &self.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
    }

    /// Fail when an error sits under one of `sections`; `"gateway"` covers
    /// `gateway.port` and every other `gateway.*` path.
    pub fn ensure_valid_for(&self, sections: &[&str]) -> anyhow::Result<()> {
        let blocking: Vec<String> = self
            .errors
            .iter()
            .filter(|e| {
                sections.iter().any(|section| {
                    e.path == *section
                        || e.path
                            .strip_prefix(section)
                            .is_some_and(|rest| rest.starts_with('.'))
                })
            })
            .map(|e| e.to_string())
            .collect();

        if blocking.is_empty() {
            return Ok(());
        }
        anyhow::bail!("invalid config:\n  {}", blocking.join("\n  "))
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &SkyAuditConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_skyvern(config, &mut report);
    validate_gateway(config, &mut report);
    validate_orchestrator(config, &mut report);
    validate_cross_section(config, &mut report);
    report
}

fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    (url.starts_with("http://") || url.starts_with("https://")) && url.len() > "https://".len()
}

fn validate_skyvern(config: &SkyAuditConfig, report: &mut ValidationReport) {
    let Some(skyvern) = &config.skyvern else { return };

    if skyvern.api_key.as_deref().map(str::trim).unwrap_or("").is_empty() {
        report.warn(
            "skyvern.apiKey",
            "No task API key configured; the proxy and --direct mode cannot create tasks",
        );
    }
    if let Some(url) = &skyvern.base_url {
        if !is_http_url(url) {
            report.error("skyvern.baseUrl", format!("'{url}' is not an http(s) URL"));
        }
    }
    if skyvern.request_timeout_secs == Some(0) {
        report.error("skyvern.requestTimeoutSecs", "must be > 0");
    }
    if let Some(retry) = &skyvern.retry {
        if retry.max_attempts == Some(0) {
            report.error("skyvern.retry.maxAttempts", "must be >= 1");
        }
        if let Some(factor) = retry.backoff_factor {
            if factor < 1.0 {
                report.warn(
                    "skyvern.retry.backoffFactor",
                    format!("{factor} shrinks the delay between attempts"),
                );
            }
        }
    }
}

fn validate_gateway(config: &SkyAuditConfig, report: &mut ValidationReport) {
    let Some(gw) = &config.gateway else { return };

    if let Some(port) = gw.port {
        if port < 1024 && port != 80 && port != 443 {
            report.warn(
                "gateway.port",
                format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
            );
        }
    }
    if gw.max_batch_urls == Some(0) {
        report.error("gateway.maxBatchUrls", "must be > 0");
    }
    if let Some(rl) = &gw.rate_limit {
        if rl.max_requests == Some(0) {
            report.error("gateway.rateLimit.maxRequests", "must be > 0");
        }
        if rl.window_secs == Some(0) {
            report.error("gateway.rateLimit.windowSecs", "must be > 0");
        }
    }

    let loopback = matches!(gw.bind.as_deref(), Some("127.0.0.1") | Some("localhost") | Some("::1"));
    if !loopback && gw.access_token.is_none() {
        report.warn(
            "gateway.accessToken",
            "Proxy is reachable beyond loopback without an access token; anyone can spend the task API credential",
        );
    }
}

fn validate_orchestrator(config: &SkyAuditConfig, report: &mut ValidationReport) {
    let Some(orch) = &config.orchestrator else { return };

    if let Some(url) = &orch.proxy_url {
        if !is_http_url(url) {
            report.error("orchestrator.proxyUrl", format!("'{url}' is not an http(s) URL"));
        }
    }
    if orch.poll_interval_ms == Some(0) {
        report.error("orchestrator.pollIntervalMs", "must be > 0");
    }
    if orch.batch_size == Some(0) {
        report.error("orchestrator.batchSize", "must be > 0");
    }
}

/// Checks spanning the gateway and the orchestrator talking to it.
fn validate_cross_section(config: &SkyAuditConfig, report: &mut ValidationReport) {
    let batch_size = config.orchestrator.as_ref().and_then(|o| o.batch_size);
    let max_batch_urls = config.gateway.as_ref().and_then(|g| g.max_batch_urls);
    if let (Some(batch), Some(max)) = (batch_size, max_batch_urls) {
        if batch > max {
            report.error(
                "orchestrator.batchSize",
                format!("{batch} exceeds gateway.maxBatchUrls ({max}); every batch would be rejected"),
            );
        }
    }
}
