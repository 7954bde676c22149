//! Log Redaction
//!
//! Scrubs task API keys and bearer tokens from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static API_KEY_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(x-api-key["']?\s*[:=]\s*["']?)[^\s"',}]+"#).unwrap());
static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s+[a-zA-Z0-9\-\._~+/]+=*").unwrap());
static SECRET_KEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"sk-[a-zA-Z0-9_\-]{16,}").unwrap());

/// Redacts credentials in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = API_KEY_HEADER_RE.replace_all(input, "${1}[REDACTED_KEY]");
    let redacted = BEARER_RE.replace_all(&redacted, "Bearer [REDACTED_TOKEN]");
    SECRET_KEY_RE
        .replace_all(&redacted, "[REDACTED_KEY]")
        .into_owned()
}
