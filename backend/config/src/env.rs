//! Environment handling for config values.
//!
//! Two mechanisms:
//! - `${VAR_NAME}` references inside string values, resolved at load time.
//!   Only uppercase `[A-Z_][A-Z0-9_]*` names match; `$${VAR}` escapes to a
//!   literal `${VAR}`.
//! - Well-known variables (`SKYVERN_API_KEY`, `PORT`, ...) that override the
//!   corresponding config fields.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::{GatewayConfig, OrchestratorConfig, SkyAuditConfig, SkyvernConfig, LoggingConfig};

/// `${VAR}` with an optional leading `$` marking an escape.
static ENV_REF_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references in a config value tree from the process env.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    substitute_value(value, &std::env::vars().collect(), "")
}

/// Substitute `${VAR}` references using the given map.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_REF_PATTERN.replace_all(s, |caps: &Captures| {
        let var_name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: var_name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(substituted.into_owned())
}

/// Collect all env var names referenced in a config value tree.
pub fn collect_referenced_vars(value: &Value) -> Vec<String> {
    fn walk(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::String(s) => out.extend(
                ENV_REF_PATTERN
                    .captures_iter(s)
                    .filter(|c| c[1].is_empty())
                    .map(|c| c[2].to_string()),
            ),
            Value::Array(arr) => arr.iter().for_each(|v| walk(v, out)),
            Value::Object(map) => map.values().for_each(|v| walk(v, out)),
            _ => {}
        }
    }

    let mut vars = Vec::new();
    walk(value, &mut vars);
    vars.sort();
    vars.dedup();
    vars
}

/// Apply well-known environment variables from the process env.
pub fn apply_env_overrides(config: SkyAuditConfig) -> SkyAuditConfig {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply well-known environment variables from the given map.
///
/// `SKYVERN_API_KEY` takes precedence over the bare `API_KEY`.
pub fn apply_env_overrides_with(
    mut config: SkyAuditConfig,
    env: &HashMap<String, String>,
) -> SkyAuditConfig {
    let get = |name: &str| env.get(name).filter(|v| !v.trim().is_empty()).cloned();

    if let Some(key) = get("SKYVERN_API_KEY").or_else(|| get("API_KEY")) {
        config.skyvern.get_or_insert_with(SkyvernConfig::default).api_key = Some(key);
    }
    if let Some(url) = get("SKYVERN_BASE_URL") {
        config.skyvern.get_or_insert_with(SkyvernConfig::default).base_url = Some(url);
    }
    if let Some(port) = get("PORT").and_then(|p| p.parse::<u16>().ok()) {
        config.gateway.get_or_insert_with(GatewayConfig::default).port = Some(port);
    }
    if let Some(token) = get("SKYAUDIT_ACCESS_TOKEN") {
        config
            .gateway
            .get_or_insert_with(GatewayConfig::default)
            .access_token = Some(token.clone());
        config
            .orchestrator
            .get_or_insert_with(OrchestratorConfig::default)
            .access_token = Some(token);
    }
    if let Some(url) = get("SKYAUDIT_PROXY_URL") {
        config
            .orchestrator
            .get_or_insert_with(OrchestratorConfig::default)
            .proxy_url = Some(url);
    }
    if let Some(level) = get("RUST_LOG") {
        config.logging.get_or_insert_with(LoggingConfig::default).level = Some(level);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_nested_var() {
        let v = json!({"skyvern": {"apiKey": "${SKYVERN_KEY}"}});
        let result = resolve_env_vars_with(&v, &env(&[("SKYVERN_KEY", "sk-abc")])).unwrap();
        assert_eq!(result["skyvern"]["apiKey"], "sk-abc");
    }

    #[test]
    fn missing_var_names_the_path() {
        let v = json!({"gateway": {"accessToken": "${MISSING_TOKEN}"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err().to_string();
        assert!(err.contains("MISSING_TOKEN"));
        assert!(err.contains("gateway.accessToken"));
    }

    #[test]
    fn escaped_reference_stays_literal() {
        let v = json!({"note": "use $${HOME_DIR} here"});
        let result = resolve_env_vars_with(&v, &HashMap::new()).unwrap();
        assert_eq!(result["note"], "use ${HOME_DIR} here");
        assert!(collect_referenced_vars(&v).is_empty());
    }

    #[test]
    fn collects_referenced_vars() {
        let v = json!({"a": "${FOO}", "b": ["${BAR}", "${FOO}"]});
        assert_eq!(collect_referenced_vars(&v), vec!["BAR".to_string(), "FOO".to_string()]);
    }

    #[test]
    fn overrides_prefer_skyvern_api_key() {
        let cfg = apply_env_overrides_with(
            SkyAuditConfig::default(),
            &env(&[("API_KEY", "generic"), ("SKYVERN_API_KEY", "specific"), ("PORT", "4100")]),
        );
        assert_eq!(cfg.skyvern().api_key.as_deref(), Some("specific"));
        assert_eq!(cfg.gateway().port, Some(4100));
    }

    #[test]
    fn access_token_applies_to_both_sides() {
        let cfg = apply_env_overrides_with(
            SkyAuditConfig::default(),
            &env(&[("SKYAUDIT_ACCESS_TOKEN", "shared"), ("PORT", "not-a-port")]),
        );
        assert_eq!(cfg.gateway().access_token.as_deref(), Some("shared"));
        assert_eq!(cfg.orchestrator().access_token.as_deref(), Some("shared"));
        assert_eq!(cfg.gateway().port, None);
    }
}
