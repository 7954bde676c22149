//! SkyAudit runtime configuration.
//!
//! Provides:
//! - Typed config schema (task API, proxy, orchestrator, logging)
//! - YAML loading from the config directory
//! - `${ENV_VAR}` substitution and well-known env overrides
//! - Default value application
//! - Validation
//! - Redaction for safe display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{
    apply_env_overrides, apply_env_overrides_with, collect_referenced_vars, resolve_env_vars,
    resolve_env_vars_with, MissingEnvVarError,
};
pub use io::{config_dir, config_file_path, load_raw_config};
pub use redact::{collect_redacted_paths, redact, redacted_config};
pub use schema::SkyAuditConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use std::path::Path;

/// Load a config file, substitute env vars, then apply env overrides and
/// defaults. Validation is left to the caller.
pub async fn load_and_prepare(path: &Path) -> Result<SkyAuditConfig> {
    let raw = load_raw_config(path).await?;
    let value = resolve_env_vars(&raw).context("Failed to resolve env vars in config")?;

    let config: SkyAuditConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    Ok(apply_all_defaults(apply_env_overrides(config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_file_and_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        std::fs::write(
            &path,
            "orchestrator:\n  batchSize: 2\nskyvern:\n  proxyLocation: NONE\n",
        )
        .unwrap();

        let cfg = load_and_prepare(&path).await.unwrap();
        assert_eq!(cfg.orchestrator().batch_size, Some(2));
        assert_eq!(cfg.skyvern().proxy_location.as_deref(), Some("NONE"));
        assert_eq!(
            cfg.orchestrator().poll_interval_ms,
            Some(defaults::DEFAULT_POLL_INTERVAL_MS)
        );
    }
}
