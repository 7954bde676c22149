//! CLI Config Command

use std::path::Path;

use anyhow::{bail, Result};
use serde_json::Value;

use skyaudit_config::{
    collect_redacted_paths, collect_referenced_vars, load_raw_config, redacted_config, validate,
    SkyAuditConfig,
};

use crate::terminal_output::{note_error, note_info, note_success, note_warn};

/// Print the effective config as YAML with secrets masked, preceded by the
/// env vars the file references and the fields that were masked.
pub async fn show(config: &SkyAuditConfig, path: &Path) -> Result<()> {
    note_info(&format!("Config file: {}", path.display()));
    let raw = load_raw_config(path).await?;
    for line in show_notes(&raw, config)? {
        note_info(&line);
    }
    println!("{}", serde_yaml::to_string(&redacted_config(config))?);
    Ok(())
}

fn show_notes(raw: &Value, config: &SkyAuditConfig) -> Result<Vec<String>> {
    let mut notes = Vec::new();
    let env_vars = collect_referenced_vars(raw);
    if !env_vars.is_empty() {
        notes.push(format!("Env references: {}", env_vars.join(", ")));
    }
    let masked = collect_redacted_paths(&serde_json::to_value(config)?);
    if !masked.is_empty() {
        notes.push(format!("Masked: {}", masked.join(", ")));
    }
    Ok(notes)
}

pub fn validate_cmd(config: &SkyAuditConfig, path: &Path) -> Result<()> {
    let report = validate(config);
    for warning in &report.warnings {
        note_warn(&format!("{}: {}", warning.path, warning.message));
    }
    for error in &report.errors {
        note_error(&format!("{}: {}", error.path, error.message));
    }

    if !report.is_valid() {
        bail!(
            "{} has {} error(s)",
            path.display(),
            report.errors.len()
        );
    }
    note_success(&format!("{} is valid", path.display()));
    Ok(())
}
