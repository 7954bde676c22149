//! CLI Status Command
//!
//! Prints the status document of one task as JSON.

use anyhow::Result;

use skyaudit_config::SkyAuditConfig;
use skyaudit_core::TaskId;

use crate::settings;

pub async fn run(config: &SkyAuditConfig, task_id: &str, direct: bool) -> Result<()> {
    let service = settings::audit_service(config, direct)?;
    let record = service.task_status(&TaskId::new(task_id.trim())).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
