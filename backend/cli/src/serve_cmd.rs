//! CLI Serve Command
//!
//! Runs the proxy with the task API credential held in this process.

use anyhow::Result;
use tracing::info;

use skyaudit_config::SkyAuditConfig;
use skyaudit_gateway::start_server;

use crate::settings;

pub async fn run(config: &SkyAuditConfig, port: Option<u16>) -> Result<()> {
    let addr = settings::gateway_addr(config, port)?;
    let state = settings::gateway_state(config)?;

    info!(
        addr = %addr,
        auth = state.access_token.is_some(),
        max_batch_urls = state.max_batch_urls,
        "Starting SkyAudit proxy"
    );
    start_server(addr, state).await
}
