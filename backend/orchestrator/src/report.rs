use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use skyaudit_core::Result;

use crate::workflow::{LinkEvaluation, SiteCheck};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub compliant: usize,
    pub non_compliant: usize,
    pub failed: usize,
}

impl ReportSummary {
    pub fn from_evaluations(evaluations: &[LinkEvaluation]) -> Self {
        evaluations
            .iter()
            .fold(Self::default(), |mut summary, evaluation| {
                summary.total += 1;
                match evaluation.is_compliant() {
                    Some(true) => summary.compliant += 1,
                    Some(false) => summary.non_compliant += 1,
                    None => summary.failed += 1,
                }
                summary
            })
    }
}

/// Everything one run produced, ready to be written out as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<SiteCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria_set: Option<String>,
    #[serde(default)]
    pub criteria: Vec<String>,
    #[serde(default)]
    pub evaluations: Vec<LinkEvaluation>,
    pub summary: ReportSummary,
}

impl AuditReport {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            finished_at: None,
            site: None,
            criteria_set: None,
            criteria: Vec::new(),
            evaluations: Vec::new(),
            summary: ReportSummary::default(),
        }
    }

    pub fn with_site(mut self, site: SiteCheck) -> Self {
        self.site = Some(site);
        self
    }

    pub fn with_criteria(mut self, set_name: Option<String>, criteria: Vec<String>) -> Self {
        self.criteria_set = set_name;
        self.criteria = criteria;
        self
    }

    /// Record the evaluations, recompute the summary and stamp the end time.
    pub fn finish(mut self, evaluations: Vec<LinkEvaluation>) -> Self {
        self.summary = ReportSummary::from_evaluations(&evaluations);
        self.evaluations = evaluations;
        self.finished_at = Some(Utc::now());
        self
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }
}
