//! CLI Check and Evaluate Commands

use std::path::Path;

use anyhow::{Context, Result};

use skyaudit_config::SkyAuditConfig;
use skyaudit_core::{filter_links, CriteriaSet};
use skyaudit_orchestrator::{AuditReport, Auditor, LinkEvaluation};

use crate::settings;
use crate::terminal_output::{
    note_info, note_success, note_warn, print_site_check, print_summary, render_evaluations,
};

/// Criteria chosen on the command line: a built-in set, extra criteria, or both.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaSelection {
    pub set_name: Option<String>,
    pub criteria: Vec<String>,
}

impl CriteriaSelection {
    /// `Ok(None)` when neither a set nor extra criteria were given.
    pub fn resolve(set: Option<&str>, extra: Vec<String>) -> Result<Option<Self>> {
        let set = set
            .map(|name| name.parse::<CriteriaSet>())
            .transpose()
            .context("unknown criteria set; run `skyaudit criteria` to list them")?;

        let mut criteria = set.map(|s| s.to_vec()).unwrap_or_default();
        criteria.extend(extra.into_iter().filter(|c| !c.trim().is_empty()));

        if criteria.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            set_name: set.map(|s| s.key().to_string()),
            criteria,
        }))
    }
}

fn auditor(config: &SkyAuditConfig, direct: bool) -> Result<Auditor> {
    let service = settings::audit_service(config, direct)?;
    Ok(Auditor::new(service)
        .with_poll_policy(settings::poll_policy(config))
        .with_batch_size(settings::batch_size(config)))
}

pub async fn check(
    config: &SkyAuditConfig,
    url: &str,
    selection: Option<CriteriaSelection>,
    ignore: &[String],
    direct: bool,
    output: Option<&Path>,
) -> Result<()> {
    let auditor = auditor(config, direct)?;

    note_info(&format!("Checking {url} for an accessibility widget..."));
    let site = auditor.check_site(url, ignore).await?;
    print_site_check(&site);

    let mut report = AuditReport::new(auditor.run_id()).with_site(site.clone());
    let mut evaluations = Vec::new();

    match (site.links.is_empty(), selection) {
        (true, _) => note_warn("No links left to evaluate"),
        (false, None) => note_info("Pass --criteria <set> to evaluate these links"),
        (false, Some(selection)) => {
            evaluations = run_evaluations(&auditor, &site.links, &selection).await?;
            report = report.with_criteria(selection.set_name, selection.criteria);
        }
    }

    finish(report, evaluations, output).await
}

pub async fn evaluate(
    config: &SkyAuditConfig,
    links: &[String],
    selection: CriteriaSelection,
    direct: bool,
    output: Option<&Path>,
) -> Result<()> {
    let links = filter_links(links);
    if links.is_empty() {
        note_warn("All given links are filtered out (contact, social media or image links)");
        return Ok(());
    }

    let auditor = auditor(config, direct)?;
    let evaluations = run_evaluations(&auditor, &links, &selection).await?;
    let report = AuditReport::new(auditor.run_id())
        .with_criteria(selection.set_name, selection.criteria);
    finish(report, evaluations, output).await
}

async fn run_evaluations(
    auditor: &Auditor,
    links: &[String],
    selection: &CriteriaSelection,
) -> Result<Vec<LinkEvaluation>> {
    note_info(&format!(
        "Evaluating {} links against {} criteria...",
        links.len(),
        selection.criteria.len()
    ));
    let evaluations = auditor.evaluate(links, &selection.criteria).await?;
    println!("\n{}", render_evaluations(&evaluations));
    Ok(evaluations)
}

async fn finish(
    report: AuditReport,
    evaluations: Vec<LinkEvaluation>,
    output: Option<&Path>,
) -> Result<()> {
    let has_evaluations = !evaluations.is_empty();
    let report = report.finish(evaluations);
    if has_evaluations {
        print_summary(&report.summary);
    }

    if let Some(path) = output {
        report.save(path).await?;
        note_success(&format!("Report written to {}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_combines_set_and_extra_criteria() {
        let selection = CriteriaSelection::resolve(Some("Hearing"), vec!["Quiet room".into()])
            .unwrap()
            .unwrap();
        assert_eq!(selection.set_name.as_deref(), Some("hearing"));
        assert_eq!(selection.criteria.len(), CriteriaSet::Hearing.criteria().len() + 1);
        assert_eq!(selection.criteria.last().map(String::as_str), Some("Quiet room"));
    }

    #[test]
    fn selection_is_optional() {
        assert_eq!(CriteriaSelection::resolve(None, vec![]).unwrap(), None);
        assert!(CriteriaSelection::resolve(Some("smell"), vec![]).is_err());
    }
}
