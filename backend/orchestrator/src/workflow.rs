//! The audit workflow: widget check, link extraction, batched evaluation.

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use skyaudit_core::{
    exclude_links, filter_links, normalize_site_url, resolve_link, AuditError, AuditService,
    BatchEntry, Evaluation, Result, TaskId, WidgetCheck,
};
use skyaudit_logging::{AuditEvent, EventLogger};

use crate::batch::{chunk, DEFAULT_BATCH_SIZE};
use crate::poller::{poll_completed, PollPolicy, PolledTask};

/// Outcome of the homepage widget check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteCheck {
    pub url: String,
    pub task_id: TaskId,
    pub has_widget: bool,
    pub reasoning: String,
    /// Homepage links left after filtering, whether or not a widget was found.
    pub links: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationOutcome {
    Evaluated(Evaluation),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkEvaluation {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    pub outcome: EvaluationOutcome,
}

impl LinkEvaluation {
    fn failed(url: &str, task_id: Option<TaskId>, reason: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            task_id,
            outcome: EvaluationOutcome::Failed(reason.into()),
        }
    }

    /// `None` when the evaluation did not complete.
    pub fn is_compliant(&self) -> Option<bool> {
        match &self.outcome {
            EvaluationOutcome::Evaluated(e) => Some(e.compliance),
            EvaluationOutcome::Failed(_) => None,
        }
    }
}

/// Drives one audit run against an [`AuditService`].
pub struct Auditor {
    service: Arc<dyn AuditService>,
    poll: PollPolicy,
    batch_size: usize,
    run_id: Uuid,
}

impl Auditor {
    pub fn new(service: Arc<dyn AuditService>) -> Self {
        Self {
            service,
            poll: PollPolicy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll = policy;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Run the widget check on `url` and collect the homepage links worth
    /// evaluating, minus the ones in `ignored`.
    #[instrument(skip(self, ignored), fields(run_id = %self.run_id))]
    pub async fn check_site(&self, url: &str, ignored: &[String]) -> Result<SiteCheck> {
        let site = normalize_site_url(url)?;
        let task_id = self.service.start_site_check(&site).await?;
        self.log(AuditEvent::TaskSubmitted {
            task_id: task_id.to_string(),
            url: site.clone(),
            kind: "widget_check".into(),
        });

        let polled = self.wait(&task_id).await?;
        let check: WidgetCheck = parse_extraction(&polled)?;

        let links = filter_links(check.links.iter().map(|l| resolve_link(&site, l)));
        let links = exclude_links(links, ignored);
        info!(
            has_widget = check.has_widget,
            links = links.len(),
            "Widget check finished"
        );

        Ok(SiteCheck {
            url: site,
            task_id,
            has_widget: check.has_widget,
            reasoning: check.reasoning,
            links,
        })
    }

    /// Evaluate every link against `criteria`. Batches run concurrently and
    /// the result keeps the order of `links`.
    #[instrument(skip(self, links, criteria), fields(run_id = %self.run_id, links = links.len()))]
    pub async fn evaluate(&self, links: &[String], criteria: &[String]) -> Result<Vec<LinkEvaluation>> {
        if criteria.is_empty() {
            return Err(AuditError::InvalidRequest(
                "at least one evaluation criterion is required".into(),
            ));
        }

        let batches = chunk(links, self.batch_size);
        info!(batches = batches.len(), "Starting evaluations");

        let results = join_all(batches.iter().map(|batch| self.evaluate_batch(batch, criteria))).await;
        Ok(results.into_iter().flatten().collect())
    }

    async fn evaluate_batch(&self, batch: &[String], criteria: &[String]) -> Vec<LinkEvaluation> {
        let entries = match self.service.start_evaluation_batch(batch, criteria).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Evaluation batch failed to start");
                self.log(AuditEvent::BatchFailed {
                    urls: batch.to_vec(),
                    error_msg: e.to_string(),
                });
                return batch
                    .iter()
                    .map(|url| LinkEvaluation::failed(url, None, e.to_string()))
                    .collect();
            }
        };

        for entry in &entries {
            self.log(AuditEvent::TaskSubmitted {
                task_id: entry.task_id.to_string(),
                url: entry.url.clone(),
                kind: "evaluation".into(),
            });
        }

        join_all(batch.iter().map(|url| {
            let entry = entries.iter().find(|e| &e.url == url);
            self.evaluate_link(url, entry)
        }))
        .await
    }

    async fn evaluate_link(&self, url: &str, entry: Option<&BatchEntry>) -> LinkEvaluation {
        let Some(entry) = entry else {
            return LinkEvaluation::failed(url, None, "no task was created for this link");
        };

        let outcome = match self.wait(&entry.task_id).await {
            Ok(polled) => parse_extraction::<Evaluation>(&polled),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(evaluation) => LinkEvaluation {
                url: url.to_string(),
                task_id: Some(entry.task_id.clone()),
                outcome: EvaluationOutcome::Evaluated(evaluation),
            },
            Err(e) => {
                warn!(url, task_id = %entry.task_id, error = %e, "Evaluation failed");
                LinkEvaluation::failed(url, Some(entry.task_id.clone()), e.to_string())
            }
        }
    }

    async fn wait(&self, task_id: &TaskId) -> Result<PolledTask> {
        let result = poll_completed(self.service.as_ref(), task_id, &self.poll).await;
        if let Ok(polled) = &result {
            self.log(AuditEvent::TaskFinished {
                task_id: task_id.to_string(),
                status: polled.record.status.to_string(),
                polls: polled.polls,
            });
        }
        result
    }

    fn log(&self, event: AuditEvent) {
        EventLogger::log_event(&self.run_id.to_string(), event);
    }
}

fn parse_extraction<T: serde::de::DeserializeOwned>(polled: &PolledTask) -> Result<T> {
    let value = polled.extraction().cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| {
        AuditError::Decode(format!(
            "task {} returned unexpected extracted information: {e}",
            polled.record.task_id
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use skyaudit_core::{TaskRecord, TaskStatus};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Every task completes on the first status check with a canned result.
    #[derive(Default)]
    struct FakeService {
        widget: Value,
        results: HashMap<String, Value>,
        failing_batch_url: Option<String>,
        batches: Mutex<Vec<Vec<String>>>,
        site_checks: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AuditService for FakeService {
        async fn start_site_check(&self, url: &str) -> Result<TaskId> {
            self.site_checks.lock().unwrap().push(url.to_string());
            Ok(TaskId::new("tsk_widget"))
        }

        async fn task_status(&self, task_id: &TaskId) -> Result<TaskRecord> {
            if task_id.as_str() == "tsk_widget" {
                return Ok(TaskRecord::new("tsk_widget", TaskStatus::Completed)
                    .with_extraction(self.widget.clone()));
            }
            let url = task_id.as_str().trim_start_matches("tsk:");
            match self.results.get(url) {
                Some(v) => Ok(TaskRecord::new(task_id.as_str(), TaskStatus::Completed)
                    .with_extraction(v.clone())),
                None => {
                    let mut record = TaskRecord::new(task_id.as_str(), TaskStatus::Failed);
                    record.failure_reason = Some("navigation timeout".into());
                    Ok(record)
                }
            }
        }

        async fn start_evaluation_batch(
            &self,
            urls: &[String],
            _criteria: &[String],
        ) -> Result<Vec<BatchEntry>> {
            self.batches.lock().unwrap().push(urls.to_vec());
            if let Some(bad) = &self.failing_batch_url {
                if urls.contains(bad) {
                    return Err(AuditError::Upstream { status: 500, body: "proxy down".into() });
                }
            }
            Ok(urls
                .iter()
                .map(|u| BatchEntry { url: u.clone(), task_id: TaskId::new(format!("tsk:{u}")) })
                .collect())
        }
    }

    fn auditor(service: FakeService, batch_size: usize) -> (Arc<FakeService>, Auditor) {
        let service = Arc::new(service);
        let auditor = Auditor::new(service.clone())
            .with_batch_size(batch_size)
            .with_poll_policy(PollPolicy {
                interval: Duration::from_millis(1),
                max_polls: Some(5),
                max_consecutive_errors: 0,
            });
        (service, auditor)
    }

    fn link(path: &str) -> String {
        format!("https://example.org/{path}")
    }

    fn pass() -> Value {
        json!({"compliance": true, "issues": [], "passed": ["Step-free entrance"]})
    }

    #[tokio::test]
    async fn site_check_filters_and_resolves_links() {
        let service = FakeService {
            widget: json!({
                "has_widget": false,
                "reasoning": "No widget found",
                "links": [
                    "/visit", "https://example.org/visit#hours", "tel:+44123",
                    "https://facebook.com/example", "/img/map.png", "/contact"
                ]
            }),
            ..Default::default()
        };
        let (service, auditor) = auditor(service, 5);

        let check = auditor
            .check_site("example.org", &[link("contact")])
            .await
            .unwrap();
        assert_eq!(*service.site_checks.lock().unwrap(), vec!["https://example.org/".to_string()]);
        assert!(!check.has_widget);
        assert_eq!(check.task_id.as_str(), "tsk_widget");
        assert_eq!(check.links, vec![link("visit")]);
    }

    #[tokio::test]
    async fn site_with_widget_still_yields_links_to_evaluate() {
        let service = FakeService {
            widget: json!({
                "has_widget": true,
                "reasoning": "Toolbar in the footer",
                "links": ["/visit"]
            }),
            results: HashMap::from([(link("visit"), pass())]),
            ..Default::default()
        };
        let (_, auditor) = auditor(service, 5);

        let check = auditor.check_site("https://example.org", &[]).await.unwrap();
        assert!(check.has_widget);
        assert_eq!(check.links, vec![link("visit")]);

        let evaluations = auditor
            .evaluate(&check.links, &["Step-free entrance".to_string()])
            .await
            .unwrap();
        assert_eq!(evaluations[0].is_compliant(), Some(true));
    }

    #[tokio::test]
    async fn site_check_rejects_bad_extraction() {
        let service = FakeService {
            widget: json!({"reasoning": "missing the flag"}),
            ..Default::default()
        };
        let (_, auditor) = auditor(service, 5);
        let err = auditor.check_site("https://example.org", &[]).await.unwrap_err();
        assert!(matches!(err, AuditError::Decode(_)));
    }

    #[tokio::test]
    async fn evaluations_are_batched_and_keep_order() {
        let links: Vec<String> = (1..=7).map(|i| link(&i.to_string())).collect();
        let results = links.iter().map(|l| (l.clone(), pass())).collect();
        let service = FakeService { results, ..Default::default() };
        let (service, auditor) = auditor(service, 3);

        let evaluations = auditor.evaluate(&links, &["Step-free entrance".into()]).await.unwrap();

        let sizes: Vec<usize> = service.batches.lock().unwrap().iter().map(Vec::len).collect();
        let mut sorted = sizes.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 3, 3]);
        let urls: Vec<&str> = evaluations.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, links.iter().map(String::as_str).collect::<Vec<_>>());
        assert!(evaluations.iter().all(|e| e.is_compliant() == Some(true)));
    }

    #[tokio::test]
    async fn failed_batch_only_fails_its_own_links() {
        let links = vec![link("a"), link("b"), link("c")];
        let results = links.iter().map(|l| (l.clone(), pass())).collect();
        let service = FakeService {
            results,
            failing_batch_url: Some(link("c")),
            ..Default::default()
        };
        let (_, auditor) = auditor(service, 2);

        let evaluations = auditor.evaluate(&links, &["Hearing loop".into()]).await.unwrap();
        assert_eq!(evaluations[0].is_compliant(), Some(true));
        assert_eq!(evaluations[1].is_compliant(), Some(true));
        assert_eq!(
            evaluations[2].outcome,
            EvaluationOutcome::Failed("upstream returned 500: proxy down".into())
        );
        assert!(evaluations[2].task_id.is_none());
    }

    #[tokio::test]
    async fn failed_task_is_reported_per_link() {
        let links = vec![link("ok"), link("broken")];
        let mut results = HashMap::new();
        results.insert(
            link("ok"),
            json!({"compliance": false, "issues": ["No hearing loop"], "passed": null}),
        );
        let service = FakeService { results, ..Default::default() };
        let (_, auditor) = auditor(service, 5);

        let evaluations = auditor.evaluate(&links, &["Hearing loop".into()]).await.unwrap();
        match &evaluations[0].outcome {
            EvaluationOutcome::Evaluated(e) => {
                assert!(!e.compliance);
                assert_eq!(e.issues, vec!["No hearing loop".to_string()]);
                assert!(e.passed.is_empty());
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(matches!(
            &evaluations[1].outcome,
            EvaluationOutcome::Failed(reason) if reason.contains("navigation timeout")
        ));
        assert_eq!(evaluations[1].task_id.as_ref().map(TaskId::as_str), Some("tsk:https://example.org/broken"));
    }

    #[tokio::test]
    async fn empty_criteria_is_rejected() {
        let (_, auditor) = auditor(FakeService::default(), 5);
        assert!(auditor.evaluate(&[link("a")], &[]).await.is_err());
    }
}
