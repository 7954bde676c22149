//! Task status polling.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use skyaudit_core::{AuditError, AuditService, Result, TaskId, TaskRecord};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_POLLS: u32 = 300;
pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 3;

#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Wait between two status checks.
    pub interval: Duration,
    /// Give up with `PollTimeout` after this many checks. `None` polls forever.
    pub max_polls: Option<u32>,
    /// Transient failures tolerated in a row before the error is returned.
    pub max_consecutive_errors: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_polls: Some(DEFAULT_MAX_POLLS),
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
        }
    }
}

/// A task in a terminal status and how many checks it took to get there.
#[derive(Debug, Clone)]
pub struct PolledTask {
    pub record: TaskRecord,
    pub polls: u32,
}

impl PolledTask {
    pub fn extraction(&self) -> Option<&Value> {
        self.record
            .extracted_information
            .as_ref()
            .filter(|v| !v.is_null())
    }
}

/// Fetch the status of `task_id` until it is terminal.
pub async fn poll_task(
    service: &dyn AuditService,
    task_id: &TaskId,
    policy: &PollPolicy,
) -> Result<PolledTask> {
    let mut polls = 0u32;
    let mut consecutive_errors = 0u32;

    loop {
        polls += 1;
        match service.task_status(task_id).await {
            Ok(record) if record.status.is_terminal() => {
                debug!(task_id = %task_id, status = %record.status, polls, "Task reached terminal status");
                return Ok(PolledTask { record, polls });
            }
            Ok(record) => {
                consecutive_errors = 0;
                debug!(task_id = %task_id, status = %record.status, polls, "Task still pending");
            }
            Err(e) if e.is_transient() && consecutive_errors < policy.max_consecutive_errors => {
                consecutive_errors += 1;
                warn!(
                    task_id = %task_id,
                    error = %e,
                    consecutive_errors,
                    "Status check failed, will keep polling"
                );
            }
            Err(e) => return Err(e),
        }

        if policy.max_polls.is_some_and(|max| polls >= max) {
            return Err(AuditError::PollTimeout {
                task_id: task_id.to_string(),
                polls,
            });
        }
        tokio::time::sleep(policy.interval).await;
    }
}

/// Like [`poll_task`], but only a `completed` task carrying extracted
/// information counts as success.
pub async fn poll_completed(
    service: &dyn AuditService,
    task_id: &TaskId,
    policy: &PollPolicy,
) -> Result<PolledTask> {
    let polled = poll_task(service, task_id, policy).await?;

    if !polled.record.status.is_success() {
        return Err(AuditError::TaskFailed {
            task_id: task_id.to_string(),
            status: polled.record.status.to_string(),
            reason: polled.record.failure_reason.clone(),
        });
    }
    if polled.extraction().is_none() {
        return Err(AuditError::MissingExtraction(task_id.to_string()));
    }
    Ok(polled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use skyaudit_core::{BatchEntry, TaskStatus};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a scripted sequence of status responses.
    struct Scripted(Mutex<VecDeque<Result<TaskRecord>>>);

    impl Scripted {
        fn new(steps: Vec<Result<TaskRecord>>) -> Self {
            Self(Mutex::new(steps.into()))
        }
    }

    #[async_trait]
    impl AuditService for Scripted {
        async fn start_site_check(&self, _url: &str) -> Result<TaskId> {
            unimplemented!()
        }

        async fn task_status(&self, task_id: &TaskId) -> Result<TaskRecord> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(TaskRecord::new(task_id.as_str(), TaskStatus::Running)))
        }

        async fn start_evaluation_batch(&self, _: &[String], _: &[String]) -> Result<Vec<BatchEntry>> {
            unimplemented!()
        }
    }

    fn fast() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(1),
            max_polls: Some(10),
            max_consecutive_errors: 2,
        }
    }

    fn record(status: TaskStatus) -> Result<TaskRecord> {
        Ok(TaskRecord::new("tsk_1", status))
    }

    fn busy() -> Result<TaskRecord> {
        Err(AuditError::Upstream { status: 503, body: "busy".into() })
    }

    #[tokio::test]
    async fn polls_until_terminal() {
        let service = Scripted::new(vec![
            record(TaskStatus::Created),
            record(TaskStatus::Queued),
            record(TaskStatus::Running),
            Ok(TaskRecord::new("tsk_1", TaskStatus::Completed).with_extraction(json!({"ok": true}))),
        ]);
        let polled = poll_task(&service, &TaskId::new("tsk_1"), &fast()).await.unwrap();
        assert_eq!(polled.polls, 4);
        assert_eq!(polled.record.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn tolerates_a_few_transient_errors() {
        let service = Scripted::new(vec![
            busy(),
            record(TaskStatus::Running),
            busy(),
            busy(),
            record(TaskStatus::Failed),
        ]);
        let polled = poll_task(&service, &TaskId::new("tsk_1"), &fast()).await.unwrap();
        assert_eq!(polled.record.status, TaskStatus::Failed);
    }

    #[tokio::test]
    async fn too_many_consecutive_errors_are_returned() {
        let service = Scripted::new(vec![busy(), busy(), busy()]);
        let err = poll_task(&service, &TaskId::new("tsk_1"), &fast()).await.unwrap_err();
        assert!(matches!(err, AuditError::Upstream { status: 503, .. }));
    }

    #[tokio::test]
    async fn non_transient_errors_stop_immediately() {
        let service = Scripted::new(vec![Err(AuditError::TaskNotFound("tsk_1".into()))]);
        let err = poll_task(&service, &TaskId::new("tsk_1"), &fast()).await.unwrap_err();
        assert!(matches!(err, AuditError::TaskNotFound(_)));
    }

    #[tokio::test]
    async fn gives_up_after_max_polls() {
        let service = Scripted::new(vec![]);
        let policy = PollPolicy { max_polls: Some(3), ..fast() };
        let err = poll_task(&service, &TaskId::new("tsk_1"), &policy).await.unwrap_err();
        assert!(matches!(err, AuditError::PollTimeout { polls: 3, .. }));
    }

    #[tokio::test]
    async fn completed_requires_success_and_extraction() {
        let mut failed = TaskRecord::new("tsk_1", TaskStatus::Terminated);
        failed.failure_reason = Some("site blocked the browser".into());
        let service = Scripted::new(vec![Ok(failed)]);
        let err = poll_completed(&service, &TaskId::new("tsk_1"), &fast()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "task tsk_1 ended with status terminated: site blocked the browser"
        );

        let service = Scripted::new(vec![record(TaskStatus::Completed)]);
        let err = poll_completed(&service, &TaskId::new("tsk_1"), &fast()).await.unwrap_err();
        assert!(matches!(err, AuditError::MissingExtraction(_)));
    }
}
