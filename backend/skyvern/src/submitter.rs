use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::{debug, info};

use skyaudit_core::{
    evaluation_task, normalize_site_url, widget_check_task, AuditError, AuditService, BatchEntry,
    Result, TaskApi, TaskId, TaskRecord, DEFAULT_PROXY_LOCATION,
};

/// Turns audit requests into task API calls carrying the right extraction
/// goal and schema.
pub struct TaskSubmitter<A> {
    api: A,
    proxy_location: String,
}

impl<A: TaskApi> TaskSubmitter<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            proxy_location: DEFAULT_PROXY_LOCATION.to_string(),
        }
    }

    pub fn with_proxy_location(mut self, location: impl Into<String>) -> Self {
        self.proxy_location = location.into();
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    async fn submit_evaluation(&self, url: &str, criteria: &[String]) -> Result<BatchEntry> {
        let site = normalize_site_url(url)?;
        let request = evaluation_task(&site, criteria, &self.proxy_location);
        let task_id = self.api.create_task(&request).await?;
        debug!(url, task_id = %task_id, "Evaluation task submitted");
        Ok(BatchEntry {
            url: url.to_string(),
            task_id,
        })
    }
}

#[async_trait]
impl<A: TaskApi> AuditService for TaskSubmitter<A> {
    async fn start_site_check(&self, url: &str) -> Result<TaskId> {
        let site = normalize_site_url(url)?;
        let request = widget_check_task(&site, &self.proxy_location);
        self.api.create_task(&request).await
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<TaskRecord> {
        task_id.validate()?;
        self.api.get_task(task_id).await
    }

    async fn start_evaluation_batch(
        &self,
        urls: &[String],
        criteria: &[String],
    ) -> Result<Vec<BatchEntry>> {
        if urls.is_empty() {
            return Err(AuditError::InvalidRequest("urls must not be empty".into()));
        }
        if criteria.is_empty() {
            return Err(AuditError::InvalidRequest(
                "evaluation_criteria must not be empty".into(),
            ));
        }

        let entries =
            try_join_all(urls.iter().map(|url| self.submit_evaluation(url, criteria))).await?;
        info!(count = entries.len(), "Evaluation batch submitted");
        Ok(entries)
    }
}
