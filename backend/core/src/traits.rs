use async_trait::async_trait;

use crate::error::Result;
use crate::types::{BatchEntry, CreateTaskRequest, TaskId, TaskRecord};

/// Low-level access to the external browser-automation task API.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Submit a task and return the identifier the API assigned to it.
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<TaskId>;

    /// Fetch the current status document of a task.
    async fn get_task(&self, task_id: &TaskId) -> Result<TaskRecord>;
}

/// The audit operations the orchestrator drives.
///
/// Implemented in-process on top of a [`TaskApi`], and over HTTP against the
/// proxy service.
#[async_trait]
pub trait AuditService: Send + Sync {
    /// Start the homepage widget check and link extraction for `url`.
    async fn start_site_check(&self, url: &str) -> Result<TaskId>;

    async fn task_status(&self, task_id: &TaskId) -> Result<TaskRecord>;

    /// Start one evaluation task per URL against the given criteria.
    async fn start_evaluation_batch(
        &self,
        urls: &[String],
        criteria: &[String],
    ) -> Result<Vec<BatchEntry>>;
}
