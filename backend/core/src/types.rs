use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque identifier the task API assigns to a submitted task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Task ids are non-empty tokens of ASCII letters, digits, `_` and `-`.
    /// Anything else is refused before it reaches an upstream URL.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.is_well_formed() {
            Ok(())
        } else {
            Err(crate::AuditError::InvalidRequest(format!(
                "malformed task id: {:?}",
                self.0
            )))
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Lifecycle state of a task, as reported by the task API.
///
/// Any spelling other than the canonical names below, including the
/// `complete` and `cancelled` aliases, is kept verbatim in `Other` so status
/// documents pass through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Created,
    Queued,
    Running,
    Completed,
    Failed,
    Terminated,
    Canceled,
    TimedOut,
    Other(String),
}

impl TaskStatus {
    /// Terminal statuses never change again; polling stops on them.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Created | TaskStatus::Queued | TaskStatus::Running)
    }

    pub fn is_success(&self) -> bool {
        match self {
            TaskStatus::Completed => true,
            TaskStatus::Other(s) => s == "complete",
            _ => false,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Created => "created",
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Terminated => "terminated",
            TaskStatus::Canceled => "canceled",
            TaskStatus::TimedOut => "timed_out",
            TaskStatus::Other(s) => s,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "created" => TaskStatus::Created,
            "queued" => TaskStatus::Queued,
            "running" => TaskStatus::Running,
            "completed" => TaskStatus::Completed,
            "failed" => TaskStatus::Failed,
            "terminated" => TaskStatus::Terminated,
            "canceled" => TaskStatus::Canceled,
            "timed_out" => TaskStatus::TimedOut,
            _ => TaskStatus::Other(s),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status document for one task.
///
/// Fields the task API returns beyond the ones modelled here are kept in
/// `extra`, so the proxy can hand the document back untouched. The two
/// optional fields always serialize, as `null` when unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: TaskId,
    pub status: TaskStatus,
    #[serde(default)]
    pub extracted_information: Option<Value>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskRecord {
    pub fn new(task_id: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            task_id: TaskId::new(task_id),
            status,
            extracted_information: None,
            failure_reason: None,
            extra: Map::new(),
        }
    }

    pub fn with_extraction(mut self, info: Value) -> Self {
        self.extracted_information = Some(info);
        self
    }
}

/// Body of a task-creation call to the task API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub url: String,
    pub data_extraction_goal: String,
    pub proxy_location: String,
    pub extracted_information_schema: Value,
}

/// Extraction result of the homepage widget check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetCheck {
    pub has_widget: bool,
    pub reasoning: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub links: Vec<String>,
}

/// Extraction result of one criteria evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub compliance: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub issues: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub passed: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Proxy wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteCheckRequest {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCreated {
    pub task_id: TaskId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationBatchRequest {
    pub urls: Vec<String>,
    pub evaluation_criteria: Vec<String>,
}

/// One submitted evaluation task, paired with the link it evaluates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub url: String,
    pub task_id: TaskId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationBatchResponse {
    #[serde(rename = "batchResponses")]
    pub batch_responses: Vec<BatchEntry>,
}
