use thiserror::Error;

/// Top-level error type for SkyAudit.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("task {task_id} ended with status {status}{}", reason_suffix(.reason))]
    TaskFailed {
        task_id: String,
        status: String,
        reason: Option<String>,
    },

    #[error("task {task_id} still pending after {polls} status checks")]
    PollTimeout { task_id: String, polls: u32 },

    #[error("task {0} completed without extracted information")]
    MissingExtraction(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AuditError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AuditError::Transport(_) => true,
            AuditError::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, AuditError>;
