//! Audit Event Logger
//!
//! Task lifecycle events emitted under the `audit_events` target, so they
//! can be filtered into their own stream.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    TaskSubmitted {
        task_id: String,
        url: String,
        kind: String,
    },
    TaskFinished {
        task_id: String,
        status: String,
        polls: u32,
    },
    BatchFailed {
        urls: Vec<String>,
        error_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Emit one audit event. Error text is redacted first.
    pub fn log_event(run_id: &str, mut event: AuditEvent) {
        if let AuditEvent::BatchFailed { error_msg, .. } = &mut event {
            *error_msg = redact_sensitive_data(error_msg);
        }
        let failed = matches!(event, AuditEvent::BatchFailed { .. });

        let entry = EventLogEntry {
            run_id: run_id.into(),
            timestamp: Utc::now(),
            event,
        };
        let payload = serde_json::to_string(&entry).unwrap_or_default();

        if failed {
            warn!(target: "audit_events", event = %payload, "Audit event");
        } else {
            info!(target: "audit_events", event = %payload, "Audit event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = AuditEvent::TaskFinished {
            task_id: "tsk_9".into(),
            status: "completed".into(),
            polls: 4,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "task_finished");
        assert_eq!(json["polls"], 4);
    }

    #[test]
    fn batch_failure_is_logged_without_panicking() {
        EventLogger::log_event(
            "run-1",
            AuditEvent::BatchFailed {
                urls: vec!["https://example.org/a".into()],
                error_msg: "upstream returned 401: x-api-key: bad-key".into(),
            },
        );
    }
}
