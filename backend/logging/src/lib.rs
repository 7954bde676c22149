//! Structured logging for SkyAudit.
//!
//! Console and rolling NDJSON file output, secret redaction, and audit
//! lifecycle events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{AuditEvent, EventLogEntry, EventLogger};
pub use logger::{init_logger, LoggerGuard};
pub use redact::redact_sensitive_data;
