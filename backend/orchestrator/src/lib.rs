//! Client side of a SkyAudit run.
//!
//! Talks to an [`AuditService`](skyaudit_core::AuditService) (usually the
//! gateway through [`ProxyClient`]), polls tasks to completion, and fans
//! link evaluations out in batches.

pub mod batch;
pub mod poller;
pub mod proxy_client;
pub mod report;
pub mod workflow;

pub use batch::{chunk, DEFAULT_BATCH_SIZE};
pub use poller::{poll_completed, poll_task, PollPolicy, PolledTask};
pub use proxy_client::{ProxyClient, DEFAULT_PROXY_URL};
pub use report::{AuditReport, ReportSummary};
pub use workflow::{Auditor, EvaluationOutcome, LinkEvaluation, SiteCheck};
