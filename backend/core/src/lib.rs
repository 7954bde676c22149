pub mod criteria;
pub mod error;
pub mod goals;
pub mod links;
pub mod traits;
pub mod types;

pub use criteria::CriteriaSet;
pub use error::{AuditError, Result};
pub use goals::{evaluation_task, widget_check_task, DEFAULT_PROXY_LOCATION};
pub use links::{exclude_links, filter_links, is_ignored_link, normalize_site_url, resolve_link};
pub use traits::{AuditService, TaskApi};
pub use types::{
    BatchEntry, CreateTaskRequest, Evaluation, EvaluationBatchRequest, EvaluationBatchResponse,
    SiteCheckRequest, TaskCreated, TaskId, TaskRecord, TaskStatus, WidgetCheck,
};
