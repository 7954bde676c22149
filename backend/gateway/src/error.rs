use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use skyaudit_core::AuditError;
use skyaudit_logging::redact_sensitive_data;

/// Error returned by gateway handlers. Always rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("too many requests, retry later")]
    RateLimited,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Audit(AuditError::InvalidRequest(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Audit(AuditError::TaskNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Audit(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Audit(AuditError::InvalidRequest(msg)) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// The message as it may appear in logs, with credentials masked.
    pub fn log_message(&self) -> String {
        redact_sensitive_data(&self.message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.log_message(), "Gateway request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self.log_message(), "Gateway request rejected");
        }

        (status, axum::Json(json!({ "error": self.message() }))).into_response()
    }
}
