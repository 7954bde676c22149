use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use skyaudit_core::{
    EvaluationBatchRequest, EvaluationBatchResponse, SiteCheckRequest, TaskCreated, TaskId,
    TaskRecord,
};

use crate::auth::RequireAuth;
use crate::error::{ApiError, ApiResult};
use crate::server::GatewayState;

/// Health check endpoint.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "skyaudit-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Handler for `POST /initiate-check-and-extract-task`.
pub async fn initiate_check(
    State(state): State<GatewayState>,
    _auth: RequireAuth,
    payload: Result<Json<SiteCheckRequest>, JsonRejection>,
) -> ApiResult<Json<TaskCreated>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if request.url.trim().is_empty() {
        return Err(ApiError::BadRequest("url is required".into()));
    }

    let task_id = state.service.start_site_check(&request.url).await?;
    info!(url = %request.url, task_id = %task_id, "Widget check task started");
    Ok(Json(TaskCreated { task_id }))
}

/// Handler for `GET /task-status/:task_id`. Returns the task document as
/// the task API reported it.
pub async fn task_status(
    State(state): State<GatewayState>,
    _auth: RequireAuth,
    Path(task_id): Path<String>,
) -> ApiResult<Json<TaskRecord>> {
    let task_id = TaskId::new(task_id);
    task_id.validate()?;
    let record = state.service.task_status(&task_id).await?;
    Ok(Json(record))
}

/// Handler for `POST /initiate-evaluation-task-batch`.
pub async fn initiate_evaluation_batch(
    State(state): State<GatewayState>,
    _auth: RequireAuth,
    payload: Result<Json<EvaluationBatchRequest>, JsonRejection>,
) -> ApiResult<Json<EvaluationBatchResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if request.urls.is_empty() {
        return Err(ApiError::BadRequest("urls must contain at least one url".into()));
    }
    if request.urls.len() > state.max_batch_urls {
        return Err(ApiError::BadRequest(format!(
            "at most {} urls may be submitted per batch, got {}",
            state.max_batch_urls,
            request.urls.len()
        )));
    }
    if request.urls.iter().any(|u| u.trim().is_empty()) {
        return Err(ApiError::BadRequest("urls must not contain empty entries".into()));
    }
    if request.evaluation_criteria.is_empty() {
        return Err(ApiError::BadRequest("evaluation_criteria must not be empty".into()));
    }

    let batch_responses = state
        .service
        .start_evaluation_batch(&request.urls, &request.evaluation_criteria)
        .await?;
    info!(count = batch_responses.len(), "Evaluation batch started");
    Ok(Json(EvaluationBatchResponse { batch_responses }))
}
