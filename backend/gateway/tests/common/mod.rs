use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use skyaudit_core::{
    AuditError, AuditService, BatchEntry, Result, TaskId, TaskRecord, TaskStatus,
};
use skyaudit_gateway::{build_router, GatewayState, RateLimiter};

/// In-memory audit service recording the calls it receives.
#[derive(Default)]
pub struct MockService {
    pub site_checks: Mutex<Vec<String>>,
    pub batches: Mutex<Vec<(Vec<String>, Vec<String>)>>,
    pub fail_upstream: bool,
}

#[async_trait]
impl AuditService for MockService {
    async fn start_site_check(&self, url: &str) -> Result<TaskId> {
        if self.fail_upstream {
            return Err(AuditError::Upstream {
                status: 401,
                body: "invalid api key".into(),
            });
        }
        self.site_checks.lock().unwrap().push(url.to_string());
        Ok(TaskId::new("tsk_check"))
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<TaskRecord> {
        match task_id.as_str() {
            "tsk_done" => {
                let mut record = TaskRecord::new("tsk_done", TaskStatus::Completed)
                    .with_extraction(json!({"has_widget": true, "reasoning": "toolbar"}));
                record
                    .extra
                    .insert("recording_url".into(), json!("https://example.com/r.webm"));
                Ok(record)
            }
            "tsk_raw" => Ok(serde_json::from_value(json!({
                "task_id": "tsk_raw",
                "status": "complete",
                "extracted_information": null,
                "failure_reason": null,
                "created_at": "2024-06-01T10:00:00"
            }))
            .unwrap()),
            other => Err(AuditError::TaskNotFound(other.to_string())),
        }
    }

    async fn start_evaluation_batch(
        &self,
        urls: &[String],
        criteria: &[String],
    ) -> Result<Vec<BatchEntry>> {
        self.batches
            .lock()
            .unwrap()
            .push((urls.to_vec(), criteria.to_vec()));
        Ok(urls
            .iter()
            .enumerate()
            .map(|(i, url)| BatchEntry {
                url: url.clone(),
                task_id: TaskId::new(format!("tsk_eval_{i}")),
            })
            .collect())
    }
}

pub fn build_test_app(service: Arc<MockService>) -> Router {
    build_router(GatewayState::new(service).with_max_batch_urls(3))
}

pub fn build_app_with(service: Arc<MockService>, token: Option<&str>, limiter: RateLimiter) -> Router {
    build_router(
        GatewayState::new(service)
            .with_access_token(token.map(str::to_string))
            .with_rate_limiter(limiter),
    )
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    app.oneshot(
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
