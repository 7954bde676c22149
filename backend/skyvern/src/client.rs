use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use skyaudit_core::{AuditError, CreateTaskRequest, Result, TaskApi, TaskId, TaskRecord};

use crate::retry::{retry_transient, RetryPolicy};

pub const DEFAULT_BASE_URL: &str = "https://api.skyvern.com";

const API_KEY_HEADER: &str = "x-api-key";

/// Skyvern task API client.
///
/// The API key never leaves the process except in the `x-api-key` header.
pub struct SkyvernClient {
    client: Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct CreateTaskResponse {
    task_id: TaskId,
}

impl SkyvernClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Apply a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| AuditError::ConfigError(format!("failed to build HTTP client: {e}")))?;
        Ok(self)
    }

    fn tasks_url(&self) -> String {
        format!("{}/api/v1/tasks", self.base_url)
    }

    /// `{base}/api/v1/tasks/{id}` with the id as one escaped path segment.
    fn task_url(&self, task_id: &TaskId) -> Result<Url> {
        let invalid_base = || {
            AuditError::ConfigError(format!("invalid task API base URL: {}", self.base_url))
        };
        let mut url = Url::parse(&self.tasks_url()).map_err(|_| invalid_base())?;
        url.path_segments_mut()
            .map_err(|_| invalid_base())?
            .push(task_id.as_str());
        Ok(url)
    }

    async fn try_create(&self, request: &CreateTaskRequest) -> Result<TaskId> {
        debug!(url = %request.url, "Sending task to Skyvern");

        let response = self
            .client
            .post(self.tasks_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let created: CreateTaskResponse = read_json(response).await?;
        Ok(created.task_id)
    }

    async fn try_get(&self, task_id: &TaskId) -> Result<TaskRecord> {
        let response = self
            .client
            .get(self.task_url(task_id)?)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AuditError::TaskNotFound(task_id.to_string()));
        }
        read_json(response).await
    }
}

#[async_trait]
impl TaskApi for SkyvernClient {
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<TaskId> {
        let task_id =
            retry_transient(&self.retry, "create_task", move || self.try_create(request)).await?;
        info!(task_id = %task_id, url = %request.url, "Skyvern task created");
        Ok(task_id)
    }

    async fn get_task(&self, task_id: &TaskId) -> Result<TaskRecord> {
        task_id.validate()?;
        retry_transient(&self.retry, "get_task", move || self.try_get(task_id)).await
    }
}

fn transport_error(e: reqwest::Error) -> AuditError {
    AuditError::Transport(e.without_url().to_string())
}

/// Check the status and decode the body, keeping the upstream error text.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        return Err(AuditError::Upstream {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|e| AuditError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use skyaudit_core::{goals, TaskStatus};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SkyvernClient {
        SkyvernClient::new("test-key")
            .with_base_url(server.uri())
            .with_retry(RetryPolicy {
                max_attempts: 2,
                base_delay_ms: 1,
                max_delay_ms: 1,
                jitter: false,
                ..Default::default()
            })
    }

    #[tokio::test]
    async fn create_task_sends_key_and_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/tasks"))
            .and(header("x-api-key", "test-key"))
            .and(body_partial_json(json!({
                "url": "https://example.org",
                "proxy_location": "RESIDENTIAL",
                "extracted_information_schema": {"required": ["has_widget", "reasoning"]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": "tsk_1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let request = goals::widget_check_task("https://example.org", "RESIDENTIAL");
        let task_id = client.create_task(&request).await.unwrap();
        assert_eq!(task_id.as_str(), "tsk_1");
    }

    #[tokio::test]
    async fn get_task_parses_status_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tasks/tsk_7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task_id": "tsk_7",
                "status": "running",
                "request": {"url": "https://example.org"}
            })))
            .mount(&server)
            .await;

        let record = client_for(&server).get_task(&TaskId::new("tsk_7")).await.unwrap();
        assert_eq!(record.status, TaskStatus::Running);
        assert!(record.extra.contains_key("request"));
    }

    #[tokio::test]
    async fn malformed_task_ids_never_reach_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task_id": "tsk_1",
                "status": "completed"
            })))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        for id in ["../workflows", "..", "tsk_1/../../workflows", "tsk?x=1", ""] {
            let err = client.get_task(&TaskId::new(id)).await.unwrap_err();
            assert!(matches!(err, AuditError::InvalidRequest(_)), "{id}: {err}");
        }
    }

    #[test]
    fn task_url_is_a_single_segment_under_tasks() {
        let client = SkyvernClient::new("k").with_base_url("https://api.skyvern.com/");
        let url = client.task_url(&TaskId::new("tsk_42")).unwrap();
        assert_eq!(url.as_str(), "https://api.skyvern.com/api/v1/tasks/tsk_42");
    }

    #[tokio::test]
    async fn unknown_task_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/tasks/tsk_missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_task(&TaskId::new("tsk_missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::TaskNotFound(id) if id == "tsk_missing"));
    }

    #[tokio::test]
    async fn server_errors_are_retried_then_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/tasks"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .expect(2)
            .mount(&server)
            .await;

        let request = goals::widget_check_task("https://example.org", "RESIDENTIAL");
        let err = client_for(&server).create_task(&request).await.unwrap_err();
        assert!(matches!(err, AuditError::Upstream { status: 502, .. }));
    }

    #[tokio::test]
    async fn unauthorized_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/tasks"))
            .respond_with(ResponseTemplate::new(403).set_body_string("invalid api key"))
            .expect(1)
            .mount(&server)
            .await;

        let request = goals::widget_check_task("https://example.org", "RESIDENTIAL");
        let err = client_for(&server).create_task(&request).await.unwrap_err();
        assert_eq!(err.to_string(), "upstream returned 403: invalid api key");
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let request = goals::widget_check_task("https://example.org", "RESIDENTIAL");
        let err = client_for(&server).create_task(&request).await.unwrap_err();
        assert!(matches!(err, AuditError::Decode(_)));
    }
}
