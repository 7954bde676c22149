use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use skyaudit_core::{
    AuditError, AuditService, BatchEntry, EvaluationBatchRequest, EvaluationBatchResponse, Result,
    SiteCheckRequest, TaskCreated, TaskId, TaskRecord,
};

pub const DEFAULT_PROXY_URL: &str = "http://localhost:3000";

/// [`AuditService`] backed by a running gateway.
pub struct ProxyClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuditError::ConfigError(format!("failed to build HTTP client: {e}")))?;
        Ok(self)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| AuditError::Transport(e.without_url().to_string()))?;
        read_json(response).await
    }
}

#[async_trait]
impl AuditService for ProxyClient {
    async fn start_site_check(&self, url: &str) -> Result<TaskId> {
        let body = SiteCheckRequest { url: url.to_string() };
        let created: TaskCreated = self
            .send(
                self.client
                    .post(format!("{}/initiate-check-and-extract-task", self.base_url))
                    .json(&body),
            )
            .await?;
        debug!(task_id = %created.task_id, "Proxy accepted widget check");
        Ok(created.task_id)
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<TaskRecord> {
        task_id.validate()?;
        let result: Result<TaskRecord> = self
            .send(self.client.get(format!("{}/task-status/{}", self.base_url, task_id)))
            .await;
        match result {
            Err(AuditError::TaskNotFound(_)) => Err(AuditError::TaskNotFound(task_id.to_string())),
            other => other,
        }
    }

    async fn start_evaluation_batch(
        &self,
        urls: &[String],
        criteria: &[String],
    ) -> Result<Vec<BatchEntry>> {
        let body = EvaluationBatchRequest {
            urls: urls.to_vec(),
            evaluation_criteria: criteria.to_vec(),
        };
        let response: EvaluationBatchResponse = self
            .send(
                self.client
                    .post(format!("{}/initiate-evaluation-task-batch", self.base_url))
                    .json(&body),
            )
            .await?;
        Ok(response.batch_responses)
    }
}

/// Decode a gateway response, turning `{"error": ...}` bodies into errors.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| AuditError::Transport(e.without_url().to_string()))?;

    if status.is_success() {
        return serde_json::from_str(&body).map_err(|e| AuditError::Decode(e.to_string()));
    }

    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body);
    Err(match status {
        StatusCode::BAD_REQUEST => AuditError::InvalidRequest(message),
        StatusCode::NOT_FOUND => AuditError::TaskNotFound(message),
        _ => AuditError::Upstream {
            status: status.as_u16(),
            body: message,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use skyaudit_core::TaskStatus;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn site_check_posts_url_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/initiate-check-and-extract-task"))
            .and(header("authorization", "Bearer s3cret"))
            .and(body_json(json!({"url": "https://example.org"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": "tsk_1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ProxyClient::new(server.uri()).with_access_token(Some("s3cret".into()));
        let task_id = client.start_site_check("https://example.org").await.unwrap();
        assert_eq!(task_id.as_str(), "tsk_1");
    }

    #[tokio::test]
    async fn status_is_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/task-status/tsk_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "task_id": "tsk_1",
                "status": "completed",
                "extracted_information": {"has_widget": false, "reasoning": "none", "links": []}
            })))
            .mount(&server)
            .await;

        let record = ProxyClient::new(server.uri())
            .task_status(&TaskId::new("tsk_1"))
            .await
            .unwrap();
        assert_eq!(record.status, TaskStatus::Completed);
        assert!(record.extracted_information.is_some());
    }

    #[tokio::test]
    async fn batch_response_keeps_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/initiate-evaluation-task-batch"))
            .and(body_json(json!({
                "urls": ["https://example.org/a", "https://example.org/b"],
                "evaluation_criteria": ["Hearing loop"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "batchResponses": [
                    {"url": "https://example.org/a", "task_id": "tsk_a"},
                    {"url": "https://example.org/b", "task_id": "tsk_b"}
                ]
            })))
            .mount(&server)
            .await;

        let entries = ProxyClient::new(server.uri())
            .start_evaluation_batch(
                &["https://example.org/a".into(), "https://example.org/b".into()],
                &["Hearing loop".into()],
            )
            .await
            .unwrap();
        assert_eq!(entries[1].task_id.as_str(), "tsk_b");
    }

    #[tokio::test]
    async fn error_bodies_are_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/initiate-check-and-extract-task"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"error": "upstream returned 401: bad key"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/task-status/tsk_x"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "task not found: tsk_x"})))
            .mount(&server)
            .await;

        let client = ProxyClient::new(server.uri());
        let err = client.start_site_check("https://example.org").await.unwrap_err();
        assert!(
            matches!(&err, AuditError::Upstream { status: 500, body } if body == "upstream returned 401: bad key")
        );
        assert!(err.is_transient());

        let err = client.task_status(&TaskId::new("tsk_x")).await.unwrap_err();
        assert!(matches!(err, AuditError::TaskNotFound(id) if id == "tsk_x"));
    }
}
