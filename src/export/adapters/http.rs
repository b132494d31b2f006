use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::export::collaborators::{LearningSink, StorageClient, WebhookNotifier, WebhookPayload};
use crate::export::error::{NotifyError, UploadError};

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

async fn run_blocking<T, F>(task: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, String> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| format!("blocking http call failed: {err}"))?
}

fn describe_http_error(error: ureq::Error) -> String {
    match error {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            format!("HTTP {status}: {}", body.trim())
        }
        ureq::Error::Transport(transport) => transport.to_string(),
    }
}

/// Media upload against a storage HTTP endpoint
/// (`POST {endpoint}/b/{bucket}/o?name={key}`).
pub struct HttpStorageClient {
    endpoint: String,
    bearer_token: Option<String>,
    agent: ureq::Agent,
}

impl HttpStorageClient {
    pub fn new<S: Into<String>>(endpoint: S, bearer_token: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            bearer_token,
            agent: build_agent(Duration::from_secs(120)),
        }
    }
}

#[async_trait]
impl StorageClient for HttpStorageClient {
    async fn upload(
        &self,
        local_path: &Path,
        bucket: &str,
        remote_key: &str,
    ) -> Result<(), UploadError> {
        let local_path = local_path.to_path_buf();
        let url = format!(
            "{}/b/{bucket}/o?uploadType=media&name={remote_key}",
            self.endpoint
        );
        let key = remote_key.to_string();
        let token = self.bearer_token.clone();
        let agent = self.agent.clone();

        run_blocking(move || {
            let bytes = std::fs::read(&local_path)
                .map_err(|err| format!("failed to read {}: {err}", local_path.display()))?;

            let mut request = agent
                .post(&url)
                .set("Content-Type", "application/octet-stream");
            if let Some(token) = &token {
                request = request.set("Authorization", &format!("Bearer {token}"));
            }

            request
                .send_bytes(&bytes)
                .map(|_| ())
                .map_err(describe_http_error)
        })
        .await
        .map_err(|message| UploadError::new(key, message))
    }
}

/// JSON POST to the workflow webhook receiver.
pub struct HttpWebhookNotifier {
    webhook_url: String,
    agent: ureq::Agent,
}

impl HttpWebhookNotifier {
    pub fn new<S: Into<String>>(webhook_url: S) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            agent: build_agent(Duration::from_secs(30)),
        }
    }
}

#[async_trait]
impl WebhookNotifier for HttpWebhookNotifier {
    async fn notify(&self, payload: &WebhookPayload) -> Result<(), NotifyError> {
        let url = self.webhook_url.clone();
        let body = serde_json::to_value(payload)
            .map_err(|err| NotifyError::new(format!("payload encoding failed: {err}")))?;
        let agent = self.agent.clone();

        run_blocking(move || {
            agent
                .post(&url)
                .send_json(body)
                .map(|_| ())
                .map_err(describe_http_error)
        })
        .await
        .map_err(NotifyError::new)?;

        debug!(target: "export", "webhook POST accepted");
        Ok(())
    }
}

/// Endpoints for the edit-event log and the learning queue.
#[derive(Debug, Clone)]
pub struct LearningEndpoints {
    pub edit_events_url: String,
    pub learning_queue_url: String,
}

/// Fire-and-forget JSON POSTs to the learning-pipeline collaborators.
pub struct HttpLearningSink {
    endpoints: LearningEndpoints,
    agent: ureq::Agent,
}

impl HttpLearningSink {
    pub fn new(endpoints: LearningEndpoints) -> Self {
        Self {
            endpoints,
            agent: build_agent(Duration::from_secs(15)),
        }
    }

    async fn post(&self, url: String, body: serde_json::Value) -> anyhow::Result<()> {
        let agent = self.agent.clone();

        run_blocking(move || {
            agent
                .post(&url)
                .send_json(body)
                .map(|_| ())
                .map_err(describe_http_error)
        })
        .await
        .map_err(|message| anyhow::anyhow!(message))
    }
}

#[async_trait]
impl LearningSink for HttpLearningSink {
    async fn log_edit_event(
        &self,
        case_id: &str,
        timestamp: chrono::DateTime<chrono::Utc>,
        text: &str,
    ) -> anyhow::Result<()> {
        self.post(
            self.endpoints.edit_events_url.clone(),
            json!({
                "case_id": case_id,
                "timestamp": timestamp.to_rfc3339(),
                "text": text,
            }),
        )
        .await
    }

    async fn queue_for_learning(
        &self,
        case_id: &str,
        edit_type: &str,
        raw_text: &str,
        corrected_text: &str,
    ) -> anyhow::Result<()> {
        self.post(
            self.endpoints.learning_queue_url.clone(),
            json!({
                "case_id": case_id,
                "edit_type": edit_type,
                "raw_text": raw_text,
                "corrected_text": corrected_text,
            }),
        )
        .await
    }
}
