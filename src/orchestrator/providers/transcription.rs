use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::orchestrator::error::ProviderError;
use crate::orchestrator::providers::{build_agent, run_blocking, translate_http_error};
use crate::orchestrator::traits::CapabilityProvider;
use crate::orchestrator::types::CapabilityRequest;

/// 转写供应商的连接参数。
#[derive(Debug, Clone)]
pub struct TranscriptionProviderConfig {
    pub endpoint: String,
    pub request_timeout: Duration,
}

impl TranscriptionProviderConfig {
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        Self {
            endpoint: endpoint.into(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Primary transcription provider: posts the audio to a whisper gateway and
/// reads the transcript out of its JSON reply.
pub struct WhisperGatewayProvider {
    config: TranscriptionProviderConfig,
    agent: ureq::Agent,
}

impl WhisperGatewayProvider {
    pub fn new(config: TranscriptionProviderConfig) -> Self {
        let agent = build_agent(config.request_timeout);
        Self { config, agent }
    }
}

#[async_trait]
impl CapabilityProvider for WhisperGatewayProvider {
    fn id(&self) -> &str {
        "whisper-gateway"
    }

    async fn call(&self, request: &CapabilityRequest) -> Result<String, ProviderError> {
        let audio_path = match request {
            CapabilityRequest::Audio(path) => path.clone(),
            CapabilityRequest::Prompt(_) => {
                return Err(ProviderError::malformed(
                    "whisper gateway only accepts audio requests",
                ));
            }
        };

        let endpoint = self.config.endpoint.clone();
        let agent = self.agent.clone();

        run_blocking(move || {
            let bytes = std::fs::read(&audio_path).map_err(|err| {
                ProviderError::io(format!(
                    "failed to read audio file {}: {err}",
                    audio_path.display()
                ))
            })?;

            let response = agent
                .post(&endpoint)
                .set("Content-Type", "application/octet-stream")
                .send_bytes(&bytes)
                .map_err(translate_http_error)?;

            let body: Value = response
                .into_json()
                .map_err(|err| ProviderError::malformed(format!("invalid JSON reply: {err}")))?;

            body.get("text")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ProviderError::malformed("reply missing `text` field"))
        })
        .await
    }
}

/// Secondary transcription provider: the local NVIDIA Flamingo server, which
/// replies with the transcript as a plain-text body.
pub struct FlamingoProvider {
    config: TranscriptionProviderConfig,
    agent: ureq::Agent,
}

impl FlamingoProvider {
    pub fn new(config: TranscriptionProviderConfig) -> Self {
        let agent = build_agent(config.request_timeout);
        Self { config, agent }
    }
}

#[async_trait]
impl CapabilityProvider for FlamingoProvider {
    fn id(&self) -> &str {
        "flamingo"
    }

    async fn call(&self, request: &CapabilityRequest) -> Result<String, ProviderError> {
        let audio_path = match request {
            CapabilityRequest::Audio(path) => path.clone(),
            CapabilityRequest::Prompt(_) => {
                return Err(ProviderError::malformed(
                    "flamingo only accepts audio requests",
                ));
            }
        };

        let endpoint = self.config.endpoint.clone();
        let agent = self.agent.clone();

        run_blocking(move || {
            let bytes = std::fs::read(&audio_path).map_err(|err| {
                ProviderError::io(format!(
                    "failed to read audio file {}: {err}",
                    audio_path.display()
                ))
            })?;

            let response = agent
                .post(&endpoint)
                .set("Content-Type", "application/octet-stream")
                .send_bytes(&bytes)
                .map_err(translate_http_error)?;

            response
                .into_string()
                .map_err(|err| ProviderError::malformed(format!("unreadable reply body: {err}")))
        })
        .await
    }
}
