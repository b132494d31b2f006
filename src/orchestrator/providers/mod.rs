//! 供应商调用胶水：每个适配器只做请求/响应形状翻译。

mod generation;
mod transcription;

pub use generation::{AnthropicMessagesProvider, GenerationProviderConfig, OpenAiChatProvider};
pub use transcription::{FlamingoProvider, TranscriptionProviderConfig, WhisperGatewayProvider};

use std::time::Duration;

use crate::orchestrator::error::ProviderError;

pub(crate) fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

/// Collapses a ureq error into the provider taxonomy.
pub(crate) fn translate_http_error(error: ureq::Error) -> ProviderError {
    match error {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            ProviderError::rejected(status, body)
        }
        ureq::Error::Transport(transport) => ProviderError::transport(transport.to_string()),
    }
}

pub(crate) async fn run_blocking<T, F>(task: F) -> Result<T, ProviderError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ProviderError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| ProviderError::io(format!("blocking provider call failed: {err}")))?
}
