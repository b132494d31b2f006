use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::orchestrator::error::ProviderError;
use crate::orchestrator::providers::{build_agent, run_blocking, translate_http_error};
use crate::orchestrator::traits::CapabilityProvider;
use crate::orchestrator::types::CapabilityRequest;

const ANTHROPIC_MAX_TOKENS: u32 = 800;

/// 生成供应商的连接参数。密钥由调用方显式传入，不读全局状态。
#[derive(Debug, Clone)]
pub struct GenerationProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl GenerationProviderConfig {
    pub fn new<U, K, M>(base_url: U, api_key: K, model: M) -> Self
    where
        U: Into<String>,
        K: Into<String>,
        M: Into<String>,
    {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

fn prompt_text(request: &CapabilityRequest, provider: &str) -> Result<String, ProviderError> {
    match request {
        CapabilityRequest::Prompt(text) => Ok(text.clone()),
        CapabilityRequest::Audio(_) => Err(ProviderError::malformed(format!(
            "{provider} only accepts prompt requests"
        ))),
    }
}

/// Primary generation provider: OpenAI chat completions.
pub struct OpenAiChatProvider {
    config: GenerationProviderConfig,
    agent: ureq::Agent,
}

impl OpenAiChatProvider {
    pub fn new(config: GenerationProviderConfig) -> Self {
        let agent = build_agent(config.request_timeout);
        Self { config, agent }
    }
}

#[async_trait]
impl CapabilityProvider for OpenAiChatProvider {
    fn id(&self) -> &str {
        "openai-chat"
    }

    async fn call(&self, request: &CapabilityRequest) -> Result<String, ProviderError> {
        let prompt = prompt_text(request, "openai chat")?;
        let config = self.config.clone();
        let agent = self.agent.clone();

        run_blocking(move || {
            let url = format!("{}/v1/chat/completions", config.base_url);
            let body = json!({
                "model": config.model,
                "messages": [{"role": "user", "content": prompt}],
            });

            let response = agent
                .post(&url)
                .set("Authorization", &format!("Bearer {}", config.api_key))
                .send_json(body)
                .map_err(translate_http_error)?;

            let reply: Value = response
                .into_json()
                .map_err(|err| ProviderError::malformed(format!("invalid JSON reply: {err}")))?;

            reply
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    ProviderError::malformed("reply missing `choices[0].message.content`")
                })
        })
        .await
    }
}

/// Secondary generation provider: Anthropic messages.
pub struct AnthropicMessagesProvider {
    config: GenerationProviderConfig,
    agent: ureq::Agent,
}

impl AnthropicMessagesProvider {
    pub fn new(config: GenerationProviderConfig) -> Self {
        let agent = build_agent(config.request_timeout);
        Self { config, agent }
    }
}

#[async_trait]
impl CapabilityProvider for AnthropicMessagesProvider {
    fn id(&self) -> &str {
        "anthropic-messages"
    }

    async fn call(&self, request: &CapabilityRequest) -> Result<String, ProviderError> {
        let prompt = prompt_text(request, "anthropic messages")?;
        let config = self.config.clone();
        let agent = self.agent.clone();

        run_blocking(move || {
            let url = format!("{}/v1/messages", config.base_url);
            let body = json!({
                "model": config.model,
                "max_tokens": ANTHROPIC_MAX_TOKENS,
                "messages": [{"role": "user", "content": prompt}],
            });

            let response = agent
                .post(&url)
                .set("x-api-key", &config.api_key)
                .set("anthropic-version", "2023-06-01")
                .send_json(body)
                .map_err(translate_http_error)?;

            let reply: Value = response
                .into_json()
                .map_err(|err| ProviderError::malformed(format!("invalid JSON reply: {err}")))?;

            reply
                .pointer("/content/0/text")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ProviderError::malformed("reply missing `content[0].text`"))
        })
        .await
    }
}
