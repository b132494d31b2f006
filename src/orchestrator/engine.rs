use std::sync::Arc;
use std::time::Instant;

use tokio::time::timeout;
use tracing::{debug, info};

use crate::orchestrator::config::OrchestratorConfig;
use crate::orchestrator::error::{OrchestratorError, ProviderError};
use crate::orchestrator::traits::CapabilityProvider;
use crate::orchestrator::types::{Capability, CapabilityRequest, ProviderFailure};
use crate::telemetry::events::{record_chain_exhausted, record_provider_fallback};

/// 按降级优先级编排同一能力的多个供应商。
///
/// Attempts are strictly sequential in chain order; a later provider is only
/// called after the previous one has definitively failed (error, malformed
/// output, or timeout). Chains are immutable after construction and safely
/// shared across concurrent intake requests.
pub struct FallbackOrchestrator {
    config: OrchestratorConfig,
    transcription: Vec<Arc<dyn CapabilityProvider>>,
    generation: Vec<Arc<dyn CapabilityProvider>>,
}

impl FallbackOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        transcription: Vec<Arc<dyn CapabilityProvider>>,
        generation: Vec<Arc<dyn CapabilityProvider>>,
    ) -> Self {
        Self {
            config,
            transcription,
            generation,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    fn chain(&self, capability: Capability) -> &[Arc<dyn CapabilityProvider>] {
        match capability {
            Capability::Transcription => &self.transcription,
            Capability::Generation => &self.generation,
        }
    }

    /// 依链序逐个尝试供应商，返回首个成功结果。
    pub async fn invoke(
        &self,
        capability: Capability,
        request: &CapabilityRequest,
    ) -> Result<String, OrchestratorError> {
        let chain = self.chain(capability);
        let bound = self.config.attempt_timeout;
        let mut failures: Vec<ProviderFailure> = Vec::with_capacity(chain.len());

        for (index, provider) in chain.iter().enumerate() {
            let attempt = index + 1;
            let started = Instant::now();

            debug!(
                target: "orchestrator",
                capability = capability.as_str(),
                provider_id = provider.id(),
                attempt,
                "attempting provider"
            );

            let outcome = timeout(bound, provider.call(request)).await;
            let latency = started.elapsed();

            let failure = match outcome {
                Ok(Ok(text)) if text.trim().is_empty() => ProviderFailure::from_provider_error(
                    provider.id(),
                    ProviderError::malformed("provider returned empty output"),
                ),
                Ok(Ok(text)) => {
                    info!(
                        target: "orchestrator",
                        capability = capability.as_str(),
                        provider_id = provider.id(),
                        attempt,
                        latency_ms = latency.as_millis() as u64,
                        "provider succeeded"
                    );
                    return Ok(text);
                }
                Ok(Err(error)) => ProviderFailure::from_provider_error(provider.id(), error),
                Err(_elapsed) => {
                    ProviderFailure::timeout(provider.id(), bound.as_millis() as u64)
                }
            };

            record_provider_fallback(
                capability.as_str(),
                &failure.provider_id,
                attempt,
                failure.kind.as_str(),
                latency,
            );
            failures.push(failure);
        }

        record_chain_exhausted(
            capability.as_str(),
            failures.iter().map(|f| f.kind.as_str()).collect(),
        );

        Err(OrchestratorError::AllProvidersExhausted {
            capability,
            failures,
        })
    }
}
