use async_trait::async_trait;

use crate::orchestrator::error::ProviderError;
use crate::orchestrator::types::CapabilityRequest;

/// Uniform call surface over heterogeneous external providers.
///
/// Implementations own the provider-specific request/response shape
/// translation and nothing else: retry and fallback policy live exclusively
/// in the orchestrator.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    fn id(&self) -> &str;

    async fn call(&self, request: &CapabilityRequest) -> Result<String, ProviderError>;
}
