//! 能力编排与降级服务脚手架。

mod engine;

pub mod config;
pub mod error;
pub mod providers;
pub mod traits;
pub mod types;

pub use config::OrchestratorConfig;
pub use engine::FallbackOrchestrator;
pub use error::{OrchestratorError, ProviderError};
pub use traits::CapabilityProvider;
pub use types::{Capability, CapabilityRequest, FailureKind, ProviderFailure};
