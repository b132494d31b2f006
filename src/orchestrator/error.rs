use thiserror::Error;

use crate::orchestrator::types::{Capability, ProviderFailure};

/// 单次供应商调用可能返回的类型化失败。
///
/// Raw transport and library errors are translated into this taxonomy at the
/// provider boundary; they never cross the orchestrator contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("transport failure: {message}")]
    Transport { message: String },
    #[error("provider rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("malformed provider output: {message}")]
    Malformed { message: String },
    #[error("io failure: {message}")]
    Io { message: String },
}

impl ProviderError {
    pub fn transport<S: Into<String>>(message: S) -> Self {
        ProviderError::Transport {
            message: message.into(),
        }
    }

    pub fn rejected<S: Into<String>>(status: u16, message: S) -> Self {
        ProviderError::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn malformed<S: Into<String>>(message: S) -> Self {
        ProviderError::Malformed {
            message: message.into(),
        }
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        ProviderError::Io {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Every provider in the chain definitively failed; carries the
    /// per-provider failure records in attempt order.
    #[error("all {capability:?} providers exhausted after {} attempts", .failures.len())]
    AllProvidersExhausted {
        capability: Capability,
        failures: Vec<ProviderFailure>,
    },
}
