use std::path::PathBuf;

use crate::orchestrator::error::ProviderError;

/// 可由多个供应商互换实现的抽象能力。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Transcription,
    Generation,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Transcription => "transcription",
            Capability::Generation => "generation",
        }
    }
}

/// 单次能力调用的输入载荷，构造后不可变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityRequest {
    /// 指向待转写音频文件的本地路径。
    Audio(PathBuf),
    /// 生成类能力的提示词文本。
    Prompt(String),
}

impl CapabilityRequest {
    pub fn audio<P: Into<PathBuf>>(path: P) -> Self {
        CapabilityRequest::Audio(path.into())
    }

    pub fn prompt<S: Into<String>>(text: S) -> Self {
        CapabilityRequest::Prompt(text.into())
    }
}

/// 尝试失败的标准化错误码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Rejected,
    Malformed,
    Io,
    /// Assigned by the orchestrator when an attempt exceeds the configured
    /// bound; providers never report this themselves.
    Timeout,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::Rejected => "rejected",
            FailureKind::Malformed => "malformed",
            FailureKind::Io => "io",
            FailureKind::Timeout => "timeout",
        }
    }
}

/// 单个供应商尝试失败的完整上下文。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider_id: String,
    pub kind: FailureKind,
    pub message: String,
}

impl ProviderFailure {
    pub fn new<I: Into<String>, S: Into<String>>(
        provider_id: I,
        kind: FailureKind,
        message: S,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn from_provider_error(provider_id: &str, error: ProviderError) -> Self {
        let kind = match &error {
            ProviderError::Transport { .. } => FailureKind::Transport,
            ProviderError::Rejected { .. } => FailureKind::Rejected,
            ProviderError::Malformed { .. } => FailureKind::Malformed,
            ProviderError::Io { .. } => FailureKind::Io,
        };

        Self::new(provider_id, kind, error.to_string())
    }

    pub fn timeout(provider_id: &str, bound_ms: u64) -> Self {
        Self::new(
            provider_id,
            FailureKind::Timeout,
            format!("attempt exceeded {bound_ms}ms bound"),
        )
    }
}
