//! 外部协作方的接口缝：渲染、转换、存储、通知与学习队列。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use crate::export::error::{ConversionFailure, NotifyError, RenderError, UploadError};
use crate::export::types::DocBlock;

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, blocks: &[DocBlock], docx_path: &Path) -> Result<(), RenderError>;
}

#[async_trait]
pub trait PdfConverter: Send + Sync {
    async fn convert(&self, docx_path: &Path, out_dir: &Path)
        -> Result<PathBuf, ConversionFailure>;
}

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn upload(
        &self,
        local_path: &Path,
        bucket: &str,
        remote_key: &str,
    ) -> Result<(), UploadError>;
}

/// 下游自动化接收的通知载荷。
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WebhookPayload {
    pub docx_url: String,
    pub pdf_url: String,
    pub client_email: Option<String>,
    pub intake_data: serde_json::Value,
}

#[async_trait]
pub trait WebhookNotifier: Send + Sync {
    async fn notify(&self, payload: &WebhookPayload) -> Result<(), NotifyError>;
}

/// Fire-and-forget sinks for the learning pipeline and the edit event log.
/// Failures are isolated by the caller and never abort an export.
#[async_trait]
pub trait LearningSink: Send + Sync {
    async fn log_edit_event(
        &self,
        case_id: &str,
        timestamp: chrono::DateTime<chrono::Utc>,
        text: &str,
    ) -> anyhow::Result<()>;

    async fn queue_for_learning(
        &self,
        case_id: &str,
        edit_type: &str,
        raw_text: &str,
        corrected_text: &str,
    ) -> anyhow::Result<()>;
}
