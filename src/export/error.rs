use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("document rendering failed: {message}")]
pub struct RenderError {
    pub message: String,
}

impl RenderError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// PDF 转换失败；对管线非致命，记录后继续。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("pdf conversion failed: {message}")]
pub struct ConversionFailure {
    pub message: String,
}

impl ConversionFailure {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("upload of {remote_key} failed: {message}")]
pub struct UploadError {
    pub remote_key: String,
    pub message: String,
}

impl UploadError {
    pub fn new<K: Into<String>, S: Into<String>>(remote_key: K, message: S) -> Self {
        Self {
            remote_key: remote_key.into(),
            message: message.into(),
        }
    }
}

/// Webhook 通知失败；记录后继续，绝不向上抛出。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("webhook notify failed: {message}")]
pub struct NotifyError {
    pub message: String,
}

impl NotifyError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failures that abort an export request. A failed PDF or webhook never
/// appears here; those are reported through `ExportOutcome`.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("required upload failed: {0}")]
    Upload(UploadError),
    #[error("artifact staging failed: {message}")]
    Staging { message: String },
}
