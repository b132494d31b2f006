//! 接案文档导出管线脚手架。

pub mod adapters;
pub mod collaborators;
pub mod error;
pub mod naming;
pub mod pipeline;
pub mod types;

pub use collaborators::{
    DocumentRenderer, LearningSink, PdfConverter, StorageClient, WebhookNotifier, WebhookPayload,
};
pub use error::{ConversionFailure, ExportError, NotifyError, RenderError, UploadError};
pub use pipeline::{ExportConfig, ExportPipeline};
pub use types::{DocBlock, ExportOutcome, IntakeArtifact, IntakeFields, DISCLAIMER_TEXT};

#[cfg(test)]
mod tests;
