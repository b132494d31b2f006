use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::export::collaborators::{
    DocumentRenderer, LearningSink, PdfConverter, StorageClient, WebhookNotifier, WebhookPayload,
};
use crate::export::error::ExportError;
use crate::export::types::{DocBlock, ExportOutcome, IntakeArtifact, IntakeFields, DISCLAIMER_TEXT};
use crate::telemetry::events::record_export_outcome;

/// 导出管线的运行参数。
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub bucket: String,
    pub out_dir: PathBuf,
    /// Storage origin used to build public artifact URLs,
    /// e.g. `https://storage.googleapis.com`.
    pub public_base_url: String,
}

impl ExportConfig {
    pub fn new<B, U>(bucket: B, out_dir: PathBuf, public_base_url: U) -> Self
    where
        B: Into<String>,
        U: Into<String>,
    {
        Self {
            bucket: bucket.into(),
            out_dir,
            public_base_url: public_base_url.into(),
        }
    }

    fn public_url(&self, remote_key: &str) -> String {
        format!("{}/{}/{remote_key}", self.public_base_url, self.bucket)
    }
}

/// Assembles the intake artifact and hands it off to the storage and
/// notification collaborators.
///
/// Failure policy: render and docx upload abort the request; PDF conversion,
/// PDF upload, webhook and learning-sink failures are reported in the
/// outcome and logged, never raised.
pub struct ExportPipeline {
    config: ExportConfig,
    renderer: Arc<dyn DocumentRenderer>,
    converter: Arc<dyn PdfConverter>,
    storage: Arc<dyn StorageClient>,
    notifier: Arc<dyn WebhookNotifier>,
    learning: Arc<dyn LearningSink>,
}

impl ExportPipeline {
    pub fn new(
        config: ExportConfig,
        renderer: Arc<dyn DocumentRenderer>,
        converter: Arc<dyn PdfConverter>,
        storage: Arc<dyn StorageClient>,
        notifier: Arc<dyn WebhookNotifier>,
        learning: Arc<dyn LearningSink>,
    ) -> Self {
        Self {
            config,
            renderer,
            converter,
            storage,
            notifier,
            learning,
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Compose the reviewable intake document. The disclaimer is always the
    /// final block.
    pub fn compose(fields: &IntakeFields, transcript: Option<&str>) -> Vec<DocBlock> {
        let mut blocks = vec![DocBlock::Heading("Client Legal Intake Summary".into())];

        for (key, value) in fields.iter() {
            blocks.push(DocBlock::Paragraph(format!(
                "{}: {value}",
                capitalize(key)
            )));
        }

        if let Some(text) = transcript {
            blocks.push(DocBlock::Heading("Interview Transcript".into()));
            blocks.push(DocBlock::Paragraph(text.to_string()));
        }

        blocks.push(DocBlock::Divider);
        blocks.push(DocBlock::Disclaimer(DISCLAIMER_TEXT.to_string()));
        blocks
    }

    /// Run one export: render, convert, upload, notify.
    pub async fn run(
        &self,
        fields: &IntakeFields,
        transcript: Option<&str>,
    ) -> Result<ExportOutcome, ExportError> {
        let artifact = IntakeArtifact::plan(
            fields,
            Utc::now(),
            &self.config.bucket,
            &self.config.out_dir,
        );
        let blocks = Self::compose(fields, transcript);

        self.renderer.render(&blocks, &artifact.docx_path).await?;

        let conversion_failure = match self
            .converter
            .convert(&artifact.docx_path, &self.config.out_dir)
            .await
        {
            Ok(_pdf) => None,
            Err(failure) => {
                warn!(
                    target: "export",
                    base_name = %artifact.base_name,
                    error = %failure,
                    "pdf conversion failed, continuing with docx only"
                );
                Some(failure)
            }
        };

        self.storage
            .upload(&artifact.docx_path, &artifact.bucket, &artifact.remote_docx)
            .await
            .map_err(ExportError::Upload)?;

        let pdf_uploaded = if conversion_failure.is_none() {
            match self
                .storage
                .upload(&artifact.pdf_path, &artifact.bucket, &artifact.remote_pdf)
                .await
            {
                Ok(()) => true,
                Err(err) => {
                    warn!(
                        target: "export",
                        base_name = %artifact.base_name,
                        error = %err,
                        "pdf upload failed, docx remains available"
                    );
                    false
                }
            }
        } else {
            false
        };

        let payload = WebhookPayload {
            docx_url: self.config.public_url(&artifact.remote_docx),
            pdf_url: self.config.public_url(&artifact.remote_pdf),
            client_email: fields.client_email().map(str::to_string),
            intake_data: fields.to_json(),
        };

        let notified = match self.notifier.notify(&payload).await {
            Ok(()) => {
                info!(
                    target: "export",
                    base_name = %artifact.base_name,
                    "webhook notified"
                );
                true
            }
            Err(err) => {
                warn!(
                    target: "export",
                    base_name = %artifact.base_name,
                    error = %err,
                    "webhook notify failed"
                );
                false
            }
        };

        record_export_outcome(
            &artifact.base_name,
            conversion_failure.is_none(),
            pdf_uploaded,
            notified,
        );

        Ok(ExportOutcome {
            artifact,
            conversion_failure,
            pdf_uploaded,
            notified,
        })
    }

    /// Upload a client-provided source file plus a sidecar metadata record
    /// under `locked_sources/{client_id}/`.
    pub async fn upload_locked_document(
        &self,
        file_path: &std::path::Path,
        client_id: &str,
        filename: &str,
    ) -> Result<(), ExportError> {
        let remote_path = format!("locked_sources/{client_id}/{filename}");
        let metadata_path = self.config.out_dir.join(format!("{filename}.meta.json"));
        let metadata = json!({
            "locked": true,
            "uploaded_by": client_id,
            "timestamp": Utc::now().to_rfc3339(),
        });

        tokio::fs::write(&metadata_path, metadata.to_string())
            .await
            .map_err(|err| ExportError::Staging {
                message: format!(
                    "failed to write metadata {}: {err}",
                    metadata_path.display()
                ),
            })?;

        self.storage
            .upload(file_path, &self.config.bucket, &remote_path)
            .await
            .map_err(ExportError::Upload)?;
        self.storage
            .upload(
                &metadata_path,
                &self.config.bucket,
                &format!("{remote_path}.meta.json"),
            )
            .await
            .map_err(ExportError::Upload)?;

        info!(target: "export", remote_path = %remote_path, "locked upload completed");
        Ok(())
    }

    /// Record a client pause during dictation; forwarded fire-and-forget to
    /// the edit event log.
    pub async fn track_client_pause_event(
        &self,
        case_id: &str,
        timestamp: chrono::DateTime<Utc>,
        segment: &str,
    ) {
        info!(
            target: "export",
            case_id,
            %timestamp,
            segment,
            "pause logged"
        );

        if let Err(err) = self.learning.log_edit_event(case_id, timestamp, segment).await {
            warn!(target: "export", case_id, error = %err, "edit event sink failed");
        }
    }

    /// Queue a correction pair for the learning pipeline, fire-and-forget.
    pub async fn queue_for_learning(
        &self,
        case_id: &str,
        edit_type: &str,
        raw_text: &str,
        corrected_text: &str,
    ) {
        if let Err(err) = self
            .learning
            .queue_for_learning(case_id, edit_type, raw_text, corrected_text)
            .await
        {
            warn!(target: "export", case_id, error = %err, "learning queue sink failed");
            return;
        }

        info!(
            target: "export",
            case_id,
            edit_type,
            raw_text,
            corrected_text,
            "queued edit for learning"
        );
    }
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
