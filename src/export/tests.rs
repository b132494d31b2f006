use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::export::collaborators::{
    DocumentRenderer, LearningSink, PdfConverter, StorageClient, WebhookNotifier, WebhookPayload,
};
use crate::export::error::{ConversionFailure, NotifyError, RenderError, UploadError};
use crate::export::pipeline::{ExportConfig, ExportPipeline};
use crate::export::types::{DocBlock, IntakeFields, DISCLAIMER_TEXT};
use crate::export::ExportError;

#[derive(Default)]
struct RecordingRenderer {
    rendered: Mutex<Vec<(Vec<DocBlock>, PathBuf)>>,
}

#[async_trait]
impl DocumentRenderer for RecordingRenderer {
    async fn render(&self, blocks: &[DocBlock], docx_path: &Path) -> Result<(), RenderError> {
        self.rendered
            .lock()
            .expect("rendered lock poisoned")
            .push((blocks.to_vec(), docx_path.to_path_buf()));
        Ok(())
    }
}

struct ScriptedConverter {
    fail: bool,
}

#[async_trait]
impl PdfConverter for ScriptedConverter {
    async fn convert(
        &self,
        docx_path: &Path,
        out_dir: &Path,
    ) -> Result<PathBuf, ConversionFailure> {
        if self.fail {
            return Err(ConversionFailure::new("soffice exited with 77"));
        }
        let stem = docx_path.file_stem().unwrap_or(docx_path.as_os_str());
        Ok(out_dir.join(stem).with_extension("pdf"))
    }
}

#[derive(Default)]
struct RecordingStorage {
    uploads: Mutex<Vec<(PathBuf, String, String)>>,
    fail_keys: Vec<String>,
}

impl RecordingStorage {
    fn failing_on<K: Into<String>>(keys: Vec<K>) -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail_keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    fn uploads(&self) -> Vec<(PathBuf, String, String)> {
        self.uploads.lock().expect("uploads lock poisoned").clone()
    }
}

#[async_trait]
impl StorageClient for RecordingStorage {
    async fn upload(
        &self,
        local_path: &Path,
        bucket: &str,
        remote_key: &str,
    ) -> Result<(), UploadError> {
        self.uploads.lock().expect("uploads lock poisoned").push((
            local_path.to_path_buf(),
            bucket.to_string(),
            remote_key.to_string(),
        ));

        if self.fail_keys.iter().any(|k| remote_key.ends_with(k)) {
            return Err(UploadError::new(remote_key, "bucket unreachable"));
        }
        Ok(())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    fail: bool,
    payloads: Mutex<Vec<WebhookPayload>>,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            fail: true,
            payloads: Mutex::new(Vec::new()),
        }
    }

    fn payloads(&self) -> Vec<WebhookPayload> {
        self.payloads.lock().expect("payloads lock poisoned").clone()
    }
}

#[async_trait]
impl WebhookNotifier for RecordingNotifier {
    async fn notify(&self, payload: &WebhookPayload) -> Result<(), NotifyError> {
        self.payloads
            .lock()
            .expect("payloads lock poisoned")
            .push(payload.clone());

        if self.fail {
            return Err(NotifyError::new("HTTP 503: receiver down"));
        }
        Ok(())
    }
}

#[derive(Default)]
struct RecordingLearning {
    events: Mutex<Vec<String>>,
}

#[async_trait]
impl LearningSink for RecordingLearning {
    async fn log_edit_event(
        &self,
        case_id: &str,
        _timestamp: chrono::DateTime<Utc>,
        text: &str,
    ) -> anyhow::Result<()> {
        self.events
            .lock()
            .expect("events lock poisoned")
            .push(format!("edit:{case_id}:{text}"));
        Ok(())
    }

    async fn queue_for_learning(
        &self,
        case_id: &str,
        edit_type: &str,
        _raw_text: &str,
        _corrected_text: &str,
    ) -> anyhow::Result<()> {
        self.events
            .lock()
            .expect("events lock poisoned")
            .push(format!("learn:{case_id}:{edit_type}"));
        Ok(())
    }
}

struct Harness {
    pipeline: ExportPipeline,
    renderer: Arc<RecordingRenderer>,
    storage: Arc<RecordingStorage>,
    notifier: Arc<RecordingNotifier>,
    learning: Arc<RecordingLearning>,
    _out_dir: tempfile::TempDir,
}

fn harness(converter_fails: bool, storage: RecordingStorage, notifier: RecordingNotifier) -> Harness {
    let out_dir = tempfile::tempdir().expect("tempdir");
    let renderer = Arc::new(RecordingRenderer::default());
    let storage = Arc::new(storage);
    let notifier = Arc::new(notifier);
    let learning = Arc::new(RecordingLearning::default());

    let pipeline = ExportPipeline::new(
        ExportConfig::new(
            "intake-bucket",
            out_dir.path().to_path_buf(),
            "https://storage.googleapis.com",
        ),
        Arc::clone(&renderer) as Arc<dyn DocumentRenderer>,
        Arc::new(ScriptedConverter {
            fail: converter_fails,
        }),
        Arc::clone(&storage) as Arc<dyn StorageClient>,
        Arc::clone(&notifier) as Arc<dyn WebhookNotifier>,
        Arc::clone(&learning) as Arc<dyn LearningSink>,
    );

    Harness {
        pipeline,
        renderer,
        storage,
        notifier,
        learning,
        _out_dir: out_dir,
    }
}

fn jane_doe() -> IntakeFields {
    vec![
        ("name", "Jane Doe"),
        ("case_type", "Divorce"),
        ("email", "jane@example.com"),
    ]
    .into_iter()
    .collect()
}

#[test]
fn composed_document_ends_with_verbatim_disclaimer() {
    let blocks = ExportPipeline::compose(&jane_doe(), Some("I would like to file."));

    match blocks.last() {
        Some(DocBlock::Disclaimer(text)) => assert_eq!(text, DISCLAIMER_TEXT),
        other => panic!("final block is not the disclaimer: {other:?}"),
    }

    // Field paragraphs keep submission order ahead of the transcript section.
    assert!(matches!(&blocks[0], DocBlock::Heading(h) if h == "Client Legal Intake Summary"));
    assert!(matches!(&blocks[1], DocBlock::Paragraph(p) if p == "Name: Jane Doe"));
    assert!(blocks
        .iter()
        .any(|b| matches!(b, DocBlock::Paragraph(p) if p == "I would like to file.")));
}

#[tokio::test]
async fn happy_path_uploads_both_artifacts_and_notifies() {
    let h = harness(false, RecordingStorage::default(), RecordingNotifier::default());

    let outcome = h
        .pipeline
        .run(&jane_doe(), None)
        .await
        .expect("export succeeds");

    assert!(outcome.conversion_failure.is_none());
    assert!(outcome.pdf_uploaded);
    assert!(outcome.notified);
    assert!(outcome.artifact.base_name.starts_with("jane_doe_divorce_"));

    let uploads = h.storage.uploads();
    assert_eq!(uploads.len(), 2);
    assert!(uploads[0].2.ends_with(".docx"));
    assert!(uploads[1].2.ends_with(".pdf"));
    assert_eq!(uploads[0].1, "intake-bucket");

    let rendered = h.renderer.rendered.lock().expect("rendered lock poisoned");
    assert_eq!(rendered.len(), 1);

    let payloads = h.notifier.payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].client_email.as_deref(), Some("jane@example.com"));
    assert!(payloads[0]
        .docx_url
        .starts_with("https://storage.googleapis.com/intake-bucket/intakes/divorce/"));
}

#[tokio::test]
async fn conversion_failure_still_uploads_docx_and_reports() {
    let h = harness(true, RecordingStorage::default(), RecordingNotifier::default());

    let outcome = h
        .pipeline
        .run(&jane_doe(), None)
        .await
        .expect("pipeline continues past conversion failure");

    assert!(outcome.conversion_failure.is_some());
    assert!(!outcome.pdf_uploaded);

    let uploads = h.storage.uploads();
    assert_eq!(uploads.len(), 1, "only the docx upload is attempted");
    assert!(uploads[0].2.ends_with(".docx"));
}

#[tokio::test]
async fn pdf_upload_failure_is_reported_not_raised() {
    let h = harness(
        false,
        RecordingStorage::failing_on(vec![".pdf"]),
        RecordingNotifier::default(),
    );

    let outcome = h
        .pipeline
        .run(&jane_doe(), None)
        .await
        .expect("pdf upload failure is non-fatal");

    assert!(outcome.conversion_failure.is_none());
    assert!(!outcome.pdf_uploaded);
    assert!(outcome.notified);
}

#[tokio::test]
async fn docx_upload_failure_aborts_the_request() {
    let h = harness(
        false,
        RecordingStorage::failing_on(vec![".docx"]),
        RecordingNotifier::default(),
    );

    let error = h
        .pipeline
        .run(&jane_doe(), None)
        .await
        .expect_err("docx upload failure is fatal");

    assert!(matches!(error, ExportError::Upload(_)));
    assert!(h.notifier.payloads().is_empty(), "no webhook after abort");
}

#[tokio::test]
async fn webhook_failure_leaves_outcome_unnotified() {
    let h = harness(false, RecordingStorage::default(), RecordingNotifier::failing());

    let outcome = h
        .pipeline
        .run(&jane_doe(), None)
        .await
        .expect("webhook failure is non-fatal");

    assert!(!outcome.notified);
    assert_eq!(h.notifier.payloads().len(), 1);
}

#[tokio::test]
async fn locked_upload_sends_file_and_sidecar_metadata() {
    let h = harness(false, RecordingStorage::default(), RecordingNotifier::default());
    let source = h._out_dir.path().join("deed.pdf");
    tokio::fs::write(&source, b"scanned deed")
        .await
        .expect("write source");

    h.pipeline
        .upload_locked_document(&source, "client-42", "deed.pdf")
        .await
        .expect("locked upload succeeds");

    let uploads = h.storage.uploads();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0].2, "locked_sources/client-42/deed.pdf");
    assert_eq!(uploads[1].2, "locked_sources/client-42/deed.pdf.meta.json");

    let metadata = tokio::fs::read_to_string(&uploads[1].0)
        .await
        .expect("metadata staged locally");
    let value: serde_json::Value = serde_json::from_str(&metadata).expect("metadata is json");
    assert_eq!(value["locked"], serde_json::Value::Bool(true));
    assert_eq!(value["uploaded_by"], "client-42");
}

#[tokio::test]
async fn pause_events_and_learning_queue_are_forwarded() {
    let h = harness(false, RecordingStorage::default(), RecordingNotifier::default());

    h.pipeline
        .track_client_pause_event("case-7", Utc::now(), "then he said")
        .await;
    h.pipeline
        .queue_for_learning("case-7", "substitution", "there", "their")
        .await;

    let events = h.learning.events.lock().expect("events lock poisoned");
    assert_eq!(
        *events,
        vec![
            "edit:case-7:then he said".to_string(),
            "learn:case-7:substitution".to_string()
        ]
    );
}
