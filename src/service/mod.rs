//! 接案提交的 HTTP 托管服务。
//!
//! One logical flow per submission: transcribe if audio is attached, generate
//! the narrative if a prompt is present, then run the export pipeline. The
//! launcher owns bootstrap; `serve` just binds the port it was handed and a
//! bind failure propagates so the launcher can count it as a failed attempt.

use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::export::{ExportError, ExportOutcome, ExportPipeline, IntakeFields};
use crate::orchestrator::{
    Capability, CapabilityRequest, FallbackOrchestrator, OrchestratorError,
};

pub struct AppState {
    pub orchestrator: FallbackOrchestrator,
    pub pipeline: ExportPipeline,
}

impl AppState {
    pub fn new(orchestrator: FallbackOrchestrator, pipeline: ExportPipeline) -> Self {
        Self {
            orchestrator,
            pipeline,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntakeFieldEntry {
    pub key: String,
    pub value: String,
}

/// 一次接案提交。字段顺序即文档渲染顺序。
#[derive(Debug, Clone, Deserialize)]
pub struct IntakeSubmission {
    pub fields: Vec<IntakeFieldEntry>,
    pub audio_path: Option<String>,
    pub narrative_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IntakeResponse {
    pub base_name: String,
    pub remote_docx: String,
    pub remote_pdf: String,
    pub pdf_uploaded: bool,
    pub notified: bool,
    pub conversion_failed: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub failures: Vec<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/intake", post(intake))
        .with_state(state)
}

/// Bind the launcher-selected port and serve until shutdown.
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind 127.0.0.1:{port}"))?;

    info!(target: "service", port, "intake service listening");
    axum::serve(listener, router(state))
        .await
        .context("intake service terminated")
}

async fn healthz() -> &'static str {
    "ok"
}

async fn intake(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<IntakeSubmission>,
) -> Result<Json<IntakeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let fields: IntakeFields = submission
        .fields
        .iter()
        .map(|entry| (entry.key.clone(), entry.value.clone()))
        .collect();

    let transcript = match &submission.audio_path {
        Some(path) => Some(
            state
                .orchestrator
                .invoke(Capability::Transcription, &CapabilityRequest::audio(path))
                .await
                .map_err(exhausted_response)?,
        ),
        None => None,
    };

    let narrative = match &submission.narrative_prompt {
        Some(prompt) => {
            let prompt = match &transcript {
                Some(text) => format!("{prompt}\n\nInterview transcript:\n{text}"),
                None => prompt.clone(),
            };
            Some(
                state
                    .orchestrator
                    .invoke(Capability::Generation, &CapabilityRequest::prompt(prompt))
                    .await
                    .map_err(exhausted_response)?,
            )
        }
        None => None,
    };

    let document_text = narrative.or(transcript);
    let outcome = state
        .pipeline
        .run(&fields, document_text.as_deref())
        .await
        .map_err(export_response)?;

    Ok(Json(to_response(outcome)))
}

fn to_response(outcome: ExportOutcome) -> IntakeResponse {
    IntakeResponse {
        base_name: outcome.artifact.base_name,
        remote_docx: outcome.artifact.remote_docx,
        remote_pdf: outcome.artifact.remote_pdf,
        pdf_uploaded: outcome.pdf_uploaded,
        notified: outcome.notified,
        conversion_failed: outcome.conversion_failure.is_some(),
    }
}

fn exhausted_response(error: OrchestratorError) -> (StatusCode, Json<ErrorResponse>) {
    let OrchestratorError::AllProvidersExhausted {
        capability,
        failures,
    } = error;

    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: format!("{} providers exhausted", capability.as_str()),
            failures: failures
                .iter()
                .map(|f| format!("{}: {} ({})", f.provider_id, f.kind.as_str(), f.message))
                .collect(),
        }),
    )
}

fn export_response(error: ExportError) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: error.to_string(),
            failures: Vec::new(),
        }),
    )
}
