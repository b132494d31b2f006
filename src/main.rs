use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use intake_core::export::adapters::{
    HttpLearningSink, HttpStorageClient, HttpWebhookNotifier, LearningEndpoints,
    LibreOfficeConverter, LibreOfficeRenderer,
};
use intake_core::export::{ExportConfig, ExportPipeline};
use intake_core::launcher::{ensure_running, LauncherConfig};
use intake_core::orchestrator::providers::{
    AnthropicMessagesProvider, FlamingoProvider, GenerationProviderConfig, OpenAiChatProvider,
    TranscriptionProviderConfig, WhisperGatewayProvider,
};
use intake_core::orchestrator::{CapabilityProvider, FallbackOrchestrator, OrchestratorConfig};
use intake_core::service::{serve, AppState};
use intake_core::telemetry::init_tracing;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn secret(key: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => {
            warn!(target: "bootstrap", key, "api key not set, provider calls will be rejected");
            String::new()
        }
    }
}

fn build_orchestrator() -> FallbackOrchestrator {
    let whisper = WhisperGatewayProvider::new(TranscriptionProviderConfig::new(env_or(
        "INTAKE_WHISPER_URL",
        "http://localhost:5000/whisper/transcribe",
    )));
    let flamingo = FlamingoProvider::new(TranscriptionProviderConfig::new(env_or(
        "INTAKE_FLAMINGO_URL",
        "http://localhost:5001/flamingo/transcribe",
    )));

    let openai = OpenAiChatProvider::new(GenerationProviderConfig::new(
        env_or("INTAKE_OPENAI_BASE_URL", "https://api.openai.com"),
        secret("OPENAI_API_KEY"),
        env_or("INTAKE_OPENAI_MODEL", "gpt-4"),
    ));
    let anthropic = AnthropicMessagesProvider::new(GenerationProviderConfig::new(
        env_or("INTAKE_ANTHROPIC_BASE_URL", "https://api.anthropic.com"),
        secret("ANTHROPIC_API_KEY"),
        env_or("INTAKE_ANTHROPIC_MODEL", "claude-3-opus-20240229"),
    ));

    FallbackOrchestrator::new(
        OrchestratorConfig::default(),
        vec![
            Arc::new(whisper) as Arc<dyn CapabilityProvider>,
            Arc::new(flamingo) as Arc<dyn CapabilityProvider>,
        ],
        vec![
            Arc::new(openai) as Arc<dyn CapabilityProvider>,
            Arc::new(anthropic) as Arc<dyn CapabilityProvider>,
        ],
    )
}

fn build_pipeline() -> ExportPipeline {
    let out_dir = std::env::var("INTAKE_OUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir());

    ExportPipeline::new(
        ExportConfig::new(
            env_or("INTAKE_BUCKET", "client-intake"),
            out_dir,
            env_or("INTAKE_PUBLIC_BASE_URL", "https://storage.googleapis.com"),
        ),
        Arc::new(LibreOfficeRenderer),
        Arc::new(LibreOfficeConverter),
        Arc::new(HttpStorageClient::new(
            env_or(
                "INTAKE_STORAGE_URL",
                "https://storage.googleapis.com/upload/storage/v1",
            ),
            std::env::var("INTAKE_STORAGE_TOKEN").ok(),
        )),
        Arc::new(HttpWebhookNotifier::new(env_or(
            "INTAKE_WEBHOOK_URL",
            "http://localhost:5678/webhook/intake",
        ))),
        Arc::new(HttpLearningSink::new(LearningEndpoints {
            edit_events_url: env_or(
                "INTAKE_EDIT_EVENTS_URL",
                "http://localhost:7000/events/edits",
            ),
            learning_queue_url: env_or(
                "INTAKE_LEARNING_QUEUE_URL",
                "http://localhost:7000/learning/queue",
            ),
        })),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = init_tracing();

    let state = Arc::new(AppState::new(build_orchestrator(), build_pipeline()));

    // Exhaustion is terminal and already logged; there is no caller above
    // this point that could recover, so the process just winds down.
    ensure_running(
        |port| serve(port, Arc::clone(&state)),
        LauncherConfig::default(),
    )
    .await;

    Ok(())
}
