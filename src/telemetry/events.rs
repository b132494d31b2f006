use serde::Serialize;
use std::time::Duration;
use tracing::{error, info, warn};

pub(crate) const TARGET: &str = "telemetry::intake";
pub(crate) const EVENT_FALLBACK: &str = "provider_fallback";
pub(crate) const EVENT_EXHAUSTED: &str = "chain_exhausted";
pub(crate) const EVENT_LAUNCH: &str = "launch_attempt";
pub(crate) const EVENT_EXPORT: &str = "export_outcome";

#[derive(Debug, Serialize)]
pub struct ProviderFallbackEvent {
    pub capability: &'static str,
    pub provider_id: String,
    pub attempt: usize,
    pub kind: &'static str,
    pub latency_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ChainExhaustedEvent {
    pub capability: &'static str,
    pub attempts: usize,
    pub kinds: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct LaunchAttemptEvent {
    pub attempt: u32,
    pub port: Option<u16>,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ExportOutcomeEvent {
    pub base_name: String,
    pub pdf_converted: bool,
    pub pdf_uploaded: bool,
    pub notified: bool,
}

pub fn record_provider_fallback(
    capability: &'static str,
    provider_id: &str,
    attempt: usize,
    kind: &'static str,
    latency: Duration,
) {
    let event = ProviderFallbackEvent {
        capability,
        provider_id: provider_id.to_string(),
        attempt,
        kind,
        latency_ms: duration_to_ms(latency),
    };

    match serde_json::to_string(&event) {
        Ok(payload) => warn!(
            target: TARGET,
            event = EVENT_FALLBACK,
            capability = event.capability,
            provider_id = %event.provider_id,
            attempt = event.attempt,
            kind = event.kind,
            latency_ms = event.latency_ms,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_FALLBACK,
            %err,
            "failed to encode provider fallback event"
        ),
    }
}

pub fn record_chain_exhausted(capability: &'static str, kinds: Vec<&'static str>) {
    let event = ChainExhaustedEvent {
        capability,
        attempts: kinds.len(),
        kinds,
    };

    match serde_json::to_string(&event) {
        Ok(payload) => error!(
            target: TARGET,
            event = EVENT_EXHAUSTED,
            capability = event.capability,
            attempts = event.attempts,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_EXHAUSTED,
            %err,
            "failed to encode chain exhausted event"
        ),
    }
}

pub fn record_launch_attempt(attempt: u32, port: Option<u16>, reason: &str) {
    let event = LaunchAttemptEvent {
        attempt,
        port,
        reason: reason.to_string(),
    };

    match serde_json::to_string(&event) {
        Ok(payload) => warn!(
            target: TARGET,
            event = EVENT_LAUNCH,
            attempt = event.attempt,
            port = event.port,
            reason = %event.reason,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_LAUNCH,
            %err,
            "failed to encode launch attempt event"
        ),
    }
}

pub fn record_export_outcome(
    base_name: &str,
    pdf_converted: bool,
    pdf_uploaded: bool,
    notified: bool,
) {
    let event = ExportOutcomeEvent {
        base_name: base_name.to_string(),
        pdf_converted,
        pdf_uploaded,
        notified,
    };

    match serde_json::to_string(&event) {
        Ok(payload) => info!(
            target: TARGET,
            event = EVENT_EXPORT,
            base_name = %event.base_name,
            pdf_converted = event.pdf_converted,
            pdf_uploaded = event.pdf_uploaded,
            notified = event.notified,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_EXPORT,
            %err,
            "failed to encode export outcome event"
        ),
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    duration.as_millis().min(u64::MAX as u128) as u64
}
