//! Deterministic artifact naming.

use chrono::{DateTime, Utc};

/// Spaces and slashes become underscores, everything lower-cased.
pub fn sanitize_component(raw: &str) -> String {
    raw.replace(' ', "_").replace('/', "_").to_lowercase()
}

/// `{name}_{case_type}_{YYYYmmdd-HHMM}`, UTC truncated to the minute.
pub fn base_name(client_name: &str, case_type: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}",
        sanitize_component(client_name),
        sanitize_component(case_type),
        at.format("%Y%m%d-%H%M")
    )
}

pub fn remote_key(case_type: &str, base: &str, extension: &str) -> String {
    format!("intakes/{}/{base}.{extension}", sanitize_component(case_type))
}
