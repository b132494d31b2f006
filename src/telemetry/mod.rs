//! 观测性初始化脚手架。

pub mod events;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Install the global subscriber. When `INTAKE_LOG_DIR` is set, a daily
/// rolling JSON log is written there in addition to stderr; the returned
/// guard must stay alive for the process lifetime.
pub fn init_tracing() -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false);
    let registry = Registry::default().with(env_filter).with(fmt_layer);

    if let Ok(log_dir) = std::env::var("INTAKE_LOG_DIR") {
        let appender = tracing_appender::rolling::daily(log_dir, "intake-core.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let file_layer = fmt::layer().json().with_ansi(false).with_writer(writer);

        tracing::subscriber::set_global_default(registry.with(file_layer))
            .expect("failed to set global subscriber");
        return Some(guard);
    }

    tracing::subscriber::set_global_default(registry).expect("failed to set global subscriber");
    None
}
