//! 自愈式服务引导脚手架。
//!
//! Boots the hosting process: pick an open port, hand it to the service start
//! function, and retry a bounded number of times when startup fails. This is
//! the top of the process; exhaustion degrades to a logged fatal condition
//! instead of propagating, because nothing above it can recover.

use std::future::Future;
use std::net::TcpListener;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info};

use crate::telemetry::events::record_launch_attempt;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LaunchError {
    #[error("no open port in [{base_port}, {base_port}+{window})")]
    NoPortAvailable { base_port: u16, window: u16 },
}

/// 引导参数。
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub base_port: u16,
    pub port_window: u16,
    pub max_retries: u32,
    /// Fixed pause between failed attempts; keeps a crash-on-boot service
    /// from hot-looping through its retry budget.
    pub retry_backoff: Duration,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            base_port: 8000,
            port_window: 50,
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// 单次引导尝试的记录，仅在一次 `ensure_running` 调用内存在。
#[derive(Debug, Clone)]
struct LaunchAttempt {
    attempt: u32,
    port: Option<u16>,
    reason: String,
}

/// 一次引导调用的终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStatus {
    /// The start function ran to a nominal finish.
    Running,
    /// Every attempt failed; the condition was logged, not raised.
    Exhausted,
}

/// Probe `base_port..base_port+window` and return the first port with no
/// active listener.
///
/// The probe binds and immediately drops the listener, so the reservation is
/// best-effort only: another process can claim the port before the service
/// binds it. A lost race surfaces as a start failure and consumes one retry.
pub fn find_open_port(base_port: u16, window: u16) -> Result<u16, LaunchError> {
    for port in base_port..base_port.saturating_add(window) {
        if TcpListener::bind(("127.0.0.1", port)).is_ok() {
            return Ok(port);
        }
    }

    Err(LaunchError::NoPortAvailable { base_port, window })
}

/// Drive the service start function until it runs or the retry budget is
/// spent. Not reentrant; call once at process bootstrap.
pub async fn ensure_running<F, Fut>(mut start: F, config: LauncherConfig) -> LaunchStatus
where
    F: FnMut(u16) -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    for attempt in 1..=config.max_retries {
        let record = match find_open_port(config.base_port, config.port_window) {
            Ok(port) => {
                info!(
                    target: "launcher",
                    attempt,
                    port,
                    "launching service"
                );

                match start(port).await {
                    Ok(()) => return LaunchStatus::Running,
                    Err(err) => LaunchAttempt {
                        attempt,
                        port: Some(port),
                        reason: format!("{err:#}"),
                    },
                }
            }
            // A fully occupied window counts as one attempt too.
            Err(err) => LaunchAttempt {
                attempt,
                port: None,
                reason: err.to_string(),
            },
        };

        record_launch_attempt(record.attempt, record.port, &record.reason);

        if attempt < config.max_retries {
            tokio::time::sleep(config.retry_backoff).await;
        }
    }

    error!(
        target: "launcher",
        max_retries = config.max_retries,
        "service could not be launched, giving up"
    );
    LaunchStatus::Exhausted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn test_config() -> LauncherConfig {
        LauncherConfig {
            retry_backoff: Duration::from_millis(1),
            ..LauncherConfig::default()
        }
    }

    #[test]
    fn probe_skips_bound_ports() {
        // Bind an ephemeral port, then probe a window starting at it.
        let holder = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral");
        let held = holder.local_addr().expect("local addr").port();

        let picked = find_open_port(held, 10).expect("window has free ports");
        assert_ne!(picked, held);
        assert!((picked as u32) > held as u32 && (picked as u32) < held as u32 + 10);
    }

    #[test]
    fn fully_bound_window_reports_no_port() {
        let holder = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral");
        let held = holder.local_addr().expect("local addr").port();

        let err = find_open_port(held, 1).expect_err("single bound port");
        assert_eq!(
            err,
            LaunchError::NoPortAvailable {
                base_port: held,
                window: 1
            }
        );
    }

    #[tokio::test]
    async fn always_failing_start_fn_runs_exactly_max_retries_times() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);

        let status = ensure_running(
            move |_port| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Err(anyhow::anyhow!("boot crash"))
                }
            },
            test_config(),
        )
        .await;

        assert_eq!(status, LaunchStatus::Exhausted);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn successful_start_stops_retrying() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);

        let status = ensure_running(
            move |port| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    assert!(port >= 8000);
                    Ok(())
                }
            },
            test_config(),
        )
        .await;

        assert_eq!(status, LaunchStatus::Running);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_attempt_can_recover() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);

        let status = ensure_running(
            move |_port| {
                let seen = Arc::clone(&seen);
                async move {
                    if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(anyhow::anyhow!("port stolen between probe and bind"))
                    } else {
                        Ok(())
                    }
                }
            },
            test_config(),
        )
        .await;

        assert_eq!(status, LaunchStatus::Running);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
