use std::sync::{
    atomic::{AtomicBool, AtomicU32, Ordering},
    Mutex,
};

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    backend_config::ProbeSettings,
    backend_http::{BackendApi, InitializeStatus},
    backoff::{retry_with_backoff, BackoffPolicy},
    error::{ShellError, ShellResult},
    logging::LogCategory,
    ReadinessState,
};

/// Waits for transport liveness, then business readiness. Never fails: an
/// exhausted budget is reported through the returned state.
pub async fn await_ready(api: &dyn BackendApi, settings: &ProbeSettings) -> ReadinessState {
    let mut policy = BackoffPolicy::from_probe(settings);
    // Both probes may run inside one attempt; each carries its own timeout.
    policy.attempt_timeout = settings.probe_timeout * 2;

    let transport_ready = AtomicBool::new(false);
    let attempts = AtomicU32::new(0);
    let last_error: Mutex<Option<String>> = Mutex::new(None);
    let started = Instant::now();

    let record_error = |message: String| {
        debug!(category = %LogCategory::Startup, error = %message, "backend not ready yet");
        *last_error.lock().unwrap_or_else(|error| error.into_inner()) = Some(message);
    };

    let status = {
        let transport_ready = &transport_ready;
        let attempts = &attempts;
        let record_error = &record_error;
        retry_with_backoff(&policy, move |_| async move {
            attempts.fetch_add(1, Ordering::Relaxed);
            if !transport_ready.load(Ordering::Acquire) {
                if !api.ping(settings.probe_timeout).await {
                    record_error("transport probe failed".to_string());
                    return None;
                }
                transport_ready.store(true, Ordering::Release);
                debug!(category = %LogCategory::Startup, "backend transport is live");
            }

            match api.initialize_status(settings.probe_timeout).await {
                Ok(status) if status.ready => Some(status),
                Ok(_) => {
                    record_error("backend reported not ready".to_string());
                    None
                }
                Err(error) => {
                    record_error(error);
                    None
                }
            }
        })
        .await
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    let attempts = attempts.load(Ordering::Relaxed);
    let transport_ready = transport_ready.load(Ordering::Acquire);
    match status {
        Some(InitializeStatus {
            needs_user_action,
            users,
            ..
        }) => {
            info!(
                category = %LogCategory::Startup,
                elapsed_ms,
                attempts,
                needs_setup = needs_user_action,
                "backend is ready"
            );
            ReadinessState {
                transport_ready: true,
                business_ready: true,
                needs_setup: needs_user_action,
                users,
                last_error: None,
            }
        }
        None => {
            let last_error = last_error
                .into_inner()
                .unwrap_or_else(|error| error.into_inner());
            warn!(
                category = %LogCategory::Startup,
                elapsed_ms,
                attempts,
                transport_ready,
                last_error = last_error.as_deref().unwrap_or("none"),
                "backend readiness budget exhausted"
            );
            ReadinessState {
                transport_ready,
                business_ready: false,
                needs_setup: false,
                users: None,
                last_error,
            }
        }
    }
}

/// Boot treats anything short of business readiness as fatal.
pub fn require_business_ready(
    state: ReadinessState,
    settings: &ProbeSettings,
) -> ShellResult<ReadinessState> {
    if state.business_ready {
        return Ok(state);
    }
    Err(ShellError::ProbeTimeout {
        timeout_ms: settings.overall_timeout.as_millis(),
        last_error: state
            .last_error
            .unwrap_or_else(|| "no probe completed".to_string()),
    })
}
