use std::{process::ExitStatus, time::Duration};

use tokio::process::Child;
use tracing::warn;

#[cfg(unix)]
fn request_graceful_stop(child: &Child) -> Result<(), String> {
    let Some(pid) = child.id() else {
        return Ok(());
    };
    // SAFETY: plain signal delivery to a pid we spawned and still own.
    let result = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if result == 0 {
        Ok(())
    } else {
        Err(format!(
            "Failed to send SIGTERM to backend pid {pid}: {}",
            std::io::Error::last_os_error()
        ))
    }
}

#[cfg(target_os = "windows")]
fn request_graceful_stop(child: &Child) -> Result<(), String> {
    let Some(pid) = child.id() else {
        return Ok(());
    };
    std::process::Command::new("taskkill")
        .args(["/pid", &pid.to_string(), "/t"])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .stdin(std::process::Stdio::null())
        .status()
        .map(|_| ())
        .map_err(|error| format!("Failed to run taskkill for pid {pid}: {error}"))
}

#[cfg(not(any(unix, target_os = "windows")))]
fn request_graceful_stop(_child: &Child) -> Result<(), String> {
    Err("Graceful stop is not supported on this platform.".to_string())
}

async fn force_kill(child: &mut Child) {
    #[cfg(target_os = "windows")]
    if let Some(pid) = child.id() {
        let _ = tokio::process::Command::new("taskkill")
            .args(["/pid", &pid.to_string(), "/t", "/f"])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .stdin(std::process::Stdio::null())
            .status()
            .await;
    }

    if let Err(error) = child.kill().await {
        warn!(error = %error, "failed to force-kill backend process");
    }
}

/// Terminate, wait up to `grace`, then force-kill.
pub async fn stop_child_process(child: &mut Child, grace: Duration) -> Option<ExitStatus> {
    if let Err(error) = request_graceful_stop(child) {
        warn!(error = %error, "graceful backend stop request failed");
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => Some(status),
        Ok(Err(error)) => {
            warn!(error = %error, "failed to wait for backend process");
            None
        }
        Err(_) => {
            warn!(
                grace_ms = grace.as_millis() as u64,
                "backend ignored terminate request, force-killing"
            );
            force_kill(child).await;
            child.wait().await.ok()
        }
    }
}
