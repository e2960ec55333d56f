//! Backend lifecycle: either a supervised subprocess or an in-process runtime,
//! selected by [`BackendMode`] behind one trait.

use std::{
    path::PathBuf,
    process::{ExitStatus, Stdio},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
    sync::oneshot,
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    backend_config::{BackendMode, ShellConfig},
    error::{ShellError, ShellResult},
    handshake, launch_plan, process_control,
    subscription::{Listeners, Subscription},
    BACKEND_STOP_GRACE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendExitEvent {
    pub code: Option<i32>,
    pub signal: Option<i32>,
    pub at: DateTime<Local>,
}

impl BackendExitEvent {
    pub fn from_status(status: Option<ExitStatus>) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.and_then(|status| status.signal())
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.and_then(|status| status.code()),
            signal,
            at: Local::now(),
        }
    }
}

#[async_trait]
pub trait BackendProcess: Send + Sync {
    fn kind(&self) -> &'static str;

    /// Brings the backend up. Calling it while already running is a no-op.
    async fn start(&mut self, config: &ShellConfig) -> ShellResult<()>;

    /// Best-effort, bounded teardown. Never restarts.
    async fn stop(&mut self);

    fn is_running(&self) -> bool;

    fn last_exit(&self) -> Option<BackendExitEvent>;

    fn on_exit(&self, callback: Box<dyn Fn(&BackendExitEvent) + Send + Sync>) -> Subscription;
}

/// Data-root side effects every backend variant performs before starting.
pub fn prepare_data_root(config: &ShellConfig) -> ShellResult<PathBuf> {
    let created = handshake::ensure_seed_files(&config.data_root, &config.resource_dir.join("assets"))?;
    for path in created {
        info!(path = %path.display(), "seeded backend user file");
    }
    handshake::write_handshake_file(&config.data_root)
}

/// Keeps backend output from growing the log without bound: the first stdout
/// line is surfaced, the rest is only counted; stderr always passes.
#[derive(Debug, Default)]
pub struct OutputThrottle {
    seen_stdout: bool,
    suppressed_stdout: u64,
}

impl OutputThrottle {
    pub fn on_stdout_line<'a>(&mut self, line: &'a str) -> Option<&'a str> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if self.seen_stdout {
            self.suppressed_stdout += 1;
            return None;
        }
        self.seen_stdout = true;
        Some(line)
    }

    pub fn on_stderr_line<'a>(&mut self, line: &'a str) -> Option<&'a str> {
        let line = line.trim();
        (!line.is_empty()).then_some(line)
    }

    pub fn suppressed_stdout(&self) -> u64 {
        self.suppressed_stdout
    }
}

fn relay_output<R>(reader: R, throttle: Arc<Mutex<OutputThrottle>>, is_stderr: bool)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let mut throttle = throttle.lock().unwrap_or_else(|error| error.into_inner());
            if is_stderr {
                if let Some(line) = throttle.on_stderr_line(&line) {
                    warn!(target: "backend", "{line}");
                }
            } else if let Some(line) = throttle.on_stdout_line(&line) {
                info!(target: "backend", "{line}");
            }
        }
        if !is_stderr {
            let suppressed = throttle
                .lock()
                .map(|throttle| throttle.suppressed_stdout())
                .unwrap_or_default();
            debug!(suppressed, "backend stdout closed");
        }
    });
}

struct RunningChild {
    pid: Option<u32>,
    stop_tx: Option<oneshot::Sender<()>>,
    monitor: JoinHandle<()>,
}

enum ChildOutcome {
    Exited(Option<ExitStatus>),
    StopRequested,
}

pub struct SubprocessBackend {
    running: Option<RunningChild>,
    alive: Arc<AtomicBool>,
    last_exit: Arc<Mutex<Option<BackendExitEvent>>>,
    exit_listeners: Listeners<BackendExitEvent>,
}

impl Default for SubprocessBackend {
    fn default() -> Self {
        Self {
            running: None,
            alive: Arc::new(AtomicBool::new(false)),
            last_exit: Arc::new(Mutex::new(None)),
            exit_listeners: Listeners::default(),
        }
    }
}

impl SubprocessBackend {
    pub fn pid(&self) -> Option<u32> {
        self.running.as_ref().and_then(|running| running.pid)
    }
}

#[async_trait]
impl BackendProcess for SubprocessBackend {
    fn kind(&self) -> &'static str {
        "subprocess"
    }

    async fn start(&mut self, config: &ShellConfig) -> ShellResult<()> {
        if self.is_running() {
            return Ok(());
        }

        let plan = launch_plan::resolve_launch_plan(config)?;
        prepare_data_root(config)?;
        if !plan.cwd.exists() {
            std::fs::create_dir_all(&plan.cwd).map_err(|error| {
                ShellError::Spawn(format!(
                    "Failed to create backend cwd {}: {}",
                    plan.cwd.display(),
                    error
                ))
            })?;
        }

        info!(command = ?launch_plan::build_debug_command(&plan), "starting backend");
        let mut child = Command::new(&plan.cmd)
            .args(&plan.args)
            .current_dir(&plan.cwd)
            .envs(plan.env.iter().map(|(key, value)| (key.as_str(), value.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| {
                ShellError::Spawn(format!(
                    "Failed to spawn backend process with command {:?}: {}",
                    launch_plan::build_debug_command(&plan),
                    error
                ))
            })?;

        let throttle = Arc::new(Mutex::new(OutputThrottle::default()));
        if let Some(stdout) = child.stdout.take() {
            relay_output(stdout, Arc::clone(&throttle), false);
        }
        if let Some(stderr) = child.stderr.take() {
            relay_output(stderr, throttle, true);
        }

        let pid = child.id();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        self.alive.store(true, Ordering::Release);
        let alive = Arc::clone(&self.alive);
        let last_exit = Arc::clone(&self.last_exit);
        let listeners = self.exit_listeners.clone();

        let monitor = tokio::spawn(async move {
            let outcome = tokio::select! {
                status = child.wait() => ChildOutcome::Exited(status.ok()),
                _ = stop_rx => ChildOutcome::StopRequested,
            };
            let status = match outcome {
                ChildOutcome::Exited(status) => status,
                ChildOutcome::StopRequested => {
                    process_control::stop_child_process(&mut child, BACKEND_STOP_GRACE).await
                }
            };
            alive.store(false, Ordering::Release);

            let event = BackendExitEvent::from_status(status);
            info!(code = ?event.code, signal = ?event.signal, "backend process exited");
            *last_exit.lock().unwrap_or_else(|error| error.into_inner()) = Some(event.clone());
            listeners.emit(&event);
        });

        self.running = Some(RunningChild {
            pid,
            stop_tx: Some(stop_tx),
            monitor,
        });
        Ok(())
    }

    async fn stop(&mut self) {
        let Some(mut running) = self.running.take() else {
            return;
        };
        if let Some(stop_tx) = running.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if tokio::time::timeout(BACKEND_STOP_GRACE * 2, &mut running.monitor)
            .await
            .is_err()
        {
            error!(pid = ?running.pid, "backend did not stop within the teardown budget");
            running.monitor.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.running.is_some() && self.alive.load(Ordering::Acquire)
    }

    fn last_exit(&self) -> Option<BackendExitEvent> {
        self.last_exit
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn on_exit(&self, callback: Box<dyn Fn(&BackendExitEvent) + Send + Sync>) -> Subscription {
        self.exit_listeners.subscribe(callback)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedContext {
    pub data_root: PathBuf,
    pub flow_dir: PathBuf,
    pub port: u16,
    pub admin_enabled: bool,
}

/// A backend linked into the shell process.
#[async_trait]
pub trait EmbeddedRuntime: Send + Sync {
    async fn initialize(&self, context: &EmbeddedContext) -> Result<(), String>;
    async fn shutdown(&self);
}

pub struct EmbeddedBackend {
    runtime: Arc<dyn EmbeddedRuntime>,
    running: bool,
    last_exit: Option<BackendExitEvent>,
    exit_listeners: Listeners<BackendExitEvent>,
}

impl EmbeddedBackend {
    pub fn new(runtime: Arc<dyn EmbeddedRuntime>) -> Self {
        Self {
            runtime,
            running: false,
            last_exit: None,
            exit_listeners: Listeners::default(),
        }
    }
}

#[async_trait]
impl BackendProcess for EmbeddedBackend {
    fn kind(&self) -> &'static str {
        "embedded"
    }

    async fn start(&mut self, config: &ShellConfig) -> ShellResult<()> {
        if self.running {
            return Ok(());
        }
        prepare_data_root(config)?;
        let context = EmbeddedContext {
            data_root: config.data_root.clone(),
            flow_dir: config.flow_dir.clone(),
            port: config.endpoint.port,
            admin_enabled: config.endpoint.admin_path_enabled,
        };
        self.runtime
            .initialize(&context)
            .await
            .map_err(|error| ShellError::Spawn(format!("Embedded backend failed to initialize: {error}")))?;
        info!(port = context.port, "embedded backend initialized");
        self.running = true;
        Ok(())
    }

    async fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.runtime.shutdown().await;
        self.running = false;
        let event = BackendExitEvent {
            code: Some(0),
            signal: None,
            at: Local::now(),
        };
        self.last_exit = Some(event.clone());
        self.exit_listeners.emit(&event);
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn last_exit(&self) -> Option<BackendExitEvent> {
        self.last_exit.clone()
    }

    fn on_exit(&self, callback: Box<dyn Fn(&BackendExitEvent) + Send + Sync>) -> Subscription {
        self.exit_listeners.subscribe(callback)
    }
}

pub fn backend_for_mode(
    mode: BackendMode,
    embedded_runtime: Option<Arc<dyn EmbeddedRuntime>>,
) -> ShellResult<Box<dyn BackendProcess>> {
    match (mode, embedded_runtime) {
        (BackendMode::Subprocess, _) => Ok(Box::new(SubprocessBackend::default())),
        (BackendMode::Embedded, Some(runtime)) => Ok(Box::new(EmbeddedBackend::new(runtime))),
        (BackendMode::Embedded, None) => Err(ShellError::Config(
            "STUDIO_BACKEND_MODE=embedded needs an in-process runtime, which this build does not link."
                .to_string(),
        )),
    }
}
