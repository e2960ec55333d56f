use std::{fmt, fs, path::Path};

use tracing_appender::{non_blocking::WorkerGuard, rolling::RollingFileAppender};
use tracing_subscriber::{fmt as fmt_layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{runtime_paths, DESKTOP_LOG_FILE, LOG_FILTER_ENV};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Startup,
    Runtime,
    Session,
    Shutdown,
}

impl LogCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            LogCategory::Startup => "startup",
            LogCategory::Runtime => "runtime",
            LogCategory::Session => "session",
            LogCategory::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn resolve_desktop_log_path(data_root: &Path) -> std::path::PathBuf {
    runtime_paths::logs_dir(data_root).join(DESKTOP_LOG_FILE)
}

/// Appends to `<dir>/desktop.log` without rotation, so the file keeps the
/// name the data-root layout documents.
pub fn desktop_log_appender(dir: &Path) -> RollingFileAppender {
    tracing_appender::rolling::never(dir, DESKTOP_LOG_FILE)
}

/// Installs the global subscriber: stderr plus `<data_root>/logs/desktop.log`. Keep the returned guard alive until exit or buffered
/// file output is lost.
pub fn init_logging(data_root: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt_layer::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let mut guard = None;
    let file_layer = data_root.and_then(|root| {
        let dir = runtime_paths::logs_dir(root);
        if let Err(error) = fs::create_dir_all(&dir) {
            eprintln!("failed to create log directory {}: {error}", dir.display());
            return None;
        }
        let appender = desktop_log_appender(&dir);
        let (writer, worker_guard) = tracing_appender::non_blocking(appender);
        guard = Some(worker_guard);
        Some(fmt_layer::layer().with_ansi(false).with_writer(writer))
    });

    if let Err(error) = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("tracing subscriber already installed: {error}");
    }
    guard
}
