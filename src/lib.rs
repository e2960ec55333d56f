//! Desktop shell of the immo24 Studioassistent.
//!
//! Supervises the local backend, waits for it to become ready and drives the
//! splash, setup, picker, main and preferences windows from that state. The
//! core is toolkit independent; the Tauri integration is behind the
//! `desktop` feature.

pub mod app_constants;
pub mod app_types;
pub mod backend_config;
pub mod backend_http;
pub mod backend_process;
pub mod backend_readiness;
pub mod backoff;
pub mod bootstrap;
pub mod desktop_bridge;
pub mod error;
pub mod exit_state;
pub mod handshake;
pub mod launch_plan;
pub mod logging;
pub mod menu_actions;
pub mod message_channel;
pub mod process_control;
pub mod runtime_paths;
pub mod session_client;
pub mod shell;
pub mod shell_locale;
pub mod subscription;
pub mod window_controller;
pub mod window_host;

#[cfg(feature = "desktop")]
pub mod app_runtime;
#[cfg(feature = "desktop")]
mod desktop_bridge_commands;
#[cfg(feature = "desktop")]
mod menu_setup;
#[cfg(feature = "desktop")]
mod tauri_host;

pub use app_constants::*;
pub use app_types::{
    AtomicFlagGuard, BackendEndpoint, BridgeResult, ReadinessState, Session, UserIdentity,
    WindowRole,
};
pub use error::{ShellError, ShellResult};
pub use shell::Shell;
