//! Error taxonomy of the shell.
//!
//! Transient backend failures have no variant here: the session client and
//! readiness probe collapse them into empty or `false` results.

use std::path::PathBuf;

use crate::app_types::WindowRole;

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("backend could not be started: {0}")]
    Spawn(String),

    #[error("backend did not become ready within {timeout_ms}ms (last error: {last_error})")]
    ProbeTimeout { timeout_ms: u128, last_error: String },

    #[error("failed to create {role} window: {reason}")]
    WindowCreation { role: WindowRole, reason: String },

    #[error("{role} window operation failed: {reason}")]
    Window { role: WindowRole, reason: String },

    #[error("content of {role} window faulted: {reason}")]
    ContentFault { role: WindowRole, reason: String },

    #[error("{role} window is not allowed to call '{verb}'")]
    Forbidden { role: WindowRole, verb: &'static str },

    #[error("user '{0}' is not known to the backend")]
    UnknownUser(String),

    #[error("failed to write {path}: {source}")]
    Handshake {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build backend HTTP client: {0}")]
    HttpClient(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ShellError {
    /// Errors that abort the boot sequence and quit the application.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ShellError::Spawn(_)
                | ShellError::ProbeTimeout { .. }
                | ShellError::Handshake { .. }
                | ShellError::HttpClient(_)
                | ShellError::Config(_)
        )
    }
}

pub type ShellResult<T> = Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_fatal_errors_are_classified() {
        assert!(ShellError::Spawn("missing node".into()).is_fatal());
        assert!(ShellError::ProbeTimeout {
            timeout_ms: 12_000,
            last_error: "connection refused".into(),
        }
        .is_fatal());
        assert!(!ShellError::WindowCreation {
            role: WindowRole::Preferences,
            reason: "no display".into(),
        }
        .is_fatal());
        assert!(!ShellError::UnknownUser("Mallory".into()).is_fatal());
    }

    #[test]
    fn forbidden_message_names_role_and_verb() {
        let error = ShellError::Forbidden {
            role: WindowRole::Picker,
            verb: "pickFolder",
        };
        assert_eq!(
            error.to_string(),
            "picker window is not allowed to call 'pickFolder'"
        );
    }
}
