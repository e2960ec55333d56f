use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEndpoint {
    pub host: String,
    pub port: u16,
    pub admin_path_enabled: bool,
}

impl BackendEndpoint {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Outcome of one readiness wait. Fields only ever move towards "ready"
/// during a boot sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadinessState {
    pub transport_ready: bool,
    pub business_ready: bool,
    pub needs_setup: bool,
    pub users: Option<Vec<UserIdentity>>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_code: Option<String>,
}

impl UserIdentity {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short_code: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub active_user: Option<UserIdentity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WindowRole {
    Splash,
    SetupWizard,
    Picker,
    Main,
    Preferences,
}

impl WindowRole {
    pub const ALL: [WindowRole; 5] = [
        WindowRole::Splash,
        WindowRole::SetupWizard,
        WindowRole::Picker,
        WindowRole::Main,
        WindowRole::Preferences,
    ];

    pub fn label(self) -> &'static str {
        match self {
            WindowRole::Splash => "splash",
            WindowRole::SetupWizard => "setup",
            WindowRole::Picker => "picker",
            WindowRole::Main => "main",
            WindowRole::Preferences => "preferences",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.label() == label)
    }
}

impl fmt::Display for WindowRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeResult {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
        }
    }
}

pub struct AtomicFlagGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> AtomicFlagGuard<'a> {
    pub fn try_set(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self { flag })
    }
}

impl Drop for AtomicFlagGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
