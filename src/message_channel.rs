//! Capability table of the window bridge.
//!
//! Content can only invoke the verbs its role is granted and only receives
//! the events addressed to its role. Every inbound call is re-authorized
//! against the role of the window it actually came from.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{ShellError, ShellResult},
    UserIdentity, WindowRole, ACTIVE_USER_EVENT, FOLDER_DIALOG_TITLE_MAX_CHARS, USERS_EVENT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeVerb {
    PickFolder,
    HideAndOpenPicker,
    CloseInitWindow,
    RefreshUsers,
    OpenPreferences,
    Choose,
    Quit,
}

impl BridgeVerb {
    pub const ALL: [BridgeVerb; 7] = [
        BridgeVerb::PickFolder,
        BridgeVerb::HideAndOpenPicker,
        BridgeVerb::CloseInitWindow,
        BridgeVerb::RefreshUsers,
        BridgeVerb::OpenPreferences,
        BridgeVerb::Choose,
        BridgeVerb::Quit,
    ];

    /// Name exposed on the content-side bridge object.
    pub fn name(self) -> &'static str {
        match self {
            BridgeVerb::PickFolder => "pickFolder",
            BridgeVerb::HideAndOpenPicker => "hideAndOpenPicker",
            BridgeVerb::CloseInitWindow => "closeInitWindow",
            BridgeVerb::RefreshUsers => "refreshUsers",
            BridgeVerb::OpenPreferences => "openPreferences",
            BridgeVerb::Choose => "choose",
            BridgeVerb::Quit => "quit",
        }
    }

    /// Name of the host command backing the verb.
    pub fn command(self) -> &'static str {
        match self {
            BridgeVerb::PickFolder => "shell_pick_folder",
            BridgeVerb::HideAndOpenPicker => "shell_hide_and_open_picker",
            BridgeVerb::CloseInitWindow => "shell_close_init_window",
            BridgeVerb::RefreshUsers => "shell_refresh_users",
            BridgeVerb::OpenPreferences => "shell_open_preferences",
            BridgeVerb::Choose => "shell_choose_user",
            BridgeVerb::Quit => "shell_quit",
        }
    }
}

pub fn allowed_verbs(role: WindowRole) -> &'static [BridgeVerb] {
    use BridgeVerb::*;
    match role {
        WindowRole::Main => &[PickFolder, HideAndOpenPicker, RefreshUsers, OpenPreferences],
        WindowRole::SetupWizard => &[PickFolder, CloseInitWindow, RefreshUsers],
        WindowRole::Preferences => &[PickFolder, HideAndOpenPicker, RefreshUsers],
        WindowRole::Picker => &[RefreshUsers, OpenPreferences, Choose, Quit],
        WindowRole::Splash => &[],
    }
}

pub fn authorize(role: WindowRole, verb: BridgeVerb) -> ShellResult<()> {
    if allowed_verbs(role).contains(&verb) {
        Ok(())
    } else {
        Err(ShellError::Forbidden {
            role,
            verb: verb.name(),
        })
    }
}

/// Notifications pushed from the shell into window content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    ActiveUser(UserIdentity),
    Users(Vec<UserIdentity>),
}

impl ShellEvent {
    pub fn channel(&self) -> &'static str {
        match self {
            ShellEvent::ActiveUser(_) => ACTIVE_USER_EVENT,
            ShellEvent::Users(_) => USERS_EVENT,
        }
    }

    pub fn target(&self) -> WindowRole {
        match self {
            ShellEvent::ActiveUser(_) => WindowRole::Main,
            ShellEvent::Users(_) => WindowRole::Picker,
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            ShellEvent::ActiveUser(user) => serde_json::to_value(user).unwrap_or(Value::Null),
            ShellEvent::Users(users) => serde_json::to_value(users).unwrap_or(Value::Null),
        }
    }
}

pub fn event_channels(role: WindowRole) -> &'static [&'static str] {
    match role {
        WindowRole::Main => &[ACTIVE_USER_EVENT],
        WindowRole::Picker => &[USERS_EVENT],
        _ => &[],
    }
}

/// Argument of `choose`: the picker may send a bare name or an identity object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ChosenUser {
    Name(String),
    Identity { name: String },
}

impl ChosenUser {
    pub fn name(&self) -> &str {
        match self {
            ChosenUser::Name(name) | ChosenUser::Identity { name } => name.trim(),
        }
    }
}

/// Re-login options. Logging out is the default when content omits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct HideAndOpenOptions {
    #[serde(default = "default_do_logout", rename = "doLogout")]
    pub do_logout: bool,
}

fn default_do_logout() -> bool {
    true
}

impl Default for HideAndOpenOptions {
    fn default() -> Self {
        Self { do_logout: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRequest {
    pub title: String,
    pub default_path: Option<PathBuf>,
}

/// Content-supplied folder dialog arguments are hints only. The title is
/// stripped of control characters and capped; a default path is kept only
/// when it is an existing absolute directory.
pub fn sanitize_folder_request(
    title: Option<&str>,
    default_path: Option<&str>,
    fallback_title: &str,
) -> FolderRequest {
    let title: String = title
        .unwrap_or_default()
        .chars()
        .filter(|ch| !ch.is_control())
        .take(FOLDER_DIALOG_TITLE_MAX_CHARS)
        .collect();
    let title = match title.trim() {
        "" => fallback_title.to_string(),
        trimmed => trimmed.to_string(),
    };

    let default_path = default_path
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(Path::new)
        .filter(|path| path.is_absolute() && path.is_dir())
        .map(Path::to_path_buf);

    FolderRequest {
        title,
        default_path,
    }
}
