use std::env;

use crate::{DEFAULT_SHELL_LOCALE, LOCALE_ENV};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellTexts {
    pub folder_dialog_title: &'static str,
    pub folder_dialog_button: &'static str,
    pub menu_app: &'static str,
    pub menu_preferences: &'static str,
    pub menu_quit: &'static str,
    pub menu_edit: &'static str,
    pub fatal_error_title: &'static str,
    pub content_fault_title: &'static str,
    pub content_fault_message: &'static str,
}

pub fn shell_texts_for_locale(locale: &str) -> ShellTexts {
    if locale == "en-US" {
        return ShellTexts {
            folder_dialog_title: "Choose folder",
            folder_dialog_button: "Choose",
            menu_app: "Studio Assistant",
            menu_preferences: "Settings",
            menu_quit: "Quit",
            menu_edit: "Edit",
            fatal_error_title: "Studio Assistant could not start",
            content_fault_title: "Window not responding",
            content_fault_message: "The window stopped responding. Reload it?",
        };
    }

    ShellTexts {
        folder_dialog_title: "Ordner auswählen",
        folder_dialog_button: "Auswählen",
        menu_app: "Studioassistent",
        menu_preferences: "Konfiguration",
        menu_quit: "Beenden",
        menu_edit: "Bearbeiten",
        fatal_error_title: "Studioassistent konnte nicht starten",
        content_fault_title: "Fenster reagiert nicht",
        content_fault_message: "Das Fenster reagiert nicht mehr. Neu laden?",
    }
}

pub fn resolve_shell_locale() -> &'static str {
    resolve_shell_locale_from(|key| env::var(key).ok())
}

pub(crate) fn resolve_shell_locale_from<F>(lookup: F) -> &'static str
where
    F: Fn(&str) -> Option<String>,
{
    for env_key in [LOCALE_ENV, "LC_ALL", "LANG"] {
        if let Some(locale) = lookup(env_key).as_deref().and_then(normalize_shell_locale) {
            return locale;
        }
    }
    DEFAULT_SHELL_LOCALE
}

pub(crate) fn normalize_shell_locale(raw: &str) -> Option<&'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw == "de-DE" {
        return Some("de-DE");
    }
    if raw == "en-US" {
        return Some("en-US");
    }

    let lowered = raw.to_ascii_lowercase();
    if lowered.starts_with("de") {
        return Some("de-DE");
    }
    if lowered.starts_with("en") {
        return Some("en-US");
    }
    None
}
