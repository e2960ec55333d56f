use std::path::PathBuf;

use async_trait::async_trait;
use url::Url;

use crate::{message_channel::FolderRequest, message_channel::ShellEvent, WindowRole};

pub const UI_ENTRY_PAGE: &str = "index.html";
pub const BLANK_PAGE: &str = "blank.html";
pub const PICKER_PAGE: &str = "login.html";
pub const SPLASH_PAGE: &str = "loading.html";
pub const SETUP_ROUTE: &str = "/Setupwizard";
pub const PREFERENCES_ROUTE: &str = "/konfiguration";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentTarget {
    /// Placeholder page. Main is created this way and navigated only once
    /// the backend is ready.
    Blank,
    Bundled {
        page: &'static str,
        route: Option<&'static str>,
    },
    External(Url),
}

impl ContentTarget {
    pub fn for_role(role: WindowRole, dev_server_url: Option<&Url>) -> Self {
        let route = match role {
            WindowRole::Splash => {
                return ContentTarget::Bundled {
                    page: SPLASH_PAGE,
                    route: None,
                }
            }
            WindowRole::Picker => {
                return ContentTarget::Bundled {
                    page: PICKER_PAGE,
                    route: None,
                }
            }
            WindowRole::Main => None,
            WindowRole::SetupWizard => Some(SETUP_ROUTE),
            WindowRole::Preferences => Some(PREFERENCES_ROUTE),
        };

        match dev_server_url {
            Some(base) => {
                let mut url = base.clone();
                url.set_fragment(route);
                ContentTarget::External(url)
            }
            None => ContentTarget::Bundled {
                page: UI_ENTRY_PAGE,
                route,
            },
        }
    }

    /// Path relative to the bundled UI root, fragment included.
    pub fn bundled_path(&self) -> Option<String> {
        match self {
            ContentTarget::Blank => Some(BLANK_PAGE.to_string()),
            ContentTarget::Bundled { page, route: None } => Some((*page).to_string()),
            ContentTarget::Bundled {
                page,
                route: Some(route),
            } => Some(format!("{page}#{route}")),
            ContentTarget::External(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    pub role: WindowRole,
    pub title: &'static str,
    pub width: f64,
    pub height: f64,
    pub resizable: bool,
    pub decorations: bool,
    pub always_on_top: bool,
    pub centered: bool,
    /// Shown as soon as the native window exists.
    pub visible: bool,
    /// Shown once its content finished loading.
    pub reveal_on_load: bool,
    pub parent: Option<WindowRole>,
    pub modal: bool,
    pub content: ContentTarget,
}

impl WindowSpec {
    pub fn for_role(role: WindowRole, dev_server_url: Option<&Url>) -> Self {
        let content = ContentTarget::for_role(role, dev_server_url);
        let base = WindowSpec {
            role,
            title: "Studioassistent",
            width: 420.0,
            height: 300.0,
            resizable: false,
            decorations: false,
            always_on_top: false,
            centered: true,
            visible: true,
            reveal_on_load: false,
            parent: None,
            modal: false,
            content,
        };

        match role {
            WindowRole::Splash => WindowSpec {
                always_on_top: true,
                ..base
            },
            WindowRole::Picker => base,
            WindowRole::Main => WindowSpec {
                width: 1200.0,
                height: 900.0,
                resizable: true,
                decorations: true,
                visible: false,
                content: ContentTarget::Blank,
                ..base
            },
            WindowRole::SetupWizard => WindowSpec {
                width: 900.0,
                height: 800.0,
                resizable: true,
                decorations: true,
                visible: false,
                reveal_on_load: true,
                ..base
            },
            WindowRole::Preferences => WindowSpec {
                title: "Konfiguration",
                width: 900.0,
                height: 650.0,
                resizable: true,
                decorations: true,
                visible: false,
                reveal_on_load: true,
                ..base
            },
        }
    }
}

/// Native window and dialog operations the controller drives. Each role has
/// at most one native window; the host addresses it by role.
#[async_trait]
pub trait WindowHost: Send + Sync + 'static {
    fn create(&self, spec: &WindowSpec) -> Result<(), String>;
    fn navigate(&self, role: WindowRole, target: &ContentTarget) -> Result<(), String>;
    fn show(&self, role: WindowRole) -> Result<(), String>;
    fn focus(&self, role: WindowRole) -> Result<(), String>;
    fn hide(&self, role: WindowRole) -> Result<(), String>;
    fn minimize(&self, role: WindowRole) -> Result<(), String>;
    /// Destroys the window without running close handlers.
    fn close(&self, role: WindowRole) -> Result<(), String>;
    fn is_visible(&self, role: WindowRole) -> bool;
    /// Leaves fullscreen, kiosk, maximized and always-on-top states that
    /// some window managers refuse to hide.
    fn release_presentation_flags(&self, role: WindowRole) -> Result<(), String>;
    fn reload(&self, role: WindowRole) -> Result<(), String>;
    fn emit(&self, role: WindowRole, event: &ShellEvent) -> Result<(), String>;
    fn exit(&self, code: i32);

    async fn show_fatal_error(&self, title: &str, message: &str);
    async fn confirm(&self, title: &str, message: &str) -> bool;
    async fn pick_folder(&self, request: &FolderRequest, button_label: &str) -> Option<PathBuf>;
}
