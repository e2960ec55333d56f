use std::path::PathBuf;

use async_trait::async_trait;
use tauri::{AppHandle, Emitter, EventTarget, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};
use tokio::sync::oneshot;
use tracing::warn;

use crate::{
    desktop_bridge,
    message_channel::{FolderRequest, ShellEvent},
    window_host::{ContentTarget, WindowHost, WindowSpec, BLANK_PAGE},
    WindowRole,
};

pub(crate) struct TauriHost {
    app: AppHandle,
}

impl TauriHost {
    pub(crate) fn new(app: AppHandle) -> Self {
        Self { app }
    }

    fn window(&self, role: WindowRole) -> Result<WebviewWindow, String> {
        self.app
            .get_webview_window(role.label())
            .ok_or_else(|| format!("{role} window not found"))
    }

    fn webview_url(target: &ContentTarget) -> WebviewUrl {
        match target {
            ContentTarget::External(url) => WebviewUrl::External(url.clone()),
            bundled => WebviewUrl::App(PathBuf::from(
                bundled.bundled_path().unwrap_or_else(|| BLANK_PAGE.to_string()),
            )),
        }
    }
}

#[async_trait]
impl WindowHost for TauriHost {
    fn create(&self, spec: &WindowSpec) -> Result<(), String> {
        let mut builder = WebviewWindowBuilder::new(
            &self.app,
            spec.role.label(),
            Self::webview_url(&spec.content),
        )
        .title(spec.title)
        .inner_size(spec.width, spec.height)
        .resizable(spec.resizable)
        .decorations(spec.decorations)
        .always_on_top(spec.always_on_top)
        .visible(spec.visible);
        if spec.centered {
            builder = builder.center();
        }
        if let Some(script) = desktop_bridge::bridge_script(spec.role) {
            builder = builder.initialization_script(&script);
        }
        if let Some(parent) = spec.parent.and_then(|role| self.app.get_webview_window(role.label())) {
            // Owned windows stay above their owner; Tauri has no app-modal flag.
            builder = builder
                .parent(&parent)
                .map_err(|error| format!("Failed to attach parent window: {error}"))?;
        }

        builder
            .build()
            .map(|_| ())
            .map_err(|error| format!("Failed to build window: {error}"))
    }

    fn navigate(&self, role: WindowRole, target: &ContentTarget) -> Result<(), String> {
        let window = self.window(role)?;
        let url = match target {
            ContentTarget::External(url) => url.clone(),
            bundled => {
                let current = window
                    .url()
                    .map_err(|error| format!("Failed to read window url: {error}"))?;
                let path = bundled
                    .bundled_path()
                    .unwrap_or_else(|| BLANK_PAGE.to_string());
                current
                    .join(&path)
                    .map_err(|error| format!("Invalid bundled path {path}: {error}"))?
            }
        };
        window
            .navigate(url)
            .map_err(|error| format!("Failed to navigate: {error}"))
    }

    fn show(&self, role: WindowRole) -> Result<(), String> {
        let window = self.window(role)?;
        if window.is_minimized().unwrap_or(false) {
            let _ = window.unminimize();
        }
        window
            .show()
            .map_err(|error| format!("Failed to show window: {error}"))
    }

    fn focus(&self, role: WindowRole) -> Result<(), String> {
        self.window(role)?
            .set_focus()
            .map_err(|error| format!("Failed to focus window: {error}"))
    }

    fn hide(&self, role: WindowRole) -> Result<(), String> {
        self.window(role)?
            .hide()
            .map_err(|error| format!("Failed to hide window: {error}"))
    }

    fn minimize(&self, role: WindowRole) -> Result<(), String> {
        self.window(role)?
            .minimize()
            .map_err(|error| format!("Failed to minimize window: {error}"))
    }

    fn close(&self, role: WindowRole) -> Result<(), String> {
        let Some(window) = self.app.get_webview_window(role.label()) else {
            return Ok(());
        };
        window
            .destroy()
            .map_err(|error| format!("Failed to destroy window: {error}"))
    }

    fn is_visible(&self, role: WindowRole) -> bool {
        self.app
            .get_webview_window(role.label())
            .and_then(|window| window.is_visible().ok())
            .unwrap_or(false)
    }

    fn release_presentation_flags(&self, role: WindowRole) -> Result<(), String> {
        let window = self.window(role)?;
        let mut failures = Vec::new();
        if let Err(error) = window.set_fullscreen(false) {
            failures.push(format!("fullscreen: {error}"));
        }
        if let Err(error) = window.unmaximize() {
            failures.push(format!("maximize: {error}"));
        }
        if let Err(error) = window.set_always_on_top(false) {
            failures.push(format!("always-on-top: {error}"));
        }
        if let Err(error) = window.set_visible_on_all_workspaces(false) {
            failures.push(format!("all-workspaces: {error}"));
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures.join(", "))
        }
    }

    fn reload(&self, role: WindowRole) -> Result<(), String> {
        self.window(role)?
            .eval("window.location.reload()")
            .map_err(|error| format!("Failed to reload window: {error}"))
    }

    fn emit(&self, role: WindowRole, event: &ShellEvent) -> Result<(), String> {
        self.app
            .emit_to(
                EventTarget::webview_window(role.label()),
                event.channel(),
                event.payload(),
            )
            .map_err(|error| format!("Failed to emit {}: {error}", event.channel()))
    }

    fn exit(&self, code: i32) {
        self.app.exit(code);
    }

    async fn show_fatal_error(&self, title: &str, message: &str) {
        let (tx, rx) = oneshot::channel();
        self.app
            .dialog()
            .message(message)
            .title(title)
            .kind(MessageDialogKind::Error)
            .show(move |_| {
                let _ = tx.send(());
            });
        let _ = rx.await;
    }

    async fn confirm(&self, title: &str, message: &str) -> bool {
        let (tx, rx) = oneshot::channel();
        self.app
            .dialog()
            .message(message)
            .title(title)
            .kind(MessageDialogKind::Warning)
            .buttons(MessageDialogButtons::OkCancel)
            .show(move |answer| {
                let _ = tx.send(answer);
            });
        rx.await.unwrap_or(false)
    }

    /// The native folder dialog offers no custom confirm label, so
    /// `_button_label` is not shown here.
    async fn pick_folder(&self, request: &FolderRequest, _button_label: &str) -> Option<PathBuf> {
        let (tx, rx) = oneshot::channel();
        let mut dialog = self.app.dialog().file().set_title(&request.title);
        if let Some(directory) = &request.default_path {
            dialog = dialog.set_directory(directory);
        }
        dialog.pick_folder(move |folder| {
            let _ = tx.send(folder);
        });

        match rx.await.ok().flatten()?.into_path() {
            Ok(path) => Some(path),
            Err(error) => {
                warn!(error = %error, "folder dialog returned a non-local path");
                None
            }
        }
    }
}
