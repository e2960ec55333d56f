//! Host commands behind the bridge verbs. The calling window is identified
//! by the label of the webview that sent the invocation, never by anything
//! the content passes in.

use std::sync::Arc;

use tauri::{AppHandle, Manager, WebviewWindow};
use tracing::warn;

use crate::{
    message_channel::{ChosenUser, HideAndOpenOptions},
    shell::Shell,
    tauri_host::TauriHost,
    BridgeResult, UserIdentity, WindowRole,
};

pub(crate) type DesktopShell = Shell<TauriHost>;

fn shell_and_caller(app: &AppHandle, window: &WebviewWindow) -> Option<(Arc<DesktopShell>, WindowRole)> {
    let role = WindowRole::from_label(window.label());
    if role.is_none() {
        warn!(label = window.label(), "bridge call from unknown window");
    }
    let shell = app.try_state::<Arc<DesktopShell>>()?.inner().clone();
    Some((shell, role?))
}

#[tauri::command]
pub(crate) async fn shell_pick_folder(
    app_handle: AppHandle,
    window: WebviewWindow,
    title: Option<String>,
    default_path: Option<String>,
) -> Option<String> {
    let (shell, caller) = shell_and_caller(&app_handle, &window)?;
    match shell
        .pick_folder(caller, title.as_deref(), default_path.as_deref())
        .await
    {
        Ok(path) => path.map(|path| path.to_string_lossy().to_string()),
        Err(_) => None,
    }
}

#[tauri::command]
pub(crate) async fn shell_hide_and_open_picker(
    app_handle: AppHandle,
    window: WebviewWindow,
    options: Option<HideAndOpenOptions>,
) -> BridgeResult {
    let Some((shell, caller)) = shell_and_caller(&app_handle, &window) else {
        return BridgeResult::failed("Shell is not ready.");
    };
    shell
        .hide_and_open_picker(caller, options.unwrap_or_default())
        .await
}

#[tauri::command]
pub(crate) async fn shell_close_init_window(app_handle: AppHandle, window: WebviewWindow) -> bool {
    let Some((shell, caller)) = shell_and_caller(&app_handle, &window) else {
        return false;
    };
    shell.close_init_window(caller).await.unwrap_or(false)
}

#[tauri::command]
pub(crate) async fn shell_refresh_users(
    app_handle: AppHandle,
    window: WebviewWindow,
) -> Vec<UserIdentity> {
    let Some((shell, caller)) = shell_and_caller(&app_handle, &window) else {
        return Vec::new();
    };
    shell.refresh_users(caller).await.unwrap_or_default()
}

#[tauri::command]
pub(crate) async fn shell_open_preferences(
    app_handle: AppHandle,
    window: WebviewWindow,
) -> BridgeResult {
    let Some((shell, caller)) = shell_and_caller(&app_handle, &window) else {
        return BridgeResult::failed("Shell is not ready.");
    };
    match shell.open_preferences(Some(caller)).await {
        Ok(()) => BridgeResult::ok(),
        Err(error) => BridgeResult::failed(error.to_string()),
    }
}

#[tauri::command]
pub(crate) async fn shell_choose_user(
    app_handle: AppHandle,
    window: WebviewWindow,
    user: ChosenUser,
) -> BridgeResult {
    let Some((shell, caller)) = shell_and_caller(&app_handle, &window) else {
        return BridgeResult::failed("Shell is not ready.");
    };
    match shell.choose_user(caller, user.name()).await {
        Ok(true) => BridgeResult::ok(),
        Ok(false) => BridgeResult::failed("User was not accepted by the backend."),
        Err(error) => BridgeResult::failed(error.to_string()),
    }
}

#[tauri::command]
pub(crate) async fn shell_quit(app_handle: AppHandle, window: WebviewWindow) -> BridgeResult {
    let Some((shell, caller)) = shell_and_caller(&app_handle, &window) else {
        return BridgeResult::failed("Shell is not ready.");
    };
    match shell.quit(caller).await {
        Ok(()) => BridgeResult::ok(),
        Err(error) => BridgeResult::failed(error.to_string()),
    }
}
