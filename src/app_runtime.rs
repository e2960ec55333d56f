use std::{path::PathBuf, sync::Arc};

use tauri::{webview::PageLoadEvent, AppHandle, Manager, RunEvent, WindowEvent};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use tracing::{error, info, warn};

use crate::{
    backend_config::ShellConfig,
    backend_http::HttpBackendApi,
    backend_process::backend_for_mode,
    desktop_bridge_commands::{self, DesktopShell},
    error::{ShellError, ShellResult},
    logging::{self, LogCategory},
    menu_actions::{self, MenuAction},
    menu_setup, runtime_paths,
    shell::Shell,
    shell_locale::{self, ShellTexts},
    tauri_host::TauriHost,
    window_host::BLANK_PAGE,
    WindowRole, APP_VERSION,
};

fn shell_of(app_handle: &AppHandle) -> Option<Arc<DesktopShell>> {
    app_handle
        .try_state::<Arc<DesktopShell>>()
        .map(|state| state.inner().clone())
}

fn resolve_resource_dir(app_handle: &AppHandle) -> Option<PathBuf> {
    if std::env::var_os(crate::RESOURCE_DIR_ENV).is_some() {
        return runtime_paths::default_resource_dir();
    }
    app_handle
        .path()
        .resource_dir()
        .ok()
        .or_else(runtime_paths::default_resource_dir)
}

fn build_shell(
    app_handle: &AppHandle,
    data_root: PathBuf,
    texts: ShellTexts,
) -> ShellResult<Arc<DesktopShell>> {
    let resource_dir = resolve_resource_dir(app_handle)
        .ok_or_else(|| ShellError::Config("resource directory is unavailable".to_string()))?;
    let config = ShellConfig::from_env(data_root, resource_dir)?;
    let api = HttpBackendApi::new(&config.endpoint, config.contract.clone())?;
    let backend = backend_for_mode(config.mode, None)?;
    let host = Arc::new(TauriHost::new(app_handle.clone()));
    Ok(Arc::new(Shell::new(config, host, Arc::new(api), backend, texts)))
}

fn report_setup_failure(app_handle: &AppHandle, texts: &ShellTexts, error: &ShellError) {
    error!(category = %LogCategory::Startup, error = %error, "shell setup failed");
    let exit_handle = app_handle.clone();
    app_handle
        .dialog()
        .message(error.to_string())
        .title(texts.fatal_error_title)
        .kind(MessageDialogKind::Error)
        .show(move |_| exit_handle.exit(1));
}

fn handle_menu_action(app_handle: &AppHandle, menu_id: &str) {
    let Some(action) = menu_actions::action_from_menu_id(menu_id) else {
        return;
    };
    let Some(shell) = shell_of(app_handle) else {
        return;
    };
    tauri::async_runtime::spawn(async move {
        match action {
            MenuAction::OpenPreferences => {
                let _ = shell.open_preferences(None).await;
            }
            MenuAction::Quit => shell.request_exit(0).await,
        }
    });
}

pub fn run() {
    let data_root = runtime_paths::default_data_root();
    let _log_guard = logging::init_logging(data_root.as_deref());
    info!(category = %LogCategory::Startup, version = APP_VERSION, "desktop process starting");
    if let Some(root) = data_root.as_deref() {
        info!(
            category = %LogCategory::Startup,
            path = %logging::resolve_desktop_log_path(root).display(),
            "desktop log path"
        );
    }

    let texts = shell_locale::shell_texts_for_locale(shell_locale::resolve_shell_locale());

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            if let Some(shell) = shell_of(app) {
                tauri::async_runtime::spawn(async move { shell.focus_frontmost().await });
            }
        }))
        .plugin(tauri_plugin_dialog::init())
        .invoke_handler(tauri::generate_handler![
            desktop_bridge_commands::shell_pick_folder,
            desktop_bridge_commands::shell_hide_and_open_picker,
            desktop_bridge_commands::shell_close_init_window,
            desktop_bridge_commands::shell_refresh_users,
            desktop_bridge_commands::shell_open_preferences,
            desktop_bridge_commands::shell_choose_user,
            desktop_bridge_commands::shell_quit,
        ])
        .on_menu_event(|app, event| handle_menu_action(app, event.id().as_ref()))
        .on_window_event(|window, event| {
            if !matches!(event, WindowEvent::Destroyed) {
                return;
            }
            let Some(role) = WindowRole::from_label(window.label()) else {
                return;
            };
            if let Some(shell) = shell_of(window.app_handle()) {
                tauri::async_runtime::spawn(async move { shell.on_window_closed(role).await });
            }
        })
        .on_page_load(|webview, payload| {
            if !matches!(payload.event(), PageLoadEvent::Finished) {
                return;
            }
            if payload.url().path().ends_with(BLANK_PAGE) {
                return;
            }
            let Some(role) = WindowRole::from_label(webview.label()) else {
                return;
            };
            info!(category = %LogCategory::Runtime, role = %role, url = %payload.url(), "page-load finished");
            if let Some(shell) = shell_of(webview.app_handle()) {
                tauri::async_runtime::spawn(async move { shell.on_page_loaded(role).await });
            }
        })
        .setup(move |app| {
            let app_handle = app.handle().clone();
            let Some(data_root) = data_root else {
                report_setup_failure(
                    &app_handle,
                    &texts,
                    &ShellError::Config("no writable data directory available".to_string()),
                );
                return Ok(());
            };

            let shell = match build_shell(&app_handle, data_root, texts) {
                Ok(shell) => shell,
                Err(error) => {
                    report_setup_failure(&app_handle, &texts, &error);
                    return Ok(());
                }
            };
            app.manage(Arc::clone(&shell));

            if let Err(error) = menu_setup::setup_menu(&app_handle, &texts) {
                warn!(category = %LogCategory::Startup, error = %error, "application menu unavailable");
            }

            tauri::async_runtime::spawn(async move {
                shell.run_boot().await;
            });
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app_handle, event| match event {
        RunEvent::ExitRequested { code, api, .. } => {
            let allowed = shell_of(app_handle).is_none_or(|shell| shell.allows_runtime_exit(code));
            if !allowed {
                info!(category = %LogCategory::Shutdown, "implicit exit held until the shell quits");
                api.prevent_exit();
            }
        }
        RunEvent::Exit => {
            if let Some(shell) = shell_of(app_handle) {
                tauri::async_runtime::block_on(shell.shutdown());
            }
        }
        _ => {}
    });
}
