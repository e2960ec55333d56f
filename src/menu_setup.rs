use tauri::{
    menu::{Menu, MenuItem, PredefinedMenuItem, Submenu},
    AppHandle,
};

use crate::{
    menu_actions::{EditMenuItem, EDIT_MENU_ITEMS, MENU_OPEN_PREFERENCES, MENU_QUIT, PREFERENCES_ACCELERATOR},
    shell_locale::ShellTexts,
};

fn edit_entry(app_handle: &AppHandle, item: EditMenuItem) -> tauri::Result<PredefinedMenuItem<tauri::Wry>> {
    match item {
        EditMenuItem::Undo => PredefinedMenuItem::undo(app_handle, None),
        EditMenuItem::Redo => PredefinedMenuItem::redo(app_handle, None),
        EditMenuItem::Separator => PredefinedMenuItem::separator(app_handle),
        EditMenuItem::Cut => PredefinedMenuItem::cut(app_handle, None),
        EditMenuItem::Copy => PredefinedMenuItem::copy(app_handle, None),
        EditMenuItem::Paste => PredefinedMenuItem::paste(app_handle, None),
        EditMenuItem::SelectAll => PredefinedMenuItem::select_all(app_handle, None),
    }
}

fn edit_submenu(app_handle: &AppHandle, texts: &ShellTexts) -> Result<Submenu<tauri::Wry>, String> {
    let submenu = Submenu::new(app_handle, texts.menu_edit, true)
        .map_err(|error| format!("Failed to create edit submenu: {error}"))?;
    for item in EDIT_MENU_ITEMS {
        let entry = edit_entry(app_handle, item)
            .map_err(|error| format!("Failed to create edit entry {item:?}: {error}"))?;
        submenu
            .append(&entry)
            .map_err(|error| format!("Failed to append edit entry {item:?}: {error}"))?;
    }
    Ok(submenu)
}

pub(crate) fn setup_menu(app_handle: &AppHandle, texts: &ShellTexts) -> Result<(), String> {
    let preferences_item = MenuItem::with_id(
        app_handle,
        MENU_OPEN_PREFERENCES,
        texts.menu_preferences,
        true,
        Some(PREFERENCES_ACCELERATOR),
    )
    .map_err(|error| format!("Failed to create preferences menu item: {error}"))?;
    let quit_item = MenuItem::with_id(app_handle, MENU_QUIT, texts.menu_quit, true, None::<&str>)
        .map_err(|error| format!("Failed to create quit menu item: {error}"))?;
    let separator = PredefinedMenuItem::separator(app_handle)
        .map_err(|error| format!("Failed to create menu separator: {error}"))?;

    let app_submenu = Submenu::with_items(
        app_handle,
        texts.menu_app,
        true,
        &[&preferences_item, &separator, &quit_item],
    )
    .map_err(|error| format!("Failed to build application submenu: {error}"))?;
    let edit_submenu = edit_submenu(app_handle, texts)?;
    let menu = Menu::with_items(app_handle, &[&app_submenu, &edit_submenu])
        .map_err(|error| format!("Failed to build application menu: {error}"))?;

    app_handle
        .set_menu(menu)
        .map(|_| ())
        .map_err(|error| format!("Failed to install application menu: {error}"))
}
