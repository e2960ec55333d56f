pub const MENU_OPEN_PREFERENCES: &str = "menu_open_preferences";
pub const MENU_QUIT: &str = "menu_quit";
pub const PREFERENCES_ACCELERATOR: &str = "CmdOrCtrl+,";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    OpenPreferences,
    Quit,
}

/// Native edit entries. Without them macOS routes no clipboard shortcuts to
/// the webviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMenuItem {
    Undo,
    Redo,
    Separator,
    Cut,
    Copy,
    Paste,
    SelectAll,
}

pub const EDIT_MENU_ITEMS: [EditMenuItem; 7] = [
    EditMenuItem::Undo,
    EditMenuItem::Redo,
    EditMenuItem::Separator,
    EditMenuItem::Cut,
    EditMenuItem::Copy,
    EditMenuItem::Paste,
    EditMenuItem::SelectAll,
];

pub fn action_from_menu_id(menu_id: &str) -> Option<MenuAction> {
    match menu_id {
        MENU_OPEN_PREFERENCES => Some(MenuAction::OpenPreferences),
        MENU_QUIT => Some(MenuAction::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_from_menu_id_maps_all_known_actions() {
        assert_eq!(
            action_from_menu_id(MENU_OPEN_PREFERENCES),
            Some(MenuAction::OpenPreferences)
        );
        assert_eq!(action_from_menu_id(MENU_QUIT), Some(MenuAction::Quit));
    }

    #[test]
    fn edit_menu_carries_clipboard_entries() {
        for item in [
            EditMenuItem::Undo,
            EditMenuItem::Redo,
            EditMenuItem::Cut,
            EditMenuItem::Copy,
            EditMenuItem::Paste,
            EditMenuItem::SelectAll,
        ] {
            assert_eq!(EDIT_MENU_ITEMS.iter().filter(|entry| **entry == item).count(), 1);
        }
        let position = |item| EDIT_MENU_ITEMS.iter().position(|entry| *entry == item);
        assert!(position(EditMenuItem::Redo) < position(EditMenuItem::Separator));
        assert!(position(EditMenuItem::Separator) < position(EditMenuItem::Cut));
    }

    #[test]
    fn action_from_menu_id_returns_none_for_unknown_menu_id() {
        assert_eq!(action_from_menu_id("unknown-menu"), None);
    }
}
