use std::{env, path::PathBuf};

use crate::{APP_DIR_NAME, DATA_ROOT_ENV, RESOURCE_DIR_ENV};

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Writable per-user state root, shared with the backend via the handshake file.
pub fn default_data_root() -> Option<PathBuf> {
    env_path(DATA_ROOT_ENV).or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME)))
}

/// Directory holding the bundled backend runtime when no packaging layer
/// supplies one.
pub fn default_resource_dir() -> Option<PathBuf> {
    env_path(RESOURCE_DIR_ENV).or_else(|| {
        env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(PathBuf::from))
    })
}

pub fn logs_dir(data_root: &std::path::Path) -> PathBuf {
    data_root.join("logs")
}
