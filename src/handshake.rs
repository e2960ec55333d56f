//! Files the shell leaves in the data root for the backend to pick up.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::{
    error::{ShellError, ShellResult},
    HANDSHAKE_FILE, SEED_FILES,
};

#[derive(Debug, Serialize)]
struct HandshakePayload<'a> {
    #[serde(rename = "AppBasePath")]
    app_base_path: &'a Path,
}

fn io_error(path: &Path, source: std::io::Error) -> ShellError {
    ShellError::Handshake {
        path: path.to_path_buf(),
        source,
    }
}

/// Rewritten on every boot so a moved data root is always picked up.
pub fn write_handshake_file(data_root: &Path) -> ShellResult<PathBuf> {
    fs::create_dir_all(data_root).map_err(|error| io_error(data_root, error))?;
    let path = data_root.join(HANDSHAKE_FILE);
    let payload = serde_json::to_string_pretty(&HandshakePayload {
        app_base_path: data_root,
    })
    .map_err(|error| io_error(&path, std::io::Error::other(error)))?;
    fs::write(&path, payload).map_err(|error| io_error(&path, error))?;
    Ok(path)
}

/// Copies bundled defaults for the backend's user files into the data root.
/// Existing files are left untouched; missing bundles fall back to `{}`.
pub fn ensure_seed_files(data_root: &Path, assets_dir: &Path) -> ShellResult<Vec<PathBuf>> {
    fs::create_dir_all(data_root).map_err(|error| io_error(data_root, error))?;
    let mut created = Vec::new();
    for file in SEED_FILES {
        let dest = data_root.join(file);
        if dest.exists() {
            continue;
        }
        let src = assets_dir.join(file);
        if src.is_file() {
            fs::copy(&src, &dest).map_err(|error| io_error(&dest, error))?;
        } else {
            fs::write(&dest, "{}").map_err(|error| io_error(&dest, error))?;
        }
        created.push(dest);
    }
    Ok(created)
}
