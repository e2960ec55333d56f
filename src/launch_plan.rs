use std::path::{Path, PathBuf};

use crate::{
    backend_config::ShellConfig,
    error::{ShellError, ShellResult},
    APP_VERSION, BACKEND_CMD_ENV,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub cmd: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

pub fn resolve_launch_plan(config: &ShellConfig) -> ShellResult<LaunchPlan> {
    match &config.custom_command {
        Some(custom_cmd) => resolve_custom_launch(config, custom_cmd),
        None => resolve_bundled_launch(config, &bundled_node_relative()),
    }
}

pub fn bundled_node_relative() -> PathBuf {
    let name = if cfg!(target_os = "windows") {
        "node.exe"
    } else if cfg!(target_os = "macos") {
        if cfg!(target_arch = "aarch64") {
            "node-arm64"
        } else {
            "node-x64"
        }
    } else {
        "node"
    };
    PathBuf::from("bin").join(name)
}

pub fn bundled_entry_relative() -> PathBuf {
    PathBuf::from("node-red-portable")
        .join("node_modules")
        .join("node-red")
        .join("red.js")
}

fn backend_env(config: &ShellConfig) -> Vec<(String, String)> {
    let mut env = vec![
        (
            "IMMO24_USERDATA".to_string(),
            config.data_root.to_string_lossy().to_string(),
        ),
        ("APP_VERSION".to_string(), APP_VERSION.to_string()),
    ];
    if config.endpoint.admin_path_enabled {
        env.push(("STUDIO_ADMIN_ENABLED".to_string(), "1".to_string()));
    }
    env
}

fn resolve_custom_launch(config: &ShellConfig, custom_cmd: &str) -> ShellResult<LaunchPlan> {
    let mut pieces = shlex::split(custom_cmd)
        .ok_or_else(|| ShellError::Spawn(format!("Invalid {BACKEND_CMD_ENV}: {custom_cmd}")))?;
    if pieces.is_empty() {
        return Err(ShellError::Spawn(format!("{BACKEND_CMD_ENV} is empty.")));
    }

    let cmd = PathBuf::from(pieces.remove(0));
    Ok(LaunchPlan {
        cmd,
        args: pieces,
        cwd: config.flow_dir.clone(),
        env: backend_env(config),
    })
}

pub(crate) fn resolve_bundled_launch(
    config: &ShellConfig,
    node_relative: &Path,
) -> ShellResult<LaunchPlan> {
    let node_binary = config.resource_dir.join(node_relative);
    if !node_binary.is_file() {
        return Err(ShellError::Spawn(format!(
            "Bundled node executable is missing: {}",
            node_binary.display()
        )));
    }

    let entrypoint = config.resource_dir.join(bundled_entry_relative());
    if !entrypoint.is_file() {
        return Err(ShellError::Spawn(format!(
            "Backend entry point is missing: {}",
            entrypoint.display()
        )));
    }

    Ok(LaunchPlan {
        cmd: node_binary,
        args: vec![
            entrypoint.to_string_lossy().to_string(),
            "-u".to_string(),
            config.flow_dir.to_string_lossy().to_string(),
            "--port".to_string(),
            config.endpoint.port.to_string(),
        ],
        cwd: config.flow_dir.clone(),
        env: backend_env(config),
    })
}

pub fn build_debug_command(plan: &LaunchPlan) -> Vec<String> {
    let mut parts = vec![plan.cmd.to_string_lossy().to_string()];
    parts.extend(plan.args.clone());
    parts
}
