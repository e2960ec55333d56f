use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use url::Url;

use crate::{
    error::{ShellError, ShellResult},
    BackendEndpoint, BACKEND_CMD_ENV, BACKEND_HOST_ENV, BACKEND_MODE_ENV, BACKEND_PING_PATH_ENV,
    BACKEND_PORT_ENV, BACKEND_PROBE_TIMEOUT_ENV, BACKEND_PROBE_TIMEOUT_MAX_MS,
    BACKEND_PROBE_TIMEOUT_MIN_MS, BACKEND_READY_PATH_ENV, BACKEND_TIMEOUT_ENV,
    BACKEND_TIMEOUT_MAX_MS, BACKEND_TIMEOUT_MIN_MS, DEFAULT_BACKEND_HOST, DEFAULT_BACKEND_PORT,
    DEFAULT_BACKEND_PROBE_TIMEOUT_MS, DEFAULT_BACKEND_TIMEOUT_MS, DEV_MODE_ENV,
    DEV_SERVER_URL_ENV, FLOW_DIR_ENV, READY_POLL_MAX_DELAY, READY_POLL_MIN_DELAY,
    READY_POLL_MULTIPLIER,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Subprocess,
    Embedded,
}

/// HTTP surface the shell relies on. Treated as one versioned unit so a
/// backend upgrade swaps the whole set rather than individual paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendContract {
    pub version: &'static str,
    /// `None` probes transport liveness with a plain TCP connect.
    pub ping_path: Option<String>,
    pub status_path: String,
    pub users_path: String,
    pub login_path: String,
    pub logout_path: String,
}

impl BackendContract {
    pub fn v1() -> Self {
        Self {
            version: "v1",
            ping_path: None,
            status_path: "/api/initialize".to_string(),
            users_path: "/api/user".to_string(),
            login_path: "/api/login".to_string(),
            logout_path: "/api/logout".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSettings {
    pub overall_timeout: Duration,
    pub probe_timeout: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            overall_timeout: Duration::from_millis(DEFAULT_BACKEND_TIMEOUT_MS),
            probe_timeout: Duration::from_millis(DEFAULT_BACKEND_PROBE_TIMEOUT_MS),
            min_delay: READY_POLL_MIN_DELAY,
            max_delay: READY_POLL_MAX_DELAY,
            multiplier: READY_POLL_MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub data_root: PathBuf,
    pub resource_dir: PathBuf,
    pub endpoint: BackendEndpoint,
    pub mode: BackendMode,
    pub custom_command: Option<String>,
    pub flow_dir: PathBuf,
    pub dev_mode: bool,
    pub dev_server_url: Option<Url>,
    pub contract: BackendContract,
    pub probe: ProbeSettings,
}

impl ShellConfig {
    pub fn from_env(data_root: PathBuf, resource_dir: PathBuf) -> ShellResult<Self> {
        Self::from_lookup(data_root, resource_dir, |key| env::var(key).ok())
    }

    pub fn from_lookup<F>(data_root: PathBuf, resource_dir: PathBuf, lookup: F) -> ShellResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let dev_mode = read(DEV_MODE_ENV).is_some_and(|value| parse_flag(&value));
        let host = match read(BACKEND_HOST_ENV) {
            Some(raw) => normalize_backend_host(&raw)?,
            None => DEFAULT_BACKEND_HOST.to_string(),
        };
        let port = match read(BACKEND_PORT_ENV) {
            Some(raw) => parse_port(&raw)?,
            None => DEFAULT_BACKEND_PORT,
        };
        let mode = match read(BACKEND_MODE_ENV).as_deref() {
            None | Some("subprocess") => BackendMode::Subprocess,
            Some("embedded") => BackendMode::Embedded,
            Some(other) => {
                return Err(ShellError::Config(format!(
                    "{BACKEND_MODE_ENV} must be 'subprocess' or 'embedded', got '{other}'"
                )))
            }
        };
        let flow_dir = read(FLOW_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| default_flow_dir(&resource_dir));
        let dev_server_url = read(DEV_SERVER_URL_ENV)
            .map(|raw| parse_dev_server_url(&raw))
            .transpose()?;

        let mut contract = BackendContract::v1();
        if let Some(raw) = read(BACKEND_PING_PATH_ENV) {
            contract.ping_path = Some(normalize_http_path(&raw)?);
        }
        if let Some(raw) = read(BACKEND_READY_PATH_ENV) {
            contract.status_path = normalize_http_path(&raw)?;
        }

        let probe = ProbeSettings {
            overall_timeout: parse_clamped_ms(
                read(BACKEND_TIMEOUT_ENV).as_deref(),
                DEFAULT_BACKEND_TIMEOUT_MS,
                BACKEND_TIMEOUT_MIN_MS,
                BACKEND_TIMEOUT_MAX_MS,
            ),
            probe_timeout: parse_clamped_ms(
                read(BACKEND_PROBE_TIMEOUT_ENV).as_deref(),
                DEFAULT_BACKEND_PROBE_TIMEOUT_MS,
                BACKEND_PROBE_TIMEOUT_MIN_MS,
                BACKEND_PROBE_TIMEOUT_MAX_MS,
            ),
            ..ProbeSettings::default()
        };

        Ok(Self {
            data_root,
            resource_dir,
            endpoint: BackendEndpoint {
                host,
                port,
                admin_path_enabled: dev_mode,
            },
            mode,
            custom_command: read(BACKEND_CMD_ENV),
            flow_dir,
            dev_mode,
            dev_server_url,
            contract,
            probe,
        })
    }
}

pub fn default_flow_dir(resource_dir: &Path) -> PathBuf {
    resource_dir.join("node-red-portable")
}

pub(crate) fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

pub(crate) fn parse_clamped_ms(raw: Option<&str>, default_ms: u64, min_ms: u64, max_ms: u64) -> Duration {
    let parsed = raw
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(parsed.clamp(min_ms, max_ms))
}

fn parse_port(raw: &str) -> ShellResult<u16> {
    match raw.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(ShellError::Config(format!(
            "{BACKEND_PORT_ENV} must be a port between 1 and 65535, got '{raw}'"
        ))),
        Ok(port) => Ok(port),
    }
}

fn normalize_backend_host(raw: &str) -> ShellResult<String> {
    let host = raw.trim();
    let valid = !host.is_empty()
        && host
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | ':' | '[' | ']'));
    if !valid {
        return Err(ShellError::Config(format!(
            "{BACKEND_HOST_ENV} is not a valid host: '{raw}'"
        )));
    }
    Ok(host.to_string())
}

fn normalize_http_path(raw: &str) -> ShellResult<String> {
    let trimmed = raw.trim();
    if trimmed.contains("://") || trimmed.contains(char::is_whitespace) {
        return Err(ShellError::Config(format!(
            "expected an absolute URL path, got '{raw}'"
        )));
    }
    if trimmed.starts_with('/') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("/{trimmed}"))
    }
}

fn parse_dev_server_url(raw: &str) -> ShellResult<Url> {
    let parsed = Url::parse(raw.trim())
        .map_err(|error| ShellError::Config(format!("invalid {DEV_SERVER_URL_ENV}: {error}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(ShellError::Config(format!(
            "unsupported {DEV_SERVER_URL_ENV} scheme '{scheme}', only http/https are allowed"
        ))),
    }
}
