use std::time::Duration;

pub const APP_DIR_NAME: &str = "immo24-studioassistent";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BACKEND_HOST: &str = "127.0.0.1";
pub const DEFAULT_BACKEND_PORT: u16 = 1880;
pub const BACKEND_HOST_ENV: &str = "STUDIO_BACKEND_HOST";
pub const BACKEND_PORT_ENV: &str = "STUDIO_BACKEND_PORT";
pub const BACKEND_MODE_ENV: &str = "STUDIO_BACKEND_MODE";
pub const BACKEND_CMD_ENV: &str = "STUDIO_BACKEND_CMD";
pub const FLOW_DIR_ENV: &str = "STUDIO_FLOW_DIR";
pub const DEV_MODE_ENV: &str = "STUDIO_DEV_MODE";
pub const DEV_SERVER_URL_ENV: &str = "STUDIO_DEV_SERVER_URL";
pub const DATA_ROOT_ENV: &str = "STUDIO_DATA_ROOT";
pub const RESOURCE_DIR_ENV: &str = "STUDIO_RESOURCE_DIR";
pub const LOG_FILTER_ENV: &str = "STUDIO_LOG";
pub const LOCALE_ENV: &str = "STUDIO_DESKTOP_LOCALE";

pub const BACKEND_TIMEOUT_ENV: &str = "STUDIO_BACKEND_TIMEOUT_MS";
pub const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 12_000;
pub const BACKEND_TIMEOUT_MIN_MS: u64 = 1_000;
pub const BACKEND_TIMEOUT_MAX_MS: u64 = 10 * 60 * 1000;

pub const BACKEND_PROBE_TIMEOUT_ENV: &str = "STUDIO_BACKEND_PROBE_TIMEOUT_MS";
pub const DEFAULT_BACKEND_PROBE_TIMEOUT_MS: u64 = 1_500;
pub const BACKEND_PROBE_TIMEOUT_MIN_MS: u64 = 100;
pub const BACKEND_PROBE_TIMEOUT_MAX_MS: u64 = 30_000;

pub const BACKEND_PING_PATH_ENV: &str = "STUDIO_BACKEND_PING_PATH";
pub const BACKEND_READY_PATH_ENV: &str = "STUDIO_BACKEND_READY_PATH";

pub const READY_POLL_MIN_DELAY: Duration = Duration::from_millis(120);
pub const READY_POLL_MAX_DELAY: Duration = Duration::from_millis(600);
pub const READY_POLL_MULTIPLIER: f64 = 1.6;

pub const LOGOUT_TIMEOUT: Duration = Duration::from_millis(1_200);
pub const SESSION_REQUEST_TIMEOUT: Duration = Duration::from_millis(3_000);
pub const HTTP_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

pub const SPLASH_DELAY: Duration = Duration::from_millis(250);
pub const ROBUST_HIDE_MAX_WAIT: Duration = Duration::from_millis(900);
pub const ROBUST_HIDE_POLL_INTERVAL: Duration = Duration::from_millis(40);
pub const BACKEND_STOP_GRACE: Duration = Duration::from_secs(3);

pub const HANDSHAKE_FILE: &str = "AppBasePath.json";
pub const SEED_FILES: [&str; 2] = ["path.json", "adminpw.json"];
pub const DESKTOP_LOG_FILE: &str = "desktop.log";

pub const ACTIVE_USER_EVENT: &str = "active-user";
pub const USERS_EVENT: &str = "users";

pub const DEFAULT_SHELL_LOCALE: &str = "de-DE";
pub const FOLDER_DIALOG_TITLE_MAX_CHARS: usize = 120;
