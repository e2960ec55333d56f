use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::{
    backend_config::BackendContract,
    error::{ShellError, ShellResult},
    BackendEndpoint, UserIdentity, HTTP_POOL_IDLE_TIMEOUT, SESSION_REQUEST_TIMEOUT,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitializeStatus {
    pub ready: bool,
    pub needs_user_action: bool,
    pub users: Option<Vec<UserIdentity>>,
}

/// The backend calls the shell depends on. Implementations never surface
/// transport failures as errors except through `initialize_status`, whose
/// error string only feeds `ReadinessState::last_error`.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn ping(&self, timeout: Duration) -> bool;
    async fn initialize_status(&self, timeout: Duration) -> Result<InitializeStatus, String>;
    async fn list_users(&self) -> Vec<UserIdentity>;
    async fn set_active_user(&self, user: &UserIdentity) -> bool;
    async fn logout(&self, timeout: Duration) -> bool;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawUser {
    Name(String),
    Identity(UserIdentity),
}

impl RawUser {
    fn into_identity(self) -> Option<UserIdentity> {
        let identity = match self {
            RawUser::Name(name) => UserIdentity::named(name),
            RawUser::Identity(identity) => identity,
        };
        let name = identity.name.trim();
        if name.is_empty() {
            return None;
        }
        Some(UserIdentity {
            name: name.to_string(),
            short_code: identity.short_code,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInitialize {
    #[serde(default)]
    needs_user_action: bool,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    ready: Option<bool>,
    #[serde(default)]
    initialize: Option<RawInitialize>,
    #[serde(default)]
    user: Option<Vec<RawUser>>,
}

fn is_reachable_status(status: u16) -> bool {
    (200..400).contains(&status)
}

fn collect_users(raw: Vec<RawUser>) -> Vec<UserIdentity> {
    raw.into_iter().filter_map(RawUser::into_identity).collect()
}

/// A body that is not the expected status object degrades to
/// `ready = status in [200, 400)`.
pub fn parse_initialize_body(status: u16, body: &str) -> InitializeStatus {
    match serde_json::from_str::<RawStatus>(body) {
        Ok(RawStatus {
            ready: Some(ready),
            initialize,
            user,
        }) => InitializeStatus {
            ready: ready && is_reachable_status(status),
            needs_user_action: initialize.unwrap_or_default().needs_user_action,
            users: user.map(collect_users),
        },
        _ => InitializeStatus {
            ready: is_reachable_status(status),
            needs_user_action: false,
            users: None,
        },
    }
}

pub fn parse_users_body(body: &str) -> Vec<UserIdentity> {
    serde_json::from_str::<Vec<RawUser>>(body)
        .map(collect_users)
        .unwrap_or_default()
}

pub struct HttpBackendApi {
    client: Client,
    base_url: Url,
    socket_addr: String,
    contract: BackendContract,
}

impl HttpBackendApi {
    pub fn new(endpoint: &BackendEndpoint, contract: BackendContract) -> ShellResult<Self> {
        let base_url = Url::parse(&endpoint.base_url())
            .map_err(|error| ShellError::Config(format!("invalid backend endpoint: {error}")))?;
        // One pooled client for every call keeps the picker/re-login round trips on warm
        // connections. The backend is local, so system proxies are bypassed.
        let client = Client::builder()
            .no_proxy()
            .pool_idle_timeout(HTTP_POOL_IDLE_TIMEOUT)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|error| ShellError::HttpClient(error.to_string()))?;
        Ok(Self {
            client,
            base_url,
            socket_addr: endpoint.socket_addr(),
            contract,
        })
    }

    fn url(&self, path: &str) -> Option<Url> {
        self.base_url.join(path).ok()
    }

    async fn tcp_ping(&self, timeout: Duration) -> bool {
        matches!(
            tokio::time::timeout(timeout, tokio::net::TcpStream::connect(&self.socket_addr)).await,
            Ok(Ok(_))
        )
    }
}

#[async_trait]
impl BackendApi for HttpBackendApi {
    async fn ping(&self, timeout: Duration) -> bool {
        let Some(path) = self.contract.ping_path.as_deref() else {
            return self.tcp_ping(timeout).await;
        };
        let Some(url) = self.url(path) else {
            return false;
        };
        match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                debug!(error = %error, "liveness probe failed");
                false
            }
        }
    }

    async fn initialize_status(&self, timeout: Duration) -> Result<InitializeStatus, String> {
        let url = self
            .url(&self.contract.status_path)
            .ok_or_else(|| format!("invalid status path {}", self.contract.status_path))?;
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|error| format!("status probe failed: {error}"))?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(parse_initialize_body(status, &body))
    }

    async fn list_users(&self) -> Vec<UserIdentity> {
        let Some(url) = self.url(&self.contract.users_path) else {
            return Vec::new();
        };
        let response = match self
            .client
            .get(url)
            .timeout(SESSION_REQUEST_TIMEOUT)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(status = %response.status(), "user list request rejected");
                return Vec::new();
            }
            Err(error) => {
                debug!(error = %error, "user list request failed");
                return Vec::new();
            }
        };
        match response.text().await {
            Ok(body) => parse_users_body(&body),
            Err(_) => Vec::new(),
        }
    }

    async fn set_active_user(&self, user: &UserIdentity) -> bool {
        let Some(url) = self.url(&self.contract.login_path) else {
            return false;
        };
        match self
            .client
            .post(url)
            .timeout(SESSION_REQUEST_TIMEOUT)
            .json(&serde_json::json!({ "user": user.name }))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                debug!(error = %error, "login request failed");
                false
            }
        }
    }

    async fn logout(&self, timeout: Duration) -> bool {
        let Some(url) = self.url(&self.contract.logout_path) else {
            return false;
        };
        match self.client.post(url).timeout(timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                debug!(error = %error, "logout request failed");
                false
            }
        }
    }
}
