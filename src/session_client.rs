use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

use tracing::{info, warn};

use crate::{backend_http::BackendApi, logging::LogCategory, Session, UserIdentity};

/// Session-facing wrapper around the backend. The only writer of [`Session`].
#[derive(Clone)]
pub struct SessionClient {
    api: Arc<dyn BackendApi>,
    session: Arc<RwLock<Session>>,
}

impl SessionClient {
    pub fn new(api: Arc<dyn BackendApi>) -> Self {
        Self {
            api,
            session: Arc::new(RwLock::new(Session::default())),
        }
    }

    pub fn api(&self) -> &Arc<dyn BackendApi> {
        &self.api
    }

    pub fn session(&self) -> Session {
        self.session
            .read()
            .map(|session| session.clone())
            .unwrap_or_default()
    }

    pub fn active_user(&self) -> Option<UserIdentity> {
        self.session().active_user
    }

    /// Always asks the backend; results are never cached.
    pub async fn list_users(&self) -> Vec<UserIdentity> {
        self.api.list_users().await
    }

    pub async fn set_active_user(&self, user: &UserIdentity) -> bool {
        let accepted = self.api.set_active_user(user).await;
        if accepted {
            info!(category = %LogCategory::Session, user = %user.name, "active user set");
            self.write_session(Some(user.clone()));
        } else {
            warn!(category = %LogCategory::Session, user = %user.name, "backend rejected active user");
        }
        accepted
    }

    /// The local session is cleared whatever the backend answers.
    pub async fn logout(&self, timeout: Duration) -> bool {
        let accepted = self.api.logout(timeout).await;
        if !accepted {
            warn!(category = %LogCategory::Session, "logout was not acknowledged by the backend");
        }
        self.write_session(None);
        accepted
    }

    fn write_session(&self, active_user: Option<UserIdentity>) {
        let mut session = self
            .session
            .write()
            .unwrap_or_else(|error| error.into_inner());
        session.active_user = active_user;
    }
}
