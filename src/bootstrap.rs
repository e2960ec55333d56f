//! Startup sequence: backend up, readiness, then setup wizard or picker.

use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::{
    backend_readiness::{await_ready, require_business_ready},
    error::ShellResult,
    logging::LogCategory,
    message_channel::ShellEvent,
    shell::Shell,
    window_host::WindowHost,
    WindowRole, SPLASH_DELAY,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    SetupWizard,
    Picker,
}

impl<H: WindowHost> Shell<H> {
    /// Runs the boot sequence. Any failure aborts startup: windows are
    /// closed, the reason is shown and the process exits with code 1.
    pub async fn run_boot(&self) -> Option<BootOutcome> {
        match self.boot().await {
            Ok(outcome) => Some(outcome),
            Err(error) => {
                self.fail_fatally(&error).await;
                None
            }
        }
    }

    pub async fn boot(&self) -> ShellResult<BootOutcome> {
        let started = Instant::now();
        info!(
            category = %LogCategory::Startup,
            mode = ?self.config.mode,
            endpoint = %self.config.endpoint.base_url(),
            contract = self.config.contract.version,
            "starting backend"
        );
        {
            let mut backend = self.backend.lock().await;
            backend.start(&self.config).await?;
            self.watch_backend_exit(backend.as_ref());
        }

        // Pre-created hidden so revealing it later does not flash a blank window.
        if let Err(error) = self.windows.lock().await.ensure_hidden(WindowRole::Main) {
            warn!(category = %LogCategory::Startup, error = %error, "main window not pre-created");
        }

        let probe = await_ready(self.session.api().as_ref(), &self.config.probe);
        tokio::pin!(probe);
        let readiness = tokio::select! {
            state = &mut probe => state,
            _ = sleep(SPLASH_DELAY) => {
                self.open_splash().await;
                probe.await
            }
        };
        self.windows.lock().await.close(WindowRole::Splash);
        let readiness = require_business_ready(readiness, &self.config.probe)?;

        let needs_setup = readiness.needs_setup;
        let load_main = async {
            let mut windows = self.windows.lock().await;
            windows
                .ensure_hidden(WindowRole::Main)
                .and_then(|()| windows.load_content(WindowRole::Main))
        };
        let picker_users = async {
            if needs_setup {
                return Vec::new();
            }
            match readiness.users.clone() {
                Some(users) => users,
                None => self.session.list_users().await,
            }
        };
        let (main_loaded, users) = tokio::join!(load_main, picker_users);
        if let Err(error) = main_loaded {
            warn!(category = %LogCategory::Startup, error = %error, "main window content not loaded");
        }

        let outcome = if needs_setup {
            self.windows
                .lock()
                .await
                .create_or_focus(WindowRole::SetupWizard)?;
            BootOutcome::SetupWizard
        } else {
            self.remember_users(&users);
            let mut windows = self.windows.lock().await;
            windows.create_or_focus(WindowRole::Picker)?;
            windows.deliver_after_load(ShellEvent::Users(users))?;
            BootOutcome::Picker
        };

        info!(
            category = %LogCategory::Startup,
            outcome = ?outcome,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "boot complete"
        );
        Ok(outcome)
    }

    async fn open_splash(&self) {
        if let Err(error) = self
            .windows
            .lock()
            .await
            .create_or_focus(WindowRole::Splash)
        {
            warn!(category = %LogCategory::Startup, error = %error, "splash unavailable");
        }
    }
}
