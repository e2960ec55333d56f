//! The coordinator every window event and bridge call goes through.
//!
//! Window state sits behind one async mutex, so transitions triggered by
//! different windows are applied one at a time. Network calls are made
//! without holding it.

use std::{
    path::PathBuf,
    sync::{atomic::AtomicBool, Arc, Mutex},
};

use tracing::{error, info, warn};

use crate::{
    backend_config::ShellConfig,
    backend_http::BackendApi,
    backend_process::{BackendExitEvent, BackendProcess},
    error::{ShellError, ShellResult},
    exit_state::ExitStateMachine,
    logging::LogCategory,
    message_channel::{self, BridgeVerb, HideAndOpenOptions, ShellEvent},
    session_client::SessionClient,
    shell_locale::ShellTexts,
    subscription::Subscription,
    window_controller::{wait_until_hidden, CloseOutcome, WindowController},
    window_host::WindowHost,
    AtomicFlagGuard, BridgeResult, UserIdentity, WindowRole, LOGOUT_TIMEOUT,
};

pub struct Shell<H: WindowHost> {
    pub(crate) config: ShellConfig,
    pub(crate) texts: ShellTexts,
    pub(crate) host: Arc<H>,
    pub(crate) windows: tokio::sync::Mutex<WindowController<H>>,
    pub(crate) session: SessionClient,
    pub(crate) backend: tokio::sync::Mutex<Box<dyn BackendProcess>>,
    backend_exit: Mutex<Option<Subscription>>,
    known_users: Mutex<Vec<UserIdentity>>,
    picker_flow: AtomicBool,
    choice_flow: AtomicBool,
    exit_state: Mutex<ExitStateMachine>,
}

impl<H: WindowHost> Shell<H> {
    pub fn new(
        config: ShellConfig,
        host: Arc<H>,
        api: Arc<dyn BackendApi>,
        backend: Box<dyn BackendProcess>,
        texts: ShellTexts,
    ) -> Self {
        let windows = WindowController::new(Arc::clone(&host), config.dev_server_url.clone());
        Self {
            config,
            texts,
            host,
            windows: tokio::sync::Mutex::new(windows),
            session: SessionClient::new(api),
            backend: tokio::sync::Mutex::new(backend),
            backend_exit: Mutex::new(None),
            known_users: Mutex::new(Vec::new()),
            picker_flow: AtomicBool::new(false),
            choice_flow: AtomicBool::new(false),
            exit_state: Mutex::new(ExitStateMachine::default()),
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionClient {
        &self.session
    }

    pub fn windows(&self) -> &tokio::sync::Mutex<WindowController<H>> {
        &self.windows
    }

    pub fn is_quitting(&self) -> bool {
        self.exit_state
            .lock()
            .map(|state| state.is_quitting())
            .unwrap_or(true)
    }

    /// Decides a runtime exit request. Implicit exits (no code) are held
    /// back until the shell has stopped the backend itself.
    pub fn allows_runtime_exit(&self, code: Option<i32>) -> bool {
        self.exit_state
            .lock()
            .map(|state| state.allows_runtime_exit(code))
            .unwrap_or(true)
    }

    fn authorize(&self, caller: WindowRole, verb: BridgeVerb) -> ShellResult<()> {
        message_channel::authorize(caller, verb).inspect_err(|error| {
            warn!(category = %LogCategory::Runtime, error = %error, "bridge call refused");
        })
    }

    pub(crate) fn watch_backend_exit(&self, backend: &dyn BackendProcess) {
        let subscription = backend.on_exit(Box::new(|event: &BackendExitEvent| {
            info!(
                category = %LogCategory::Runtime,
                code = ?event.code,
                signal = ?event.signal,
                at = %event.at.format("%Y-%m-%d %H:%M:%S"),
                "backend exited"
            );
        }));
        if let Ok(mut slot) = self.backend_exit.lock() {
            *slot = Some(subscription);
        }
    }

    pub(crate) fn remember_users(&self, users: &[UserIdentity]) {
        if let Ok(mut known) = self.known_users.lock() {
            *known = users.to_vec();
        }
    }

    fn known_user(&self, name: &str) -> Option<UserIdentity> {
        self.known_users
            .lock()
            .ok()?
            .iter()
            .find(|user| user.name == name)
            .cloned()
    }

    async fn fetch_users(&self) -> Vec<UserIdentity> {
        let users = self.session.list_users().await;
        self.remember_users(&users);
        users
    }

    /// A chosen name must be one the backend handed out. One refresh is
    /// attempted before the choice is rejected.
    async fn resolve_chosen_user(&self, name: &str) -> ShellResult<UserIdentity> {
        if let Some(user) = self.known_user(name) {
            return Ok(user);
        }
        self.fetch_users().await;
        self.known_user(name)
            .ok_or_else(|| ShellError::UnknownUser(name.to_string()))
    }

    async fn send_users_to_picker(&self, users: Vec<UserIdentity>) {
        let mut windows = self.windows.lock().await;
        if !windows.is_open(WindowRole::Picker) {
            return;
        }
        if let Err(error) = windows.deliver_after_load(ShellEvent::Users(users)) {
            warn!(error = %error, "failed to send users to picker");
        }
    }

    /// Picker selection: activates the user, reveals Main and retires the
    /// picker and splash. Returns whether the backend accepted the user.
    /// A choice arriving while another is in flight is dropped.
    pub async fn choose_user(&self, caller: WindowRole, name: &str) -> ShellResult<bool> {
        self.authorize(caller, BridgeVerb::Choose)?;
        let Some(_guard) = AtomicFlagGuard::try_set(&self.choice_flow) else {
            info!(category = %LogCategory::Session, "user choice already in progress");
            return Ok(true);
        };
        let user = self.resolve_chosen_user(name.trim()).await?;

        if !self.session.set_active_user(&user).await {
            let users = self.fetch_users().await;
            self.send_users_to_picker(users).await;
            return Ok(false);
        }

        let mut windows = self.windows.lock().await;
        windows.ensure_hidden(WindowRole::Main)?;
        if windows.is_loaded(WindowRole::Main) {
            // Fresh page per session, as after a re-login.
            windows.reload(WindowRole::Main)?;
        } else {
            windows.load_content_if_blank(WindowRole::Main)?;
        }
        windows.deliver_after_load(ShellEvent::ActiveUser(user.clone()))?;
        windows.reveal(WindowRole::Main)?;
        windows.close(WindowRole::Picker);
        windows.close(WindowRole::Splash);
        info!(category = %LogCategory::Session, user = %user.name, "main window revealed");
        Ok(true)
    }

    pub async fn quit(&self, caller: WindowRole) -> ShellResult<()> {
        self.authorize(caller, BridgeVerb::Quit)?;
        self.request_exit(0).await;
        Ok(())
    }

    /// Re-login: closes preferences, hides Main, optionally logs out, then
    /// shows the picker with a fresh user list. Overlapping calls collapse
    /// into the one already running.
    pub async fn hide_and_open_picker(
        &self,
        caller: WindowRole,
        options: HideAndOpenOptions,
    ) -> BridgeResult {
        if let Err(error) = self.authorize(caller, BridgeVerb::HideAndOpenPicker) {
            return BridgeResult::failed(error.to_string());
        }
        let Some(_guard) = AtomicFlagGuard::try_set(&self.picker_flow) else {
            info!(category = %LogCategory::Session, "picker flow already running");
            return BridgeResult::ok();
        };

        match self.open_picker_flow(options.do_logout).await {
            Ok(()) => BridgeResult::ok(),
            Err(error) => {
                warn!(category = %LogCategory::Session, error = %error, "picker flow failed");
                BridgeResult::failed(error.to_string())
            }
        }
    }

    async fn open_picker_flow(&self, do_logout: bool) -> ShellResult<()> {
        self.windows.lock().await.close(WindowRole::Preferences);
        self.hide_robust(WindowRole::Main).await;
        if do_logout {
            self.session.logout(LOGOUT_TIMEOUT).await;
        }
        self.windows.lock().await.create_or_focus(WindowRole::Picker)?;
        let users = self.fetch_users().await;
        self.send_users_to_picker(users).await;
        Ok(())
    }

    /// Hides `role` even when it is fullscreen or pinned, minimizing it when
    /// the window manager keeps it visible. The window lock is not held while
    /// polling, so load and close reports are handled in the meantime.
    async fn hide_robust(&self, role: WindowRole) {
        if !self.windows.lock().await.begin_hide(role) {
            return;
        }
        if wait_until_hidden(self.host.as_ref(), role).await {
            return;
        }
        self.windows.lock().await.minimize_if_visible(role);
    }

    /// Setup finished: closes the wizard without quitting and continues with
    /// the picker.
    pub async fn close_init_window(&self, caller: WindowRole) -> ShellResult<bool> {
        self.authorize(caller, BridgeVerb::CloseInitWindow)?;
        let closed = self.windows.lock().await.close(WindowRole::SetupWizard);
        if closed {
            self.open_picker_flow(false).await?;
        }
        Ok(closed)
    }

    pub async fn refresh_users(&self, caller: WindowRole) -> ShellResult<Vec<UserIdentity>> {
        self.authorize(caller, BridgeVerb::RefreshUsers)?;
        let users = self.fetch_users().await;
        self.send_users_to_picker(users.clone()).await;
        Ok(users)
    }

    /// Only ever returns a path produced by the shell's own dialog.
    pub async fn pick_folder(
        &self,
        caller: WindowRole,
        title: Option<&str>,
        default_path: Option<&str>,
    ) -> ShellResult<Option<PathBuf>> {
        self.authorize(caller, BridgeVerb::PickFolder)?;
        let request = message_channel::sanitize_folder_request(
            title,
            default_path,
            self.texts.folder_dialog_title,
        );
        Ok(self
            .host
            .pick_folder(&request, self.texts.folder_dialog_button)
            .await)
    }

    /// `caller` is `None` for the application menu.
    pub async fn open_preferences(&self, caller: Option<WindowRole>) -> ShellResult<()> {
        if let Some(caller) = caller {
            self.authorize(caller, BridgeVerb::OpenPreferences)?;
        }
        self.windows.lock().await.open_preferences().inspect_err(|error| {
            warn!(category = %LogCategory::Runtime, error = %error, "preferences unavailable");
        })
    }

    pub async fn on_page_loaded(&self, role: WindowRole) {
        if let Err(error) = self.windows.lock().await.mark_loaded(role) {
            warn!(category = %LogCategory::Runtime, error = %error, "post-load delivery failed");
        }
    }

    pub async fn on_window_closed(&self, role: WindowRole) {
        let outcome = self.windows.lock().await.handle_closed(role);
        if outcome == CloseOutcome::QuitApplication {
            self.request_exit(0).await;
        }
    }

    /// Content crashed or hung: the window is offered a reload instead of
    /// taking the application down.
    pub async fn on_content_fault(&self, role: WindowRole, reason: &str) {
        let fault = ShellError::ContentFault {
            role,
            reason: reason.to_string(),
        };
        warn!(category = %LogCategory::Runtime, error = %fault, "window content fault");
        if self.is_quitting() {
            return;
        }
        let reload = self
            .host
            .confirm(self.texts.content_fault_title, self.texts.content_fault_message)
            .await;
        if reload {
            if let Err(error) = self.windows.lock().await.reload(role) {
                warn!(error = %error, "reload after content fault failed");
            }
        }
    }

    /// Second application launch: bring the running instance to front.
    pub async fn focus_frontmost(&self) {
        let mut windows = self.windows.lock().await;
        if let Some(role) = windows.frontmost_candidate() {
            if let Err(error) = windows.reveal(role) {
                warn!(error = %error, "could not focus running instance");
            }
        }
    }

    fn begin_exit(&self) -> bool {
        self.exit_state
            .lock()
            .map(|mut state| state.request_quit())
            .unwrap_or(false)
    }

    pub async fn request_exit(&self, code: i32) {
        if !self.begin_exit() {
            return;
        }
        info!(category = %LogCategory::Shutdown, code, "application quitting");
        self.shutdown().await;
        self.host.exit(code);
    }

    /// Fatal boot failure: no window is left visible, the reason is shown
    /// in a blocking dialog, the backend is stopped and the process exits 1.
    /// Windows are only hidden while the dialog is up; destroying the last
    /// one would let the runtime exit before the dialog is answered.
    pub async fn fail_fatally(&self, error: &ShellError) {
        error!(category = %LogCategory::Startup, error = %error, fatal = error.is_fatal(), "boot aborted");
        if !self.begin_exit() {
            return;
        }
        self.windows.lock().await.hide_all();
        self.host
            .show_fatal_error(self.texts.fatal_error_title, &error.to_string())
            .await;
        self.windows.lock().await.close_all();
        self.shutdown().await;
        self.host.exit(1);
    }

    /// Stops the backend once, whichever exit path gets here first.
    pub async fn shutdown(&self) {
        let first = self
            .exit_state
            .lock()
            .map(|mut state| state.try_begin_cleanup())
            .unwrap_or(false);
        if !first {
            return;
        }
        self.backend.lock().await.stop().await;
        if let Ok(mut subscription) = self.backend_exit.lock() {
            subscription.take();
        }
        if let Ok(mut state) = self.exit_state.lock() {
            state.finish_cleanup();
        }
        info!(category = %LogCategory::Shutdown, "backend stopped");
    }
}
