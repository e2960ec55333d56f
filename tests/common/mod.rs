//! Test harness for shell integration tests: a recording window host, a
//! scripted backend API and a backend process that only counts calls.

#![allow(dead_code)]

use std::{
    collections::BTreeSet,
    path::PathBuf,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Duration,
};

use async_trait::async_trait;
use studio_shell::{
    backend_config::ShellConfig,
    backend_http::{BackendApi, InitializeStatus},
    backend_process::{BackendExitEvent, BackendProcess},
    message_channel::{FolderRequest, ShellEvent},
    shell_locale::shell_texts_for_locale,
    subscription::{Listeners, Subscription},
    window_host::{ContentTarget, WindowHost, WindowSpec},
    Shell, ShellResult, UserIdentity, WindowRole,
};

#[derive(Debug, Default)]
pub struct HostLog {
    pub alive: BTreeSet<WindowRole>,
    pub visible: BTreeSet<WindowRole>,
    pub created: Vec<WindowRole>,
    pub emitted: Vec<(WindowRole, ShellEvent)>,
    pub fatal_errors: Vec<String>,
    /// Windows alive and visible while the fatal dialog was up.
    pub dialog_snapshot: Option<(BTreeSet<WindowRole>, BTreeSet<WindowRole>)>,
    pub exit_codes: Vec<i32>,
    /// Roles the window manager refuses to hide.
    pub sticky: BTreeSet<WindowRole>,
    pub minimized: Vec<WindowRole>,
}

/// Window host that records every call. Windows only change state through
/// the shell; user-initiated closes are simulated with [`TestHarness::user_closes`].
#[derive(Default)]
pub struct FakeHost {
    log: Mutex<HostLog>,
}

impl FakeHost {
    pub fn log(&self) -> MutexGuard<'_, HostLog> {
        self.log.lock().unwrap()
    }

    pub fn created_count(&self, role: WindowRole) -> usize {
        self.log().created.iter().filter(|created| **created == role).count()
    }

    pub fn events_for(&self, role: WindowRole) -> Vec<ShellEvent> {
        self.log()
            .emitted
            .iter()
            .filter(|(target, _)| *target == role)
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn visible(&self) -> BTreeSet<WindowRole> {
        self.log().visible.clone()
    }
}

#[async_trait]
impl WindowHost for FakeHost {
    fn create(&self, spec: &WindowSpec) -> Result<(), String> {
        let mut log = self.log();
        if !log.alive.insert(spec.role) {
            return Err(format!("a {} window already exists", spec.role));
        }
        log.created.push(spec.role);
        if spec.visible {
            log.visible.insert(spec.role);
        }
        Ok(())
    }

    fn navigate(&self, _role: WindowRole, _target: &ContentTarget) -> Result<(), String> {
        Ok(())
    }

    fn show(&self, role: WindowRole) -> Result<(), String> {
        let mut log = self.log();
        if !log.alive.contains(&role) {
            return Err(format!("{role} window not found"));
        }
        log.visible.insert(role);
        Ok(())
    }

    fn focus(&self, _role: WindowRole) -> Result<(), String> {
        Ok(())
    }

    fn hide(&self, role: WindowRole) -> Result<(), String> {
        let mut log = self.log();
        if !log.sticky.contains(&role) {
            log.visible.remove(&role);
        }
        Ok(())
    }

    fn minimize(&self, role: WindowRole) -> Result<(), String> {
        self.log().minimized.push(role);
        Ok(())
    }

    fn close(&self, role: WindowRole) -> Result<(), String> {
        let mut log = self.log();
        log.alive.remove(&role);
        log.visible.remove(&role);
        Ok(())
    }

    fn is_visible(&self, role: WindowRole) -> bool {
        self.log().visible.contains(&role)
    }

    fn release_presentation_flags(&self, _role: WindowRole) -> Result<(), String> {
        Ok(())
    }

    fn reload(&self, _role: WindowRole) -> Result<(), String> {
        Ok(())
    }

    fn emit(&self, role: WindowRole, event: &ShellEvent) -> Result<(), String> {
        self.log().emitted.push((role, event.clone()));
        Ok(())
    }

    fn exit(&self, code: i32) {
        self.log().exit_codes.push(code);
    }

    async fn show_fatal_error(&self, _title: &str, message: &str) {
        let mut log = self.log();
        log.fatal_errors.push(message.to_string());
        log.dialog_snapshot = Some((log.alive.clone(), log.visible.clone()));
    }

    async fn confirm(&self, _title: &str, _message: &str) -> bool {
        true
    }

    async fn pick_folder(&self, request: &FolderRequest, _button_label: &str) -> Option<PathBuf> {
        request.default_path.clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BackendScript {
    pub live: bool,
    pub ready: bool,
    pub needs_user_action: bool,
    pub status_users: Option<Vec<UserIdentity>>,
    pub users: Vec<UserIdentity>,
    pub accept_login: bool,
    pub login_delay: Option<Duration>,
}

impl BackendScript {
    pub fn ready_with_users(names: &[&str]) -> Self {
        let users: Vec<UserIdentity> = names.iter().map(|name| UserIdentity::named(*name)).collect();
        Self {
            live: true,
            ready: true,
            status_users: Some(users.clone()),
            users,
            accept_login: true,
            ..Self::default()
        }
    }
}

/// Backend API answering from a mutable script and logging every call.
#[derive(Default)]
pub struct FakeApi {
    pub script: Mutex<BackendScript>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeApi {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|recorded| *recorded == call).count()
    }
}

#[async_trait]
impl BackendApi for FakeApi {
    async fn ping(&self, _timeout: Duration) -> bool {
        self.script.lock().unwrap().live
    }

    async fn initialize_status(&self, _timeout: Duration) -> Result<InitializeStatus, String> {
        let script = self.script.lock().unwrap().clone();
        if !script.live {
            return Err("connection refused".to_string());
        }
        Ok(InitializeStatus {
            ready: script.ready,
            needs_user_action: script.needs_user_action,
            users: script.status_users,
        })
    }

    async fn list_users(&self) -> Vec<UserIdentity> {
        self.record("list_users");
        self.script.lock().unwrap().users.clone()
    }

    async fn set_active_user(&self, user: &UserIdentity) -> bool {
        self.record(format!("set_active_user:{}", user.name));
        let (accept, delay) = {
            let script = self.script.lock().unwrap();
            (script.accept_login, script.login_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        accept
    }

    async fn logout(&self, _timeout: Duration) -> bool {
        self.record("logout");
        true
    }
}

#[derive(Default)]
pub struct BackendStats {
    pub starts: AtomicU32,
    pub stops: AtomicU32,
}

pub struct FakeBackend {
    stats: Arc<BackendStats>,
    listeners: Listeners<BackendExitEvent>,
    running: bool,
}

#[async_trait]
impl BackendProcess for FakeBackend {
    fn kind(&self) -> &'static str {
        "fake"
    }

    async fn start(&mut self, _config: &ShellConfig) -> ShellResult<()> {
        self.stats.starts.fetch_add(1, Ordering::SeqCst);
        self.running = true;
        Ok(())
    }

    async fn stop(&mut self) {
        self.stats.stops.fetch_add(1, Ordering::SeqCst);
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn last_exit(&self) -> Option<BackendExitEvent> {
        None
    }

    fn on_exit(&self, callback: Box<dyn Fn(&BackendExitEvent) + Send + Sync>) -> Subscription {
        self.listeners.subscribe(callback)
    }
}

pub struct TestHarness {
    pub shell: Arc<Shell<FakeHost>>,
    pub host: Arc<FakeHost>,
    pub api: Arc<FakeApi>,
    pub backend: Arc<BackendStats>,
}

impl TestHarness {
    pub fn new(script: BackendScript) -> Self {
        let config = ShellConfig::from_lookup(
            PathBuf::from("/tmp/studio-shell-test/data"),
            PathBuf::from("/tmp/studio-shell-test/resources"),
            |_| None,
        )
        .unwrap();
        let host = Arc::new(FakeHost::default());
        let api = Arc::new(FakeApi {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
        });
        let backend = Arc::new(BackendStats::default());
        let shell = Shell::new(
            config,
            Arc::clone(&host),
            api.clone(),
            Box::new(FakeBackend {
                stats: Arc::clone(&backend),
                listeners: Listeners::default(),
                running: false,
            }),
            shell_texts_for_locale("de-DE"),
        );
        TestHarness {
            shell: Arc::new(shell),
            host,
            api,
            backend,
        }
    }

    /// Content of `role` finished loading.
    pub async fn page_loaded(&self, role: WindowRole) {
        self.shell.on_page_loaded(role).await;
    }

    /// The user closes `role` through the window frame.
    pub async fn user_closes(&self, role: WindowRole) {
        self.host.close(role).unwrap();
        self.shell.on_window_closed(role).await;
    }

    pub fn stops(&self) -> u32 {
        self.backend.stops.load(Ordering::SeqCst)
    }
}

pub fn names(users: &[UserIdentity]) -> Vec<&str> {
    users.iter().map(|user| user.name.as_str()).collect()
}
