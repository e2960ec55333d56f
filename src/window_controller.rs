//! Window lifecycle for the five shell roles.
//!
//! The controller holds at most one slot per [`WindowRole`]. Opening a role
//! that already has a slot focuses it instead of creating a second window.
//! Events addressed to a window are held back until that window reports its
//! content as loaded.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    error::{ShellError, ShellResult},
    logging::LogCategory,
    message_channel::ShellEvent,
    window_host::{ContentTarget, WindowHost, WindowSpec},
    WindowRole, ROBUST_HIDE_MAX_WAIT, ROBUST_HIDE_POLL_INTERVAL,
};

#[derive(Debug, Default)]
struct WindowSlot {
    content_requested: bool,
    loaded: bool,
    reveal_on_load: bool,
    pending: Vec<ShellEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Continue,
    QuitApplication,
}

pub struct WindowController<H: WindowHost> {
    host: Arc<H>,
    dev_server_url: Option<Url>,
    slots: BTreeMap<WindowRole, WindowSlot>,
    closed_by_app: BTreeSet<WindowRole>,
}

impl<H: WindowHost> WindowController<H> {
    pub fn new(host: Arc<H>, dev_server_url: Option<Url>) -> Self {
        Self {
            host,
            dev_server_url,
            slots: BTreeMap::new(),
            closed_by_app: BTreeSet::new(),
        }
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub fn is_open(&self, role: WindowRole) -> bool {
        self.slots.contains_key(&role)
    }

    pub fn open_roles(&self) -> Vec<WindowRole> {
        self.slots.keys().copied().collect()
    }

    pub fn is_loaded(&self, role: WindowRole) -> bool {
        self.slots.get(&role).is_some_and(|slot| slot.loaded)
    }

    pub fn is_visible(&self, role: WindowRole) -> bool {
        self.is_open(role) && self.host.is_visible(role)
    }

    /// Window a second application launch should bring to front.
    pub fn frontmost_candidate(&self) -> Option<WindowRole> {
        [
            WindowRole::Preferences,
            WindowRole::Main,
            WindowRole::SetupWizard,
            WindowRole::Picker,
            WindowRole::Splash,
        ]
        .into_iter()
        .find(|role| self.is_visible(*role))
    }

    fn spec_for(&self, role: WindowRole) -> WindowSpec {
        WindowSpec::for_role(role, self.dev_server_url.as_ref())
    }

    fn create(&mut self, spec: WindowSpec) -> ShellResult<()> {
        let role = spec.role;
        self.host
            .create(&spec)
            .map_err(|reason| ShellError::WindowCreation { role, reason })?;
        self.slots.insert(
            role,
            WindowSlot {
                content_requested: spec.content != ContentTarget::Blank,
                reveal_on_load: spec.reveal_on_load,
                ..WindowSlot::default()
            },
        );
        debug!(category = %LogCategory::Runtime, role = %role, "window created");
        Ok(())
    }

    /// Creates the window for `role`, or shows and focuses the existing one.
    /// Returns whether a new window was created.
    pub fn create_or_focus(&mut self, role: WindowRole) -> ShellResult<bool> {
        if self.is_open(role) {
            self.reveal(role)?;
            return Ok(false);
        }
        self.create(self.spec_for(role))?;
        Ok(true)
    }

    /// Creates `role` without showing it when it does not exist yet.
    pub fn ensure_hidden(&mut self, role: WindowRole) -> ShellResult<()> {
        if self.is_open(role) {
            return Ok(());
        }
        let spec = WindowSpec {
            visible: false,
            reveal_on_load: false,
            ..self.spec_for(role)
        };
        self.create(spec)
    }

    pub fn reveal(&mut self, role: WindowRole) -> ShellResult<()> {
        if !self.is_open(role) {
            return Err(window_error(role, "window is not open"));
        }
        self.host.show(role).map_err(|reason| window_error(role, reason))?;
        if let Err(reason) = self.host.focus(role) {
            debug!(role = %role, error = %reason, "focus request ignored");
        }
        Ok(())
    }

    /// Navigates the window to its role content. Load-complete reports for
    /// earlier content are ignored until this is requested.
    pub fn load_content(&mut self, role: WindowRole) -> ShellResult<()> {
        let target = ContentTarget::for_role(role, self.dev_server_url.as_ref());
        let slot = self
            .slots
            .get_mut(&role)
            .ok_or_else(|| window_error(role, "window is not open"))?;
        slot.content_requested = true;
        slot.loaded = false;
        self.host
            .navigate(role, &target)
            .map_err(|reason| window_error(role, reason))
    }

    pub fn load_content_if_blank(&mut self, role: WindowRole) -> ShellResult<()> {
        match self.slots.get(&role) {
            Some(slot) if slot.content_requested => Ok(()),
            _ => self.load_content(role),
        }
    }

    pub fn reload(&mut self, role: WindowRole) -> ShellResult<()> {
        let slot = self
            .slots
            .get_mut(&role)
            .ok_or_else(|| window_error(role, "window is not open"))?;
        slot.loaded = false;
        self.host
            .reload(role)
            .map_err(|reason| window_error(role, reason))
    }

    /// Records a load-complete report from the host, reveals windows that
    /// wait for their content and flushes held-back events.
    pub fn mark_loaded(&mut self, role: WindowRole) -> ShellResult<usize> {
        let Some(slot) = self.slots.get_mut(&role) else {
            return Ok(0);
        };
        if !slot.content_requested {
            return Ok(0);
        }
        slot.loaded = true;
        let pending = std::mem::take(&mut slot.pending);
        let reveal = std::mem::replace(&mut slot.reveal_on_load, false);

        if reveal {
            self.reveal(role)?;
        }
        let delivered = pending.len();
        for event in pending {
            self.host
                .emit(role, &event)
                .map_err(|reason| window_error(role, reason))?;
        }
        if delivered > 0 {
            debug!(category = %LogCategory::Runtime, role = %role, delivered, "flushed held events");
        }
        Ok(delivered)
    }

    /// Sends `event` to its target window now if loaded, otherwise once it
    /// reports load completion.
    pub fn deliver_after_load(&mut self, event: ShellEvent) -> ShellResult<()> {
        let role = event.target();
        let slot = self
            .slots
            .get_mut(&role)
            .ok_or_else(|| window_error(role, "window is not open"))?;
        if !slot.loaded {
            slot.pending.retain(|held| held.channel() != event.channel());
            slot.pending.push(event);
            return Ok(());
        }
        self.host
            .emit(role, &event)
            .map_err(|reason| window_error(role, reason))
    }

    /// Programmatic close. The host's later close report for this window is
    /// not treated as a user decision.
    pub fn close(&mut self, role: WindowRole) -> bool {
        if self.slots.remove(&role).is_none() {
            return false;
        }
        self.closed_by_app.insert(role);
        if let Err(reason) = self.host.close(role) {
            warn!(category = %LogCategory::Runtime, role = %role, error = %reason, "failed to close window");
        }
        info!(category = %LogCategory::Runtime, role = %role, "window closed by shell");
        true
    }

    pub fn hide_all(&mut self) {
        for role in self.open_roles() {
            if let Err(reason) = self.host.hide(role) {
                warn!(category = %LogCategory::Runtime, role = %role, error = %reason, "failed to hide window");
            }
        }
    }

    pub fn close_all(&mut self) {
        for role in self.open_roles() {
            self.close(role);
        }
    }

    /// Handles the host reporting that a window is gone.
    pub fn handle_closed(&mut self, role: WindowRole) -> CloseOutcome {
        if self.closed_by_app.remove(&role) {
            return if self.slots.is_empty() {
                CloseOutcome::QuitApplication
            } else {
                CloseOutcome::Continue
            };
        }

        if self.slots.remove(&role).is_none() {
            return CloseOutcome::Continue;
        }
        info!(category = %LogCategory::Runtime, role = %role, "window closed by user");

        if role == WindowRole::SetupWizard {
            info!(category = %LogCategory::Runtime, "setup declined");
            return CloseOutcome::QuitApplication;
        }
        let any_visible = self.slots.keys().any(|open| self.host.is_visible(*open));
        if any_visible {
            CloseOutcome::Continue
        } else {
            CloseOutcome::QuitApplication
        }
    }

    /// First half of a robust hide: clears the flags some window managers
    /// refuse to hide (fullscreen, pinned, maximized), then hides. Returns
    /// false when `role` is not open.
    pub fn begin_hide(&mut self, role: WindowRole) -> bool {
        if !self.is_open(role) {
            return false;
        }
        if let Err(reason) = self.host.release_presentation_flags(role) {
            debug!(role = %role, error = %reason, "could not release presentation flags");
        }
        if let Err(reason) = self.host.hide(role) {
            warn!(role = %role, error = %reason, "hide request failed");
        }
        true
    }

    /// Fallback when [`wait_until_hidden`] gave up.
    pub fn minimize_if_visible(&mut self, role: WindowRole) {
        if !self.is_visible(role) {
            return;
        }
        warn!(role = %role, "window still visible after hide, minimizing");
        if let Err(reason) = self.host.minimize(role) {
            warn!(role = %role, error = %reason, "minimize fallback failed");
        }
    }

    /// Preferences overlay: focuses the existing instance, otherwise opens
    /// modal over a visible picker, or parented to a visible main window.
    pub fn open_preferences(&mut self) -> ShellResult<()> {
        if self.is_open(WindowRole::Preferences) {
            return self.reveal(WindowRole::Preferences);
        }
        let picker_visible = self.is_visible(WindowRole::Picker);
        let parent = if picker_visible {
            Some(WindowRole::Picker)
        } else if self.is_visible(WindowRole::Main) {
            Some(WindowRole::Main)
        } else {
            None
        };
        let spec = WindowSpec {
            parent,
            modal: picker_visible,
            ..self.spec_for(WindowRole::Preferences)
        };
        self.create(spec)
    }
}

/// Polls the host until `role` is no longer visible. Returns false when it
/// is still visible after [`ROBUST_HIDE_MAX_WAIT`].
pub async fn wait_until_hidden<H: WindowHost + ?Sized>(host: &H, role: WindowRole) -> bool {
    let started = Instant::now();
    loop {
        if !host.is_visible(role) {
            return true;
        }
        if started.elapsed() >= ROBUST_HIDE_MAX_WAIT {
            return false;
        }
        sleep(ROBUST_HIDE_POLL_INTERVAL).await;
    }
}

fn window_error(role: WindowRole, reason: impl Into<String>) -> ShellError {
    ShellError::Window {
        role,
        reason: reason.into(),
    }
}
