#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitPhase {
    #[default]
    Running,
    QuitRequested,
    CleanupInProgress,
    CleanupDone,
}

/// Tracks application shutdown so backend teardown runs exactly once no
/// matter how many exit paths fire (menu quit, picker quit, last window
/// closed, runtime exit event).
#[derive(Debug, Default)]
pub struct ExitStateMachine {
    phase: ExitPhase,
}

impl ExitStateMachine {
    pub fn phase(&self) -> ExitPhase {
        self.phase
    }

    pub fn is_quitting(&self) -> bool {
        self.phase != ExitPhase::Running
    }

    /// Returns true for the first quit request only.
    pub fn request_quit(&mut self) -> bool {
        if self.phase != ExitPhase::Running {
            return false;
        }
        self.phase = ExitPhase::QuitRequested;
        true
    }

    pub fn try_begin_cleanup(&mut self) -> bool {
        match self.phase {
            ExitPhase::Running | ExitPhase::QuitRequested => {
                self.phase = ExitPhase::CleanupInProgress;
                true
            }
            ExitPhase::CleanupInProgress | ExitPhase::CleanupDone => false,
        }
    }

    pub fn finish_cleanup(&mut self) {
        self.phase = ExitPhase::CleanupDone;
    }

    /// Whether the runtime may exit on its own, e.g. after the last window
    /// is destroyed. Before cleanup has finished only exits requested with
    /// an explicit code go through.
    pub fn allows_runtime_exit(&self, code: Option<i32>) -> bool {
        code.is_some() || self.phase == ExitPhase::CleanupDone
    }
}
