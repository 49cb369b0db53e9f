//! Confirm-then-mutate state machine.
//!
//! ```text
//! Idle ──stage──▶ Staged ──confirm──▶ Confirmed ──begin──▶ InFlight
//!  ▲  ◀──cancel──┘                                            │
//!  │                                                       settle
//!  ├──────────────── error ◀──────────────────────────────────┤
//!  └── stage ── Settled(Success) ◀──────────── success ───────┘
//! ```
//!
//! A mutation only runs after an explicit `confirm`. While one is confirmed
//! or in flight, new `stage`/`confirm` calls fail with [`FlowError::Busy`].

use std::sync::Mutex;

use schoolerp_flux::StateStore;

use crate::validate::ValidationError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FlowError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("nothing is staged")]
    NothingStaged,

    #[error("another action is still running")]
    Busy,

    #[error("action has not been confirmed")]
    NotConfirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Staged,
    Confirmed,
    InFlight,
    Settled(Outcome),
}

/// A mutation that can be staged and shown to the user before it runs.
pub trait StagedAction: Clone + Send + Sync + 'static {
    /// One line for the confirmation prompt.
    fn summary(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct ConfirmFlow<A> {
    phase: Phase,
    staged: Option<A>,
    last_outcome: Option<Outcome>,
}

impl<A> Default for ConfirmFlow<A> {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            staged: None,
            last_outcome: None,
        }
    }
}

impl<A: Clone> ConfirmFlow<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn staged(&self) -> Option<&A> {
        self.staged.as_ref()
    }

    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Confirmed | Phase::InFlight)
    }

    /// Stage `action`, replacing anything staged before.
    pub fn stage(&mut self, action: A) -> Result<(), FlowError> {
        if self.is_busy() {
            return Err(FlowError::Busy);
        }
        self.staged = Some(action);
        self.phase = Phase::Staged;
        Ok(())
    }

    /// Discard the staged action. No-op when idle; refused while busy.
    pub fn cancel(&mut self) -> Result<Option<A>, FlowError> {
        if self.is_busy() {
            return Err(FlowError::Busy);
        }
        let dropped = self.staged.take();
        if self.phase == Phase::Staged {
            self.phase = Phase::Idle;
        }
        Ok(dropped)
    }

    /// Staged → Confirmed. Returns the action to execute.
    pub fn confirm(&mut self) -> Result<A, FlowError> {
        match self.phase {
            Phase::Staged => {}
            Phase::Confirmed | Phase::InFlight => return Err(FlowError::Busy),
            _ => return Err(FlowError::NothingStaged),
        }
        let action = self.staged.clone().ok_or(FlowError::NothingStaged)?;
        self.phase = Phase::Confirmed;
        Ok(action)
    }

    /// Confirmed → InFlight.
    pub fn begin(&mut self) -> Result<(), FlowError> {
        if self.phase != Phase::Confirmed {
            return Err(FlowError::NotConfirmed);
        }
        self.phase = Phase::InFlight;
        Ok(())
    }

    /// InFlight → Settled(Success), or back to Idle on error.
    pub fn settle(&mut self, outcome: Outcome) {
        self.staged = None;
        self.last_outcome = Some(outcome);
        self.phase = match outcome {
            Outcome::Success => Phase::Settled(Outcome::Success),
            Outcome::Error => Phase::Idle,
        };
    }
}

/// Snapshot published for the shell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfirmState {
    pub phase: Phase,
    /// Prompt text for the staged action.
    pub summary: Option<String>,
    pub busy: bool,
    pub last_outcome: Option<Outcome>,
}

impl<A: StagedAction> From<&ConfirmFlow<A>> for ConfirmState {
    fn from(flow: &ConfirmFlow<A>) -> Self {
        Self {
            phase: flow.phase,
            summary: flow.staged.as_ref().map(StagedAction::summary),
            busy: flow.is_busy(),
            last_outcome: flow.last_outcome,
        }
    }
}

/// A `ConfirmFlow` owned by a screen, mirrored into the store at `path`.
///
/// Transitions happen under the lock so two concurrent confirms cannot both
/// start the mutation.
pub struct FlowCell<A> {
    path: String,
    flow: Mutex<ConfirmFlow<A>>,
}

impl<A: StagedAction> FlowCell<A> {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            flow: Mutex::new(ConfirmFlow::new()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn snapshot(&self) -> ConfirmState {
        ConfirmState::from(&*self.flow.lock().unwrap())
    }

    pub fn staged(&self) -> Option<A> {
        self.flow.lock().unwrap().staged().cloned()
    }

    pub fn publish(&self, store: &StateStore) {
        store.set(&self.path, self.snapshot());
    }

    pub fn stage(&self, store: &StateStore, action: A) -> Result<(), FlowError> {
        self.transition(store, |f| f.stage(action))
    }

    pub fn cancel(&self, store: &StateStore) -> Result<Option<A>, FlowError> {
        self.transition(store, |f| f.cancel())
    }

    /// Drop a staged action that a later rejected submit made stale.
    /// Leaves busy and idle flows untouched.
    pub fn discard(&self, store: &StateStore) -> Option<A> {
        let mut flow = self.flow.lock().unwrap();
        if flow.phase() != Phase::Staged {
            return None;
        }
        let dropped = flow.cancel().ok().flatten();
        drop(flow);
        self.publish(store);
        dropped
    }

    /// Confirm and begin in one step; the caller runs the returned action
    /// and then calls [`settle`](Self::settle).
    pub fn start(&self, store: &StateStore) -> Result<A, FlowError> {
        self.transition(store, |f| {
            let action = f.confirm()?;
            f.begin()?;
            Ok(action)
        })
    }

    pub fn settle(&self, store: &StateStore, outcome: Outcome) {
        self.flow.lock().unwrap().settle(outcome);
        self.publish(store);
    }

    fn transition<R>(
        &self,
        store: &StateStore,
        f: impl FnOnce(&mut ConfirmFlow<A>) -> Result<R, FlowError>,
    ) -> Result<R, FlowError> {
        let result = f(&mut self.flow.lock().unwrap());
        if result.is_ok() {
            self.publish(store);
        }
        result
    }
}
