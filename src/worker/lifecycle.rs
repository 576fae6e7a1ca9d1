//! Lifecycle State Machine
//!
//! Explicit states of the cache manager and a pure transition table. The
//! manager applies the returned effects; nothing here touches storage.

use std::fmt;

use crate::error::{CacheError, Result};

// == Worker State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Constructed, install not started
    Parsed,
    /// Precaching the static manifest
    Installing,
    /// Installed, waiting for activation
    Installed,
    /// Serving requests
    Active,
    /// Failed install or superseded by a newer version
    Redundant,
}

impl WorkerState {
    pub fn is_active(&self) -> bool {
        matches!(self, WorkerState::Active)
    }

    pub fn name(&self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Active => "active",
            WorkerState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// == Lifecycle Event ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Install,
    InstallSucceeded,
    InstallFailed,
    Activate,
    Superseded,
}

// == Effect ==
/// Work the manager performs after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Fill the static store from the precache manifest
    Precache,
    /// Write the sweep sentinel if the runtime store has none
    StampSentinel,
    /// Drop every store that is not a current one
    DeleteStaleCaches,
    /// Take over already-connected clients
    ClaimClients,
    /// Run the gated eviction pass
    EvictExpired,
}

/// Next state plus the effects to run, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: WorkerState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: WorkerState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with(state: WorkerState, effects: &[Effect]) -> Self {
        Self {
            state,
            effects: effects.to_vec(),
        }
    }
}

/// Applies `event` to `state`.
pub fn transition(state: WorkerState, event: LifecycleEvent) -> Result<Transition> {
    use LifecycleEvent as E;
    use WorkerState as S;

    let next = match (state, event) {
        (S::Parsed, E::Install) => {
            Transition::with(S::Installing, &[Effect::Precache, Effect::StampSentinel])
        }
        (S::Installing, E::InstallSucceeded) => Transition::to(S::Installed),
        (S::Installing, E::InstallFailed) => Transition::to(S::Redundant),
        (S::Installed, E::Activate) => Transition::with(
            S::Active,
            &[
                Effect::DeleteStaleCaches,
                Effect::ClaimClients,
                Effect::EvictExpired,
            ],
        ),
        (S::Installed | S::Active, E::Superseded) => Transition::to(S::Redundant),
        (state, event) => {
            return Err(CacheError::InvalidTransition(format!(
                "{:?} in state {}",
                event, state
            )))
        }
    };

    Ok(next)
}
