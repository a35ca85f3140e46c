//! Invalid resolution state transitions.

use thiserror::Error;

/// A transition was requested from a state that does not allow it.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("cannot {action} while {state}")]
pub struct TransitionError {
    /// Requested transition.
    pub action: &'static str,
    /// Name of the current state.
    pub state: &'static str,
}

impl TransitionError {
    /// Creates a transition error.
    #[must_use]
    pub const fn new(action: &'static str, state: &'static str) -> Self {
        Self { action, state }
    }
}
