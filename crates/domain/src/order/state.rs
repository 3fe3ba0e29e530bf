//! Placement state machine.

use serde::{Deserialize, Serialize};

/// The state of one order placement attempt.
///
/// State transitions:
/// ```text
/// Received ──► Validated ──► Priced ──► Writing ──► Committed
///     │            │           │           │
///     └────────────┴───────────┴───────────┴──► RolledBack
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlacementState {
    /// Submission accepted for processing, nothing checked yet.
    #[default]
    Received,

    /// Required fields are present and well formed.
    Validated,

    /// Every line has an authoritative catalog price.
    Priced,

    /// A store transaction is open.
    Writing,

    /// Header and lines are durable and visible (terminal state).
    Committed,

    /// Nothing was persisted (terminal state).
    RolledBack,
}

impl PlacementState {
    /// Returns true if the attempt may move from this state to `next`.
    pub fn can_transition_to(&self, next: PlacementState) -> bool {
        use PlacementState::*;

        matches!(
            (*self, next),
            (Received, Validated)
                | (Validated, Priced)
                | (Priced, Writing)
                | (Writing, Committed)
                | (Received | Validated | Priced | Writing, RolledBack)
        )
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlacementState::Committed | PlacementState::RolledBack)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementState::Received => "Received",
            PlacementState::Validated => "Validated",
            PlacementState::Priced => "Priced",
            PlacementState::Writing => "Writing",
            PlacementState::Committed => "Committed",
            PlacementState::RolledBack => "RolledBack",
        }
    }
}

impl std::fmt::Display for PlacementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks the state of a single placement attempt.
#[derive(Debug, Default)]
pub struct Placement {
    state: PlacementState,
}

impl Placement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlacementState {
        self.state
    }

    /// Moves to `next`. Illegal transitions are ignored and logged.
    pub fn advance(&mut self, next: PlacementState) {
        if self.state.can_transition_to(next) {
            tracing::debug!(from = %self.state, to = %next, "Placement state changed");
            self.state = next;
        } else {
            tracing::warn!(from = %self.state, to = %next, "Illegal placement transition");
        }
    }
}
