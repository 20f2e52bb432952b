//! Move state machine.

use serde::{Deserialize, Serialize};

/// The state of a move in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──► Withdrawn ──┬──► Placed ──► Recorded
///                         └──► Compensated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MoveState {
    /// Nothing has been written yet.
    #[default]
    Pending,

    /// The inbound batch has been decremented.
    Withdrawn,

    /// The quantity has been added at the destination.
    Placed,

    /// The move is on the audit trail (terminal state).
    Recorded,

    /// Placement failed and the withdrawal was credited back (terminal state).
    Compensated,
}

impl MoveState {
    /// Returns true if the inbound withdrawal can run.
    pub fn can_withdraw(&self) -> bool {
        matches!(self, MoveState::Pending)
    }

    /// Returns true if the placement step can run.
    pub fn can_place(&self) -> bool {
        matches!(self, MoveState::Withdrawn)
    }

    /// Returns true if the move can be appended to the audit trail.
    pub fn can_record(&self) -> bool {
        matches!(self, MoveState::Placed)
    }

    /// Returns true if the withdrawal can be credited back.
    pub fn can_compensate(&self) -> bool {
        matches!(self, MoveState::Withdrawn)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MoveState::Recorded | MoveState::Compensated)
    }

    /// Returns true if stock has left the inbound ledger for good.
    pub fn is_committed(&self) -> bool {
        matches!(self, MoveState::Placed | MoveState::Recorded)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            MoveState::Pending => "Pending",
            MoveState::Withdrawn => "Withdrawn",
            MoveState::Placed => "Placed",
            MoveState::Recorded => "Recorded",
            MoveState::Compensated => "Compensated",
        }
    }
}

impl std::fmt::Display for MoveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
