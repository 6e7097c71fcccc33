//! Inputs delivered to a running session.

use crate::core::{ColorId, TileId};
use crate::modes::{ClickOutcome, FlipOutcome, PendingRevert};

/// Player input or timer expiry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Sequence block clicked.
    Click(ColorId),
    /// Memory tile clicked.
    Flip(TileId),
    /// A mismatch reveal delay ran out.
    RevealElapsed(PendingRevert),
}

/// What an event did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    Click(ClickOutcome),
    Flip(FlipOutcome),
    /// `true` when the revert was applied, `false` when it was stale.
    Reverted(bool),
}

impl EventOutcome {
    /// True when the event finished the round.
    #[must_use]
    pub fn completed_round(&self) -> bool {
        matches!(
            self,
            EventOutcome::Click(ClickOutcome::Completed) | EventOutcome::Flip(FlipOutcome::Completed)
        )
    }

    /// Revert to schedule, if the event produced a mismatch.
    #[must_use]
    pub fn pending_revert(&self) -> Option<PendingRevert> {
        match self {
            EventOutcome::Flip(FlipOutcome::Mismatched(revert)) => Some(*revert),
            _ => None,
        }
    }
}
