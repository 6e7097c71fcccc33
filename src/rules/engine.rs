//! Mode-agnostic view of an active round.
//!
//! Game modes implement `RoundRules` so the session controller can track
//! completion and collect results without knowing which mode is running.

use serde::{Deserialize, Serialize};

use crate::core::{ColorId, GameMode, Round, RoundError};

/// Result of a completed round, tagged by mode.
///
/// Sequence rounds are scored by the game service from the submitted
/// answer and error count. Memory rounds are scored on the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundResult {
    Sequence {
        /// Blocks in the order they were accepted.
        answer: Vec<ColorId>,
        /// Wrong clicks during the round.
        error_count: u32,
    },
    Memory {
        /// `matched_pairs * points_per_pair`.
        score: u32,
        /// Completed pair comparisons.
        attempts: u32,
    },
}

impl RoundResult {
    /// Mode that produced this result.
    #[must_use]
    pub fn mode(&self) -> GameMode {
        match self {
            RoundResult::Sequence { .. } => GameMode::Sequence,
            RoundResult::Memory { .. } => GameMode::Memory,
        }
    }

    /// Points known on the client. Zero for server-scored modes.
    #[must_use]
    pub fn client_score(&self) -> u32 {
        match self {
            RoundResult::Sequence { .. } => 0,
            RoundResult::Memory { score, .. } => *score,
        }
    }
}

/// Rules for one game mode.
///
/// ## Implementation Notes
///
/// - `start`: Must fully reset progress from any previous round
/// - `result`: Returns `None` until the round is complete
/// - Input handling is mode-specific and not part of this trait
pub trait RoundRules {
    /// Mode implemented by this type.
    fn mode(&self) -> GameMode;

    /// Begin a new round, discarding all previous progress.
    fn start(&mut self, round: &Round) -> Result<(), RoundError>;

    /// True once the round can be submitted.
    fn is_complete(&self) -> bool;

    /// Final result, available only when complete.
    fn result(&self) -> Option<RoundResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_result_mode_tag() {
        let seq = RoundResult::Sequence {
            answer: vec![ColorId(0), ColorId(1)],
            error_count: 3,
        };
        assert_eq!(seq.mode(), GameMode::Sequence);
        assert_eq!(seq.client_score(), 0);

        let mem = RoundResult::Memory { score: 40, attempts: 6 };
        assert_eq!(mem.mode(), GameMode::Memory);
        assert_eq!(mem.client_score(), 40);
    }
}
