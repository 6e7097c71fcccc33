//! Game modes.
//!
//! - `SequenceGame`: click blocks in ascending gradient order.
//! - `MemoryGame`: find matching pairs among face-down tiles.
//!
//! Both implement `RoundRules`. `ActiveRound` holds whichever one the
//! session was started with.

mod sequence;
mod memory;

pub use sequence::{ClickOutcome, SequenceGame, SequencePhase};
pub use memory::{
    FlipOutcome, MemoryGame, MemoryPhase, PendingRevert, Tile, DEFAULT_POINTS_PER_PAIR,
    DEFAULT_REVEAL_DELAY,
};

use crate::core::{GameMode, Round, RoundError, RoundToken};
use crate::rules::{RoundResult, RoundRules};

/// The mode-specific state machine of the current round.
#[derive(Clone, Debug)]
pub enum ActiveRound {
    Sequence(SequenceGame),
    Memory(MemoryGame),
}

impl ActiveRound {
    /// Start `round` on this state machine under `token`.
    pub fn start_round(&mut self, round: &Round, token: RoundToken) -> Result<(), RoundError> {
        match self {
            ActiveRound::Sequence(game) => game.start_round(round, token),
            ActiveRound::Memory(game) => game.start_round(round, token),
        }
    }

    /// Token of the round in play.
    #[must_use]
    pub fn token(&self) -> RoundToken {
        match self {
            ActiveRound::Sequence(game) => game.token(),
            ActiveRound::Memory(game) => game.token(),
        }
    }

    /// Sequence state machine, if that is the active mode.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&SequenceGame> {
        match self {
            ActiveRound::Sequence(game) => Some(game),
            ActiveRound::Memory(_) => None,
        }
    }

    /// Memory state machine, if that is the active mode.
    #[must_use]
    pub fn as_memory(&self) -> Option<&MemoryGame> {
        match self {
            ActiveRound::Memory(game) => Some(game),
            ActiveRound::Sequence(_) => None,
        }
    }

    fn rules(&self) -> &dyn RoundRules {
        match self {
            ActiveRound::Sequence(game) => game,
            ActiveRound::Memory(game) => game,
        }
    }

    fn rules_mut(&mut self) -> &mut dyn RoundRules {
        match self {
            ActiveRound::Sequence(game) => game,
            ActiveRound::Memory(game) => game,
        }
    }
}

impl RoundRules for ActiveRound {
    fn mode(&self) -> GameMode {
        self.rules().mode()
    }

    fn start(&mut self, round: &Round) -> Result<(), RoundError> {
        self.rules_mut().start(round)
    }

    fn is_complete(&self) -> bool {
        self.rules().is_complete()
    }

    fn result(&self) -> Option<RoundResult> {
        self.rules().result()
    }
}
