//! Rounds, game modes and difficulty.

use serde::{Deserialize, Serialize};

use super::ids::ColorId;

/// Game mode, selected once at session start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    /// Click blocks in ascending gradient order.
    #[default]
    #[serde(rename = "color_sequence")]
    Sequence,
    /// Find matching pairs among hidden tiles.
    #[serde(rename = "memory_match")]
    Memory,
}

impl GameMode {
    /// Wire name used by the game service.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            GameMode::Sequence => "color_sequence",
            GameMode::Memory => "memory_match",
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "color_sequence" | "sequence" => Ok(GameMode::Sequence),
            "memory_match" | "memory" => Ok(GameMode::Memory),
            other => Err(format!("unknown game mode: {other}")),
        }
    }
}

/// Number of blocks (or tiles) per round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Difficulty(pub u32);

impl Difficulty {
    /// Block counts offered on the start screen.
    pub const PRESETS: [Difficulty; 5] = [
        Difficulty(6),
        Difficulty(9),
        Difficulty(12),
        Difficulty(16),
        Difficulty(25),
    ];

    /// Block count.
    #[must_use]
    pub const fn block_count(self) -> u32 {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty(6)
    }
}

/// One question within a session. Replaced wholesale by the next round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// 1-based position within the session.
    pub round_number: u32,

    /// Rounds in the session.
    pub total_rounds: u32,

    /// Identifiers in display order.
    ///
    /// Sequence mode: each value at most once.
    /// Memory mode: each value exactly twice.
    pub identifiers: Vec<ColorId>,
}

impl Round {
    /// Create a new round.
    #[must_use]
    pub fn new(round_number: u32, total_rounds: u32, identifiers: Vec<ColorId>) -> Self {
        Self {
            round_number,
            total_rounds,
            identifiers,
        }
    }

    /// Number of blocks or tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    /// True when the round has no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// True for the final round of the session.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.round_number >= self.total_rounds
    }
}

/// Grid column count used to lay out a round.
///
/// Sequence mode uses a near-square grid; memory mode uses 3, 4 or 5
/// columns depending on tile count.
#[must_use]
pub fn grid_columns(mode: GameMode, count: usize) -> usize {
    match mode {
        GameMode::Sequence => {
            if count == 0 {
                1
            } else {
                (count as f64).sqrt().ceil() as usize
            }
        }
        GameMode::Memory => match count {
            0..=12 => 3,
            13..=16 => 4,
            _ => 5,
        },
    }
}
