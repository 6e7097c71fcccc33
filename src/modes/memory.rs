//! Pair-matching mode.
//!
//! Tiles are laid out face down, one per identifier. Every pairing key
//! appears on exactly two tiles. The player flips two tiles at a time:
//! equal keys stay matched for good, unequal ones stay visible for a short
//! reveal delay and then flip back.
//!
//! ## States
//!
//! `Idle -> Active <-> Evaluating -> Complete`
//!
//! `Evaluating` holds while a mismatched pair is still face up. All flips
//! are ignored until the pending revert is applied.
//!
//! ## Reverts
//!
//! A mismatch returns a `PendingRevert` carrying the round token. The
//! caller schedules it and hands it back via `apply_revert`; reverts from
//! an earlier round, or for tiles that are no longer pending, are dropped.

use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::color::{apply_vision_filter, MemoryPalette, Rgb, VisionFilter};
use crate::core::{ColorId, GameMode, GameRng, Round, RoundError, RoundToken, TileId};
use crate::rules::{RoundResult, RoundRules};

/// Points per matched pair when not configured otherwise.
pub const DEFAULT_POINTS_PER_PAIR: u32 = 10;
/// Mismatch reveal delay when not configured otherwise.
pub const DEFAULT_REVEAL_DELAY: Duration = Duration::from_millis(1000);

/// One tile on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub color_key: ColorId,
    pub is_flipped: bool,
    pub is_matched: bool,
}

/// Lifecycle of a memory round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryPhase {
    #[default]
    Idle,
    Active,
    Evaluating,
    Complete,
}

/// A mismatched pair waiting to flip back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingRevert {
    pub round: RoundToken,
    pub tiles: [TileId; 2],
    pub delay: Duration,
}

/// What a flip did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipOutcome {
    /// Not flippable right now.
    Ignored,
    /// First tile of a pair turned face up.
    Revealed(TileId),
    /// Second tile matched the first; both stay up.
    Matched { first: TileId, second: TileId },
    /// Second tile differs; schedule the revert.
    Mismatched(PendingRevert),
    /// Final pair matched. The round is ready for submission.
    Completed,
}

/// State machine for one memory round.
#[derive(Clone, Debug)]
pub struct MemoryGame {
    phase: MemoryPhase,
    token: RoundToken,
    tiles: Vec<Tile>,
    flipped: SmallVec<[TileId; 2]>,
    attempts: u32,
    matched_pairs: u32,
    palette: MemoryPalette,
    rng: GameRng,
    points_per_pair: u32,
    reveal_delay: Duration,
}

impl MemoryGame {
    /// Create an idle game. `rng` supplies pair colors.
    #[must_use]
    pub fn new(rng: GameRng) -> Self {
        Self {
            phase: MemoryPhase::Idle,
            token: RoundToken::default(),
            tiles: Vec::new(),
            flipped: SmallVec::new(),
            attempts: 0,
            matched_pairs: 0,
            palette: MemoryPalette::new(),
            rng,
            points_per_pair: DEFAULT_POINTS_PER_PAIR,
            reveal_delay: DEFAULT_REVEAL_DELAY,
        }
    }

    /// Set points per matched pair.
    #[must_use]
    pub fn with_points_per_pair(mut self, points: u32) -> Self {
        self.points_per_pair = points;
        self
    }

    /// Set the mismatch reveal delay.
    #[must_use]
    pub fn with_reveal_delay(mut self, delay: Duration) -> Self {
        self.reveal_delay = delay;
        self
    }

    /// Start a round issued under `token`.
    pub fn start_round(&mut self, round: &Round, token: RoundToken) -> Result<(), RoundError> {
        if round.is_empty() {
            return Err(RoundError::Empty);
        }

        let mut counts: FxHashMap<ColorId, usize> = FxHashMap::default();
        for &id in &round.identifiers {
            *counts.entry(id).or_insert(0) += 1;
        }
        // First offender in display order, for a stable error.
        if let Some(&id) = round.identifiers.iter().find(|id| counts[*id] != 2) {
            return Err(RoundError::UnpairedIdentifier { id, count: counts[&id] });
        }

        self.tiles = round
            .identifiers
            .iter()
            .enumerate()
            .map(|(index, &color_key)| Tile {
                id: TileId(index as u32),
                color_key,
                is_flipped: false,
                is_matched: false,
            })
            .collect();
        self.palette = MemoryPalette::for_keys(&round.identifiers, &mut self.rng);
        self.flipped.clear();
        self.attempts = 0;
        self.matched_pairs = 0;
        self.token = token;
        self.phase = MemoryPhase::Active;
        Ok(())
    }

    /// Flip the tile at `tile_id`.
    pub fn flip(&mut self, tile_id: TileId) -> FlipOutcome {
        if self.phase != MemoryPhase::Active || self.flipped.len() >= 2 {
            return FlipOutcome::Ignored;
        }
        let Some(tile) = self.tiles.get_mut(tile_id.index()) else {
            return FlipOutcome::Ignored;
        };
        if tile.is_flipped || tile.is_matched {
            return FlipOutcome::Ignored;
        }

        tile.is_flipped = true;
        self.flipped.push(tile_id);

        let [first, second] = match self.flipped.as_slice() {
            [only] => return FlipOutcome::Revealed(*only),
            [first, second] => [*first, *second],
            _ => return FlipOutcome::Ignored,
        };

        self.attempts += 1;
        if self.tiles[first.index()].color_key == self.tiles[second.index()].color_key {
            self.tiles[first.index()].is_matched = true;
            self.tiles[second.index()].is_matched = true;
            self.matched_pairs += 1;
            self.flipped.clear();

            if self.matched_pairs as usize == self.tiles.len() / 2 {
                self.phase = MemoryPhase::Complete;
                return FlipOutcome::Completed;
            }
            FlipOutcome::Matched { first, second }
        } else {
            self.phase = MemoryPhase::Evaluating;
            FlipOutcome::Mismatched(PendingRevert {
                round: self.token,
                tiles: [first, second],
                delay: self.reveal_delay,
            })
        }
    }

    /// Flip a mismatched pair back face down.
    ///
    /// Returns `false`, changing nothing, when the revert belongs to another
    /// round or the tiles are no longer the pending pair.
    pub fn apply_revert(&mut self, revert: &PendingRevert) -> bool {
        if revert.round != self.token
            || self.phase != MemoryPhase::Evaluating
            || self.flipped.as_slice() != revert.tiles.as_slice()
        {
            return false;
        }

        for id in revert.tiles {
            if let Some(tile) = self.tiles.get_mut(id.index()) {
                if !tile.is_matched {
                    tile.is_flipped = false;
                }
            }
        }
        self.flipped.clear();
        self.phase = MemoryPhase::Active;
        true
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> MemoryPhase {
        self.phase
    }

    /// Token of the round being played.
    #[must_use]
    pub fn token(&self) -> RoundToken {
        self.token
    }

    /// All tiles in board order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tiles currently face up and unresolved.
    #[must_use]
    pub fn flipped_tiles(&self) -> &[TileId] {
        &self.flipped
    }

    /// Completed pair comparisons.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Pairs found so far.
    #[must_use]
    pub fn matched_pairs(&self) -> u32 {
        self.matched_pairs
    }

    /// Points earned so far.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.matched_pairs * self.points_per_pair
    }

    /// Filtered color of a face-up tile; `None` while face down.
    #[must_use]
    pub fn tile_face(&self, tile_id: TileId, filter: VisionFilter) -> Option<Rgb> {
        let tile = self.tiles.get(tile_id.index())?;
        if !(tile.is_flipped || tile.is_matched) {
            return None;
        }
        self.palette
            .get(tile.color_key)
            .map(|color| apply_vision_filter(color, filter))
    }
}

impl RoundRules for MemoryGame {
    fn mode(&self) -> GameMode {
        GameMode::Memory
    }

    fn start(&mut self, round: &Round) -> Result<(), RoundError> {
        let token = self.token.next();
        self.start_round(round, token)
    }

    fn is_complete(&self) -> bool {
        self.phase == MemoryPhase::Complete
    }

    fn result(&self) -> Option<RoundResult> {
        self.is_complete().then(|| RoundResult::Memory {
            score: self.score(),
            attempts: self.attempts,
        })
    }
}
