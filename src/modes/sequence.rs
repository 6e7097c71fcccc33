//! Ordered-click mode.
//!
//! The player clicks blocks from darkest to lightest. The target order is
//! the round's identifiers sorted ascending, computed once at `start`, so
//! each click is validated against a single expected value. The clicked
//! blocks are always a prefix of that order, so a block's rank in it also
//! tells whether it was already clicked.
//!
//! ## States
//!
//! `Idle -> Active -> Complete`. Input outside `Active` is ignored.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::color::{apply_vision_filter, gradient_color, Rgb, VisionFilter};
use crate::core::{ColorId, GameMode, GameRng, Round, RoundError, RoundToken};
use crate::rules::{RoundResult, RoundRules};

/// Lifecycle of a sequence round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencePhase {
    #[default]
    Idle,
    Active,
    Complete,
}

/// What a click did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Not an active round, unknown block, or already clicked.
    Ignored,
    /// Correct block; now at `position` in the clicked order.
    Accepted { position: usize },
    /// Wrong block. Counted as an error; the presentation layer shakes it.
    Wrong { clicked: ColorId, expected: ColorId },
    /// Correct final block. The round is ready for submission.
    Completed,
}

/// State machine for one sequence round.
#[derive(Clone, Debug)]
pub struct SequenceGame {
    phase: SequencePhase,
    token: RoundToken,
    identifiers: Vec<ColorId>,
    sorted: Vec<ColorId>,
    /// Position of each identifier in `sorted`.
    ranks: FxHashMap<ColorId, usize>,
    clicked: Vec<ColorId>,
    error_count: u32,
    base_hue: f64,
    rng: GameRng,
}

impl SequenceGame {
    /// Create an idle game. `rng` supplies the base hue of each round.
    #[must_use]
    pub fn new(rng: GameRng) -> Self {
        Self {
            phase: SequencePhase::Idle,
            token: RoundToken::default(),
            identifiers: Vec::new(),
            sorted: Vec::new(),
            ranks: FxHashMap::default(),
            clicked: Vec::new(),
            error_count: 0,
            base_hue: 0.0,
            rng,
        }
    }

    /// Start a round issued under `token`.
    pub fn start_round(&mut self, round: &Round, token: RoundToken) -> Result<(), RoundError> {
        if round.is_empty() {
            return Err(RoundError::Empty);
        }

        let mut sorted = round.identifiers.clone();
        sorted.sort_unstable();
        if let Some(pair) = sorted.windows(2).find(|w| w[0] == w[1]) {
            return Err(RoundError::DuplicateIdentifier(pair[0]));
        }

        self.identifiers = round.identifiers.clone();
        self.ranks = sorted.iter().enumerate().map(|(rank, id)| (*id, rank)).collect();
        self.sorted = sorted;
        self.clicked.clear();
        self.error_count = 0;
        self.base_hue = self.rng.gen_hue();
        self.token = token;
        self.phase = SequencePhase::Active;
        Ok(())
    }

    /// Handle a click on `identifier`.
    pub fn click(&mut self, identifier: ColorId) -> ClickOutcome {
        if self.phase != SequencePhase::Active {
            return ClickOutcome::Ignored;
        }
        match self.ranks.get(&identifier) {
            Some(&rank) if rank >= self.clicked.len() => {}
            _ => return ClickOutcome::Ignored,
        }

        let expected = self.sorted[self.clicked.len()];
        if identifier != expected {
            self.error_count += 1;
            return ClickOutcome::Wrong {
                clicked: identifier,
                expected,
            };
        }

        self.clicked.push(identifier);
        if self.clicked.len() == self.sorted.len() {
            self.phase = SequencePhase::Complete;
            ClickOutcome::Completed
        } else {
            ClickOutcome::Accepted {
                position: self.clicked.len() - 1,
            }
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> SequencePhase {
        self.phase
    }

    /// Token of the round being played.
    #[must_use]
    pub fn token(&self) -> RoundToken {
        self.token
    }

    /// Blocks accepted so far, in click order.
    #[must_use]
    pub fn clicked_order(&self) -> &[ColorId] {
        &self.clicked
    }

    /// Wrong clicks this round.
    #[must_use]
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Block the player must click next, if any.
    #[must_use]
    pub fn expected_next(&self) -> Option<ColorId> {
        match self.phase {
            SequencePhase::Active => self.sorted.get(self.clicked.len()).copied(),
            _ => None,
        }
    }

    /// Hue shared by every block this round.
    #[must_use]
    pub fn base_hue(&self) -> f64 {
        self.base_hue
    }

    /// Blocks in display order with their filtered colors.
    #[must_use]
    pub fn block_colors(&self, filter: VisionFilter) -> Vec<(ColorId, Rgb)> {
        self.colors_of(&self.identifiers, filter)
    }

    /// Correct order with filtered colors, for the pre-submit preview.
    #[must_use]
    pub fn solution_colors(&self, filter: VisionFilter) -> Vec<(ColorId, Rgb)> {
        self.colors_of(&self.sorted, filter)
    }

    fn colors_of(&self, ids: &[ColorId], filter: VisionFilter) -> Vec<(ColorId, Rgb)> {
        let count = self.identifiers.len();
        ids.iter()
            .map(|&id| {
                let color = gradient_color(id, count, self.base_hue);
                (id, apply_vision_filter(color, filter))
            })
            .collect()
    }
}

impl RoundRules for SequenceGame {
    fn mode(&self) -> GameMode {
        GameMode::Sequence
    }

    fn start(&mut self, round: &Round) -> Result<(), RoundError> {
        let token = self.token.next();
        self.start_round(round, token)
    }

    fn is_complete(&self) -> bool {
        self.phase == SequencePhase::Complete
    }

    fn result(&self) -> Option<RoundResult> {
        self.is_complete().then(|| RoundResult::Sequence {
            answer: self.sorted.clone(),
            error_count: self.error_count,
        })
    }
}
