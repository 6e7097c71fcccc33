//! # color-sort
//!
//! Session engine for a color discrimination game.
//!
//! ## Game Modes
//!
//! 1. **Sequence**: Blocks share one hue and differ in lightness. The player
//!    clicks them from darkest to lightest; wrong clicks count as errors and
//!    the game service scores the finished order.
//!
//! 2. **Memory**: Face-down tiles hide pairs of random colors. The player
//!    flips two at a time; matches stay up, mismatches flip back after a
//!    short delay. Points are tallied on the client.
//!
//! ## Architecture
//!
//! - **Pure State Machines**: Game modes never sleep or do I/O. Timed
//!   behavior is returned as data (`PendingRevert`) for the caller to
//!   schedule.
//!
//! - **Service Trait**: The controller talks to a `GameService`, either the
//!   HTTP backend or the in-process `LocalGameService`.
//!
//! - **Persistent Data Structures**: Round history lives in an `im`
//!   vector so presentation snapshots clone in O(1).
//!
//! ## Modules
//!
//! - `core`: IDs, rounds, RNG, configuration, errors
//! - `color`: HSL conversion, gradients, color-vision filters
//! - `rules`: `RoundRules` trait and round results
//! - `modes`: Sequence and memory state machines
//! - `service`: Game service trait, HTTP client, local backend
//! - `session`: Session controller, events, reveal timer

pub mod core;
pub mod color;
pub mod rules;
pub mod modes;
pub mod service;
pub mod session;

// Re-export commonly used types
pub use crate::core::{
    ColorId, TileId, SessionId, RoundToken,
    GameRng,
    GameMode, Difficulty, Round, grid_columns,
    EngineConfig, SessionSettings,
    ConfigError, RoundError, ServiceError, SessionError,
};

pub use crate::color::{Rgb, Hsl, VisionFilter, apply_vision_filter, gradient_color, hsl_to_rgb};

pub use crate::rules::{RoundResult, RoundRules};

pub use crate::modes::{
    ActiveRound,
    SequenceGame, SequencePhase, ClickOutcome,
    MemoryGame, MemoryPhase, FlipOutcome, PendingRevert, Tile,
};

pub use crate::service::{GameService, HttpGameService, LocalGameService};

pub use crate::session::{
    PlayerContext, SessionController, SessionEvent, EventOutcome,
    SessionState, SessionSnapshot, FinalSummary, RoundAdvance, RoundSummary, SubmitOutcome,
};
