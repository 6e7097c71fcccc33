//! Round rules shared by every game mode.
//!
//! Modes implement `RoundRules`; the session controller only ever sees a
//! `RoundResult`, never mode internals.

pub mod engine;

pub use engine::{RoundResult, RoundRules};
