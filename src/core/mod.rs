//! Core engine types: identifiers, rounds, RNG, configuration, errors.

pub mod ids;
pub mod rng;
pub mod round;
pub mod config;
pub mod error;

pub use ids::{ColorId, RoundToken, SessionId, TileId};
pub use rng::GameRng;
pub use round::{grid_columns, Difficulty, GameMode, Round};
pub use config::{EngineConfig, SessionSettings};
pub use error::{ConfigError, RoundError, ServiceError, SessionError};
