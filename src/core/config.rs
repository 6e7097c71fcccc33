//! Engine and session configuration.
//!
//! - `EngineConfig`: process-wide settings (service endpoint, scoring
//!   constants, timing, RNG seed). Loadable from TOML with environment
//!   overrides.
//! - `SessionSettings`: choices made once at session start (difficulty,
//!   vision filter, mode, round count).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::round::{Difficulty, GameMode};
use crate::color::VisionFilter;

/// Environment variable overriding `service_url`.
pub const ENV_SERVICE_URL: &str = "COLOR_SORT_SERVICE_URL";
/// Environment variable overriding `seed`.
pub const ENV_SEED: &str = "COLOR_SORT_SEED";

/// Process-wide engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL of the game service.
    pub service_url: String,

    /// Per-request timeout for the HTTP client.
    pub request_timeout_secs: u64,

    /// Points awarded per matched pair in memory mode.
    pub points_per_pair: u32,

    /// How long a mismatched pair stays face up before flipping back.
    pub mismatch_reveal_ms: u64,

    /// RNG seed. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8000".into(),
            request_timeout_secs: 10,
            points_per_pair: 10,
            mismatch_reveal_ms: 1000,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&raw)?.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse from a TOML string. Missing keys keep their defaults.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `COLOR_SORT_*` environment overrides.
    #[must_use]
    pub fn apply_env(mut self) -> Self {
        if let Ok(url) = std::env::var(ENV_SERVICE_URL) {
            self.service_url = url;
        }
        if let Ok(seed) = std::env::var(ENV_SEED) {
            if let Ok(parsed) = seed.parse::<u64>() {
                self.seed = Some(parsed);
            }
        }
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "service_url",
                reason: "must not be empty".into(),
            });
        }
        if self.points_per_pair == 0 {
            return Err(ConfigError::Invalid {
                key: "points_per_pair",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }

    /// Set the service URL.
    #[must_use]
    pub fn with_service_url(mut self, url: impl Into<String>) -> Self {
        self.service_url = url.into();
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set points per matched pair.
    #[must_use]
    pub fn with_points_per_pair(mut self, points: u32) -> Self {
        self.points_per_pair = points;
        self
    }

    /// Set the mismatch reveal delay in milliseconds.
    #[must_use]
    pub fn with_mismatch_reveal_ms(mut self, ms: u64) -> Self {
        self.mismatch_reveal_ms = ms;
        self
    }

    /// Mismatch reveal delay.
    #[must_use]
    pub fn mismatch_reveal(&self) -> Duration {
        Duration::from_millis(self.mismatch_reveal_ms)
    }

    /// HTTP request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Choices fixed for the lifetime of one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub difficulty: Difficulty,
    pub vision_filter: VisionFilter,
    pub mode: GameMode,
    pub total_rounds: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::new(Difficulty::default(), GameMode::default())
    }
}

impl SessionSettings {
    /// Create settings with the default of five rounds.
    #[must_use]
    pub fn new(difficulty: Difficulty, mode: GameMode) -> Self {
        Self {
            difficulty,
            vision_filter: VisionFilter::None,
            mode,
            total_rounds: 5,
        }
    }

    /// Set the vision filter.
    #[must_use]
    pub fn with_filter(mut self, filter: VisionFilter) -> Self {
        self.vision_filter = filter;
        self
    }

    /// Set the round count.
    #[must_use]
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.total_rounds = rounds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.service_url, "http://localhost:8000");
        assert_eq!(config.points_per_pair, 10);
        assert_eq!(config.mismatch_reveal(), Duration::from_secs(1));
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = EngineConfig::from_toml("points_per_pair = 25\nseed = 9\n").unwrap();
        assert_eq!(config.points_per_pair, 25);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.service_url, "http://localhost:8000");
    }

    #[test]
    fn test_from_toml_rejects_zero_points() {
        let err = EngineConfig::from_toml("points_per_pair = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "points_per_pair", .. }));
    }

    #[test]
    fn test_from_toml_rejects_garbage() {
        assert!(matches!(
            EngineConfig::from_toml("points_per_pair = \"ten\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::default()
            .with_service_url("http://game.local")
            .with_seed(3)
            .with_points_per_pair(5)
            .with_mismatch_reveal_ms(250);

        assert_eq!(config.service_url, "http://game.local");
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.points_per_pair, 5);
        assert_eq!(config.mismatch_reveal(), Duration::from_millis(250));
    }

    #[test]
    fn test_session_settings() {
        let settings = SessionSettings::new(Difficulty(12), GameMode::Memory)
            .with_filter(VisionFilter::Tritanopia)
            .with_rounds(3);

        assert_eq!(settings.total_rounds, 3);
        assert_eq!(settings.vision_filter, VisionFilter::Tritanopia);
        assert_eq!(settings.mode, GameMode::Memory);
    }
}
