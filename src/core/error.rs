//! Error types.
//!
//! Rejected input and wrong clicks are not errors; they surface as outcome
//! variants on the game modes. Everything here is recoverable: the session
//! stays in a state from which the caller can retry.

use thiserror::Error;

use super::ids::{ColorId, SessionId};

/// A round payload that cannot be played.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    #[error("round has no blocks")]
    Empty,
    #[error("identifier {0} appears more than once in a sequence round")]
    DuplicateIdentifier(ColorId),
    #[error("identifier {id} appears {count} times in a memory round, expected 2")]
    UnpairedIdentifier { id: ColorId, count: usize },
}

/// Failure talking to the game service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("game service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("game service returned malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("game service reported an error: {0}")]
    Rejected(String),
    #[error("unknown session {0}")]
    UnknownSession(SessionId),
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Error surfaced by the session controller to the presentation layer.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("malformed round {round_number}: {source}")]
    MalformedRound {
        round_number: u32,
        #[source]
        source: RoundError,
    },
    #[error("discarded stale response: {0}")]
    StaleResponse(String),
}

impl SessionError {
    /// True when re-issuing the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Service(ServiceError::Transport(_)) | SessionError::StaleResponse(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_error_messages() {
        let err = RoundError::UnpairedIdentifier { id: ColorId(3), count: 1 };
        assert_eq!(
            err.to_string(),
            "identifier Color(3) appears 1 times in a memory round, expected 2"
        );
    }

    #[test]
    fn test_session_error_wraps_round_error() {
        let err = SessionError::MalformedRound {
            round_number: 2,
            source: RoundError::Empty,
        };
        assert_eq!(err.to_string(), "malformed round 2: round has no blocks");
        assert!(!err.is_retryable());
        assert!(SessionError::StaleResponse("old round".into()).is_retryable());
    }
}
