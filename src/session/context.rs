//! Player identity for a session.

use serde::{Deserialize, Serialize};

/// Name used when the player never entered one.
pub const GUEST_USERNAME: &str = "Guest";

/// Who is playing. Passed explicitly to the session controller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerContext {
    pub username: String,
}

impl PlayerContext {
    /// Context for `username`. Blank names fall back to the guest name.
    pub fn new(username: impl Into<String>) -> Self {
        let username = username.into();
        let trimmed = username.trim();
        if trimmed.is_empty() {
            Self::guest()
        } else {
            Self {
                username: trimmed.to_string(),
            }
        }
    }

    /// Anonymous player.
    pub fn guest() -> Self {
        Self {
            username: GUEST_USERNAME.to_string(),
        }
    }
}

impl Default for PlayerContext {
    fn default() -> Self {
        Self::guest()
    }
}
