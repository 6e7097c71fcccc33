//! Requests and responses exchanged with the game service.
//!
//! Field names follow the service's JSON wire format.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};

use crate::color::VisionFilter;
use crate::core::{ColorId, GameMode, Round, ServiceError, SessionId, SessionSettings};

/// `StartSession` request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StartSession {
    /// Blocks per round.
    pub count: u32,
    pub mode: GameMode,
    pub total_questions: u32,
    #[serde(default)]
    pub vision_filter: VisionFilter,
}

impl From<&SessionSettings> for StartSession {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            count: settings.difficulty.block_count(),
            mode: settings.mode,
            total_questions: settings.total_rounds,
            vision_filter: settings.vision_filter,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct StartSessionResponse {
    pub game_id: SessionId,
}

/// Wire shape of a next-round response.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum NextRoundResponse {
    Question {
        game_id: SessionId,
        question_number: u32,
        total_questions: u32,
        blocks: Vec<ColorId>,
    },
    Finished {
        finished: bool,
    },
}

/// Result of `NextRound`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NextRound {
    Round { session: SessionId, round: Round },
    Finished,
}

/// Only `{"finished": true}` ends the session; `false` without a question
/// is malformed.
impl TryFrom<NextRoundResponse> for NextRound {
    type Error = ServiceError;

    fn try_from(response: NextRoundResponse) -> Result<Self, Self::Error> {
        let next = match response {
            NextRoundResponse::Question {
                game_id,
                question_number,
                total_questions,
                blocks,
            } => NextRound::Round {
                session: game_id,
                round: Round::new(question_number, total_questions, blocks),
            },
            NextRoundResponse::Finished { finished: true } => NextRound::Finished,
            NextRoundResponse::Finished { finished: false } => {
                return Err(ServiceError::Malformed(serde_json::Error::custom(
                    "next round response has neither a question nor finished: true",
                )));
            }
        };
        Ok(next)
    }
}

/// `SubmitAnswer` request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    #[serde(rename = "game_id")]
    pub session: SessionId,
    pub answer: Vec<ColorId>,
    /// Seconds from round start to completion.
    pub time_used: f64,
    pub errors_count: u32,
}

/// Service verdict on a submitted answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerVerdict {
    pub correct: bool,
    pub score: u32,
    /// Expected answer, when the service reveals it.
    #[serde(default)]
    pub answer: Vec<ColorId>,
}

/// One scored round in the service's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    #[serde(rename = "question", alias = "round_number")]
    pub round_number: u32,
    #[serde(default)]
    pub errors_count: u32,
    #[serde(rename = "time_used", alias = "time_used_seconds")]
    pub time_used_seconds: f64,
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
}

/// `FinalScore` response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalScore {
    pub total_score: u32,
    #[serde(default)]
    pub history: Vec<RoundRecord>,
}

/// `RecordScore` request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(rename = "game_id", default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionId>,
    pub score: u32,
    pub username: String,
}

/// Leaderboard row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub username: String,
    pub score: u32,
}

/// Any service response may instead be `{"error": "..."}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ServiceReply<T> {
    Error { error: String },
    Ok(T),
}
