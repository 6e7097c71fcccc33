//! Game service boundary.
//!
//! The session controller never talks HTTP directly. It drives a
//! `GameService`, which is implemented by:
//!
//! - `HttpGameService`: the remote backend's JSON API
//! - `LocalGameService`: an in-process backend for offline play and tests

mod http;
mod local;
mod types;

use std::sync::Arc;

use async_trait::async_trait;

pub use http::HttpGameService;
pub use local::{score_answer, LocalGameService, CORRECT_ANSWER_POINTS, ERROR_PENALTY, TIME_BONUS_CAP};
pub use types::{
    AnswerSubmission, AnswerVerdict, FinalScore, LeaderboardEntry, NextRound, RoundRecord,
    ScoreRecord, StartSession,
};

use crate::core::{ServiceError, SessionId};

/// Remote operations a session depends on.
///
/// Every call may fail; callers decide whether a failure blocks the session
/// (`start_session`, `next_round`, `submit_answer`) or is only logged
/// (`record_score`).
#[async_trait]
pub trait GameService: Send + Sync {
    /// Open a session and return its id.
    async fn start_session(&self, request: &StartSession) -> Result<SessionId, ServiceError>;

    /// Next round of `session`, or `Finished` once all rounds were issued.
    async fn next_round(&self, session: SessionId) -> Result<NextRound, ServiceError>;

    /// Score a completed sequence round.
    async fn submit_answer(&self, submission: &AnswerSubmission)
        -> Result<AnswerVerdict, ServiceError>;

    /// Server-side total and per-round history.
    async fn final_score(&self, session: SessionId) -> Result<FinalScore, ServiceError>;

    /// Store a final score on the leaderboard.
    async fn record_score(&self, record: &ScoreRecord) -> Result<(), ServiceError>;
}

#[async_trait]
impl<S: GameService + ?Sized> GameService for Arc<S> {
    async fn start_session(&self, request: &StartSession) -> Result<SessionId, ServiceError> {
        (**self).start_session(request).await
    }

    async fn next_round(&self, session: SessionId) -> Result<NextRound, ServiceError> {
        (**self).next_round(session).await
    }

    async fn submit_answer(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<AnswerVerdict, ServiceError> {
        (**self).submit_answer(submission).await
    }

    async fn final_score(&self, session: SessionId) -> Result<FinalScore, ServiceError> {
        (**self).final_score(session).await
    }

    async fn record_score(&self, record: &ScoreRecord) -> Result<(), ServiceError> {
        (**self).record_score(record).await
    }
}
