//! In-process game service.
//!
//! Generates rounds, scores sequence answers, and keeps a leaderboard,
//! mirroring the remote backend closely enough to play offline.

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::types::{
    AnswerSubmission, AnswerVerdict, FinalScore, LeaderboardEntry, NextRound, RoundRecord,
    ScoreRecord, StartSession,
};
use super::GameService;
use crate::core::{ColorId, GameMode, GameRng, Round, ServiceError, SessionId};

/// Base points for a correct sequence answer.
pub const CORRECT_ANSWER_POINTS: u32 = 100;
/// Points deducted per wrong click.
pub const ERROR_PENALTY: u32 = 10;
/// Bonus for an instant answer; shrinks by one per whole second.
pub const TIME_BONUS_CAP: u32 = 20;

/// Score for one sequence answer.
///
/// `100 - 10 * errors + max(0, 20 - floor(time_used))`, never below zero.
/// Wrong answers score zero.
pub fn score_answer(correct: bool, time_used: f64, errors_count: u32) -> u32 {
    if !correct {
        return 0;
    }
    let elapsed = time_used.max(0.0).floor();
    let bonus = (f64::from(TIME_BONUS_CAP) - elapsed).max(0.0) as u32;
    (CORRECT_ANSWER_POINTS + bonus).saturating_sub(ERROR_PENALTY.saturating_mul(errors_count))
}

#[derive(Debug)]
struct LocalSession {
    mode: GameMode,
    questions: Vec<Vec<ColorId>>,
    /// Questions issued so far; the current one is `issued - 1`.
    issued: usize,
    total_score: u32,
    history: Vec<RoundRecord>,
}

#[derive(Debug)]
struct LocalState {
    next_id: i64,
    sessions: FxHashMap<SessionId, LocalSession>,
    scores: Vec<(String, u32)>,
    rng: GameRng,
}

/// `GameService` backed by in-memory state.
#[derive(Debug)]
pub struct LocalGameService {
    state: Mutex<LocalState>,
}

impl LocalGameService {
    /// Service whose rounds are shuffled by `rng`.
    pub fn new(rng: GameRng) -> Self {
        Self {
            state: Mutex::new(LocalState {
                next_id: 1,
                sessions: FxHashMap::default(),
                scores: Vec::new(),
                rng,
            }),
        }
    }

    /// Best `limit` recorded scores, highest first.
    pub async fn top_scores(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let state = self.state.lock().await;
        let mut scores = state.scores.clone();
        scores.sort_by(|a, b| b.1.cmp(&a.1));
        scores
            .into_iter()
            .take(limit)
            .zip(1u32..)
            .map(|((username, score), rank)| LeaderboardEntry {
                rank,
                username,
                score,
            })
            .collect()
    }

    fn generate_question(rng: &mut GameRng, mode: GameMode, count: u32) -> Vec<ColorId> {
        let mut blocks: Vec<ColorId> = match mode {
            GameMode::Sequence => (0..count).map(ColorId).collect(),
            GameMode::Memory => (0..count / 2)
                .flat_map(|key| [ColorId(key), ColorId(key)])
                .collect(),
        };
        rng.shuffle(&mut blocks);
        blocks
    }
}

impl Default for LocalGameService {
    fn default() -> Self {
        Self::new(GameRng::from_entropy())
    }
}

#[async_trait]
impl GameService for LocalGameService {
    async fn start_session(&self, request: &StartSession) -> Result<SessionId, ServiceError> {
        let min_count = match request.mode {
            GameMode::Sequence => 1,
            GameMode::Memory => 2,
        };
        if request.count < min_count {
            return Err(ServiceError::Rejected(format!(
                "{} needs at least {min_count} blocks",
                request.mode
            )));
        }
        if request.total_questions == 0 {
            return Err(ServiceError::Rejected("total_questions must be positive".into()));
        }

        let mut state = self.state.lock().await;
        let id = SessionId(state.next_id);
        state.next_id += 1;

        let mut rng = state.rng.for_context(&format!("session-{}", id.0));
        let questions = (0..request.total_questions)
            .map(|_| Self::generate_question(&mut rng, request.mode, request.count))
            .collect();

        state.sessions.insert(
            id,
            LocalSession {
                mode: request.mode,
                questions,
                issued: 0,
                total_score: 0,
                history: Vec::new(),
            },
        );
        info!(session = %id, mode = %request.mode, count = request.count, "local session started");
        Ok(id)
    }

    async fn next_round(&self, session: SessionId) -> Result<NextRound, ServiceError> {
        let mut state = self.state.lock().await;
        let game = state
            .sessions
            .get_mut(&session)
            .ok_or(ServiceError::UnknownSession(session))?;

        let total = game.questions.len();
        let Some(blocks) = game.questions.get(game.issued).cloned() else {
            return Ok(NextRound::Finished);
        };
        game.issued += 1;
        debug!(%session, mode = %game.mode, question = game.issued, "issued question");
        Ok(NextRound::Round {
            session,
            round: Round::new(game.issued as u32, total as u32, blocks),
        })
    }

    async fn submit_answer(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<AnswerVerdict, ServiceError> {
        let mut state = self.state.lock().await;
        let game = state
            .sessions
            .get_mut(&submission.session)
            .ok_or(ServiceError::UnknownSession(submission.session))?;

        let index = game
            .issued
            .checked_sub(1)
            .ok_or_else(|| ServiceError::Rejected("no question has been issued".into()))?;
        if game.history.iter().any(|r| r.round_number as usize == index + 1) {
            return Err(ServiceError::Rejected(format!(
                "question {} already answered",
                index + 1
            )));
        }

        let mut expected = game.questions[index].clone();
        expected.sort_unstable();
        let correct = submission.answer == expected;
        let score = score_answer(correct, submission.time_used, submission.errors_count);

        game.total_score += score;
        game.history.push(RoundRecord {
            round_number: index as u32 + 1,
            errors_count: submission.errors_count,
            time_used_seconds: submission.time_used,
            score,
            correct: Some(correct),
        });
        debug!(session = %submission.session, correct, score, "scored answer");

        Ok(AnswerVerdict {
            correct,
            score,
            answer: expected,
        })
    }

    async fn final_score(&self, session: SessionId) -> Result<FinalScore, ServiceError> {
        let state = self.state.lock().await;
        let game = state
            .sessions
            .get(&session)
            .ok_or(ServiceError::UnknownSession(session))?;
        Ok(FinalScore {
            total_score: game.total_score,
            history: game.history.clone(),
        })
    }

    /// Recording a session's score closes it; its rounds and history are
    /// dropped and later calls for it fail with `UnknownSession`.
    async fn record_score(&self, record: &ScoreRecord) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        if let Some(session) = record.session {
            state
                .sessions
                .remove(&session)
                .ok_or(ServiceError::UnknownSession(session))?;
        }
        state.scores.push((record.username.clone(), record.score));
        info!(
            username = %record.username,
            score = record.score,
            open_sessions = state.sessions.len(),
            "score recorded"
        );
        Ok(())
    }
}
