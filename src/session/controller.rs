//! Session lifecycle.
//!
//! `SessionController` owns the session id, the active round, and the
//! score tally. It sequences calls to the game service and hands state to
//! the presentation layer through `snapshot`.
//!
//! ## States
//!
//! ```text
//! AwaitingRound --next round--> RoundInProgress --complete--> Submitting
//!       ^                                                        |
//!       +--------------------------------------------------------+
//! AwaitingRound --service says finished--> Finished
//! ```
//!
//! `Submitting` is entered before any service call on completion, so a
//! second completion signal for the same round is dropped rather than
//! submitted twice. A failed submission restores `RoundInProgress` with
//! the completed round intact, and the caller may retry.

use im::Vector;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::context::PlayerContext;
use super::events::{EventOutcome, SessionEvent};
use crate::core::{
    ColorId, EngineConfig, GameMode, GameRng, Round, RoundToken, SessionError, SessionId,
    SessionSettings, TileId,
};
use crate::modes::{ActiveRound, ClickOutcome, FlipOutcome, MemoryGame, PendingRevert, SequenceGame};
use crate::rules::{RoundResult, RoundRules};
use crate::service::{
    AnswerSubmission, AnswerVerdict, GameService, NextRound, RoundRecord, ScoreRecord, StartSession,
};

/// Externally visible session state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    AwaitingRound,
    RoundInProgress,
    Submitting,
    Finished,
}

/// A round the controller has closed out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round_number: u32,
    pub result: RoundResult,
    pub time_used_seconds: f64,
    /// Service verdict for sequence rounds.
    pub verdict: Option<AnswerVerdict>,
}

impl RoundSummary {
    /// Points this round contributed.
    #[must_use]
    pub fn points(&self) -> u32 {
        match &self.verdict {
            Some(verdict) => verdict.score,
            None => self.result.client_score(),
        }
    }
}

/// Totals reported when the session ends.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalSummary {
    /// Server total plus client-scored points.
    pub total_score: u32,
    /// Total reported by `FinalScore`; `None` if that call failed.
    pub server_total: Option<u32>,
    /// Per-round history from the service, empty if unavailable.
    pub history: Vec<RoundRecord>,
    /// False when `RecordScore` failed.
    pub recorded: bool,
}

/// Result of asking for the next round.
#[derive(Clone, Debug, PartialEq)]
pub enum RoundAdvance {
    /// A round is now in progress.
    Started { round_number: u32, total_rounds: u32 },
    /// The service has no more rounds.
    Finished(FinalSummary),
    /// Not awaiting a round; nothing was requested.
    Ignored,
}

/// Result of signalling round completion.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    /// No completed round to submit, or a submission is already underway.
    Dropped,
    /// The round was scored and the next one requested.
    Submitted {
        summary: RoundSummary,
        next: RoundAdvance,
    },
}

/// Cheap copy of session state for the presentation layer.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub session: SessionId,
    pub state: SessionState,
    pub mode: GameMode,
    pub round_number: Option<u32>,
    pub total_rounds: u32,
    /// Points so far: service verdicts plus client-scored rounds.
    pub score: u32,
    pub history: Vector<RoundSummary>,
}

#[derive(Clone, Debug)]
struct LiveRound {
    round: Round,
    game: ActiveRound,
    started: Instant,
}

#[derive(Clone, Debug)]
enum Phase {
    AwaitingRound,
    InProgress(LiveRound),
    Submitting(LiveRound),
    Finished(FinalSummary),
}

/// Drives one session against a `GameService`.
pub struct SessionController<S> {
    service: S,
    context: PlayerContext,
    settings: SessionSettings,
    config: EngineConfig,
    session: SessionId,
    rng: GameRng,
    phase: Phase,
    token: RoundToken,
    last_round_number: u32,
    server_points: u32,
    client_points: u32,
    history: Vector<RoundSummary>,
}

impl<S: GameService> SessionController<S> {
    /// Open a session on `service`.
    ///
    /// The controller starts in `AwaitingRound`; call `request_next_round`
    /// to fetch the first round.
    pub async fn start(
        service: S,
        context: PlayerContext,
        settings: SessionSettings,
        config: EngineConfig,
    ) -> Result<Self, SessionError> {
        let session = service.start_session(&StartSession::from(&settings)).await?;
        let rng = config.seed.map_or_else(GameRng::from_entropy, GameRng::new);
        info!(
            %session,
            mode = %settings.mode,
            blocks = settings.difficulty.block_count(),
            rounds = settings.total_rounds,
            player = %context.username,
            "session started"
        );

        Ok(Self {
            service,
            context,
            settings,
            config,
            session,
            rng,
            phase: Phase::AwaitingRound,
            token: RoundToken::default(),
            last_round_number: 0,
            server_points: 0,
            client_points: 0,
            history: Vector::new(),
        })
    }

    /// Fetch and start the next round, or finish the session.
    ///
    /// Only acts in `AwaitingRound`. On error the state is unchanged and
    /// the call may be repeated.
    pub async fn request_next_round(&mut self) -> Result<RoundAdvance, SessionError> {
        if !matches!(self.phase, Phase::AwaitingRound) {
            warn!(session = %self.session, state = ?self.state(), "next round requested out of turn");
            return Ok(RoundAdvance::Ignored);
        }

        match self.service.next_round(self.session).await? {
            NextRound::Finished => Ok(RoundAdvance::Finished(self.finish().await)),
            NextRound::Round { session, round } => self.begin_round(session, round),
        }
    }

    fn begin_round(&mut self, session: SessionId, round: Round) -> Result<RoundAdvance, SessionError> {
        if session != self.session {
            warn!(expected = %self.session, got = %session, "round for another session");
            return Err(SessionError::StaleResponse(format!(
                "round belongs to {session}, not {}",
                self.session
            )));
        }
        if round.round_number <= self.last_round_number {
            warn!(
                session = %self.session,
                round = round.round_number,
                last = self.last_round_number,
                "stale round response"
            );
            return Err(SessionError::StaleResponse(format!(
                "round {} already played",
                round.round_number
            )));
        }

        let token = self.token.next();
        let mut game = self.new_game(token);
        game.start_round(&round, token)
            .map_err(|source| SessionError::MalformedRound {
                round_number: round.round_number,
                source,
            })?;

        self.token = token;
        self.last_round_number = round.round_number;
        let advance = RoundAdvance::Started {
            round_number: round.round_number,
            total_rounds: round.total_rounds,
        };
        info!(
            session = %self.session,
            round = round.round_number,
            total = round.total_rounds,
            blocks = round.len(),
            "round started"
        );
        self.phase = Phase::InProgress(LiveRound {
            round,
            game,
            started: Instant::now(),
        });
        Ok(advance)
    }

    fn new_game(&self, token: RoundToken) -> ActiveRound {
        let rng = self.rng.for_context(&format!("round-{}", token.0));
        match self.settings.mode {
            GameMode::Sequence => ActiveRound::Sequence(SequenceGame::new(rng)),
            GameMode::Memory => ActiveRound::Memory(
                MemoryGame::new(rng)
                    .with_points_per_pair(self.config.points_per_pair)
                    .with_reveal_delay(self.config.mismatch_reveal()),
            ),
        }
    }

    /// Submit the completed round and request the next one.
    ///
    /// Returns `Dropped` unless a round is in progress and complete. On a
    /// submission error the round stays in progress and complete, so the
    /// call can be retried. If submission succeeds but fetching the next
    /// round fails, the session is left in `AwaitingRound`.
    pub async fn on_round_complete(&mut self) -> Result<SubmitOutcome, SessionError> {
        let live = match std::mem::replace(&mut self.phase, Phase::AwaitingRound) {
            Phase::InProgress(live) if live.game.is_complete() => live,
            other => {
                warn!(session = %self.session, state = ?state_of(&other), "completion signal dropped");
                self.phase = other;
                return Ok(SubmitOutcome::Dropped);
            }
        };

        let Some(result) = live.game.result() else {
            self.phase = Phase::InProgress(live);
            return Ok(SubmitOutcome::Dropped);
        };
        let time_used = live.started.elapsed().as_secs_f64();
        let round_number = live.round.round_number;
        self.phase = Phase::Submitting(live);

        let verdict = match &result {
            RoundResult::Sequence {
                answer,
                error_count,
            } => {
                let submission = AnswerSubmission {
                    session: self.session,
                    answer: answer.clone(),
                    time_used,
                    errors_count: *error_count,
                };
                match self.service.submit_answer(&submission).await {
                    Ok(verdict) => Some(verdict),
                    Err(err) => {
                        warn!(session = %self.session, round = round_number, error = %err, "submit failed");
                        self.restore_in_progress();
                        return Err(err.into());
                    }
                }
            }
            RoundResult::Memory { .. } => None,
        };

        let summary = RoundSummary {
            round_number,
            result,
            time_used_seconds: time_used,
            verdict,
        };
        match &summary.verdict {
            Some(verdict) => self.server_points += verdict.score,
            None => self.client_points += summary.result.client_score(),
        }
        info!(
            session = %self.session,
            round = round_number,
            points = summary.points(),
            time_used,
            "round scored"
        );
        self.history.push_back(summary.clone());
        self.phase = Phase::AwaitingRound;

        let next = self.request_next_round().await?;
        Ok(SubmitOutcome::Submitted { summary, next })
    }

    fn restore_in_progress(&mut self) {
        if let Phase::Submitting(live) = std::mem::replace(&mut self.phase, Phase::AwaitingRound) {
            self.phase = Phase::InProgress(live);
        }
    }

    /// Pick up after a failed `on_round_complete` or `request_next_round`.
    ///
    /// Resubmits while the completed round is still in progress. Once the
    /// submission has gone through, only the next round is fetched, so a
    /// round is never submitted twice. The submitted round's summary is the
    /// last entry of `history`.
    pub async fn resume(&mut self) -> Result<RoundAdvance, SessionError> {
        match self.state() {
            SessionState::AwaitingRound => self.request_next_round().await,
            SessionState::RoundInProgress => match self.on_round_complete().await? {
                SubmitOutcome::Submitted { next, .. } => Ok(next),
                SubmitOutcome::Dropped => Ok(RoundAdvance::Ignored),
            },
            SessionState::Finished => Ok(self
                .summary()
                .cloned()
                .map_or(RoundAdvance::Ignored, RoundAdvance::Finished)),
            SessionState::Submitting => Ok(RoundAdvance::Ignored),
        }
    }

    async fn finish(&mut self) -> FinalSummary {
        let local_total = self.server_points + self.client_points;
        let (server_total, history) = match self.service.final_score(self.session).await {
            Ok(score) => (Some(score.total_score), score.history),
            Err(err) => {
                warn!(session = %self.session, error = %err, "final score unavailable, using local tally");
                (None, Vec::new())
            }
        };
        let total_score = server_total.unwrap_or(self.server_points) + self.client_points;

        let record = ScoreRecord {
            session: Some(self.session),
            score: total_score,
            username: self.context.username.clone(),
        };
        let recorded = match self.service.record_score(&record).await {
            Ok(()) => true,
            Err(err) => {
                warn!(session = %self.session, error = %err, "failed to record score");
                false
            }
        };

        let summary = FinalSummary {
            total_score,
            server_total,
            history,
            recorded,
        };
        info!(
            session = %self.session,
            total = total_score,
            local = local_total,
            recorded,
            "session finished"
        );
        self.phase = Phase::Finished(summary.clone());
        summary
    }
}

impl<S> SessionController<S> {
    /// Apply a player input or timer expiry.
    ///
    /// Events that do not apply to the current state are ignored.
    pub fn handle_event(&mut self, event: SessionEvent) -> EventOutcome {
        match event {
            SessionEvent::Click(id) => EventOutcome::Click(self.click(id)),
            SessionEvent::Flip(id) => EventOutcome::Flip(self.flip(id)),
            SessionEvent::RevealElapsed(revert) => EventOutcome::Reverted(self.resolve_mismatch(&revert)),
        }
    }

    /// Click a sequence block.
    pub fn click(&mut self, id: ColorId) -> ClickOutcome {
        match &mut self.phase {
            Phase::InProgress(LiveRound {
                game: ActiveRound::Sequence(game),
                ..
            }) => game.click(id),
            _ => {
                debug!(%id, "click ignored");
                ClickOutcome::Ignored
            }
        }
    }

    /// Flip a memory tile.
    pub fn flip(&mut self, id: TileId) -> FlipOutcome {
        match &mut self.phase {
            Phase::InProgress(LiveRound {
                game: ActiveRound::Memory(game),
                ..
            }) => game.flip(id),
            _ => {
                debug!(%id, "flip ignored");
                FlipOutcome::Ignored
            }
        }
    }

    /// Flip back a mismatched pair once its reveal delay has elapsed.
    ///
    /// Returns `false` if the revert belongs to a round that is no longer
    /// in play.
    pub fn resolve_mismatch(&mut self, revert: &PendingRevert) -> bool {
        let applied = match &mut self.phase {
            Phase::InProgress(LiveRound {
                game: ActiveRound::Memory(game),
                ..
            }) => game.apply_revert(revert),
            _ => false,
        };
        if !applied {
            debug!(round = revert.round.0, "stale revert dropped");
        }
        applied
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        state_of(&self.phase)
    }

    /// Session id from the service.
    pub fn session_id(&self) -> SessionId {
        self.session
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn context(&self) -> &PlayerContext {
        &self.context
    }

    /// Round being played or submitted.
    pub fn current_round(&self) -> Option<&Round> {
        self.live().map(|live| &live.round)
    }

    /// Mode state machine of the round being played or submitted.
    pub fn active_round(&self) -> Option<&ActiveRound> {
        self.live().map(|live| &live.game)
    }

    /// Summary once the session has finished.
    pub fn summary(&self) -> Option<&FinalSummary> {
        match &self.phase {
            Phase::Finished(summary) => Some(summary),
            _ => None,
        }
    }

    /// Points so far.
    pub fn score(&self) -> u32 {
        self.server_points + self.client_points
    }

    /// Closed-out rounds, oldest first.
    pub fn history(&self) -> &Vector<RoundSummary> {
        &self.history
    }

    /// State for rendering. Shares history structurally with the controller.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.session,
            state: self.state(),
            mode: self.settings.mode,
            round_number: self.current_round().map(|round| round.round_number),
            total_rounds: self.settings.total_rounds,
            score: self.score(),
            history: self.history.clone(),
        }
    }

    fn live(&self) -> Option<&LiveRound> {
        match &self.phase {
            Phase::InProgress(live) | Phase::Submitting(live) => Some(live),
            _ => None,
        }
    }
}

fn state_of(phase: &Phase) -> SessionState {
    match phase {
        Phase::AwaitingRound => SessionState::AwaitingRound,
        Phase::InProgress(_) => SessionState::RoundInProgress,
        Phase::Submitting(_) => SessionState::Submitting,
        Phase::Finished(_) => SessionState::Finished,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::LocalGameService;

    async fn controller(mode: GameMode, blocks: u32, rounds: u32) -> SessionController<LocalGameService> {
        let settings = SessionSettings::new(crate::core::Difficulty(blocks), mode).with_rounds(rounds);
        let config = EngineConfig::default().with_seed(11);
        SessionController::start(
            LocalGameService::new(GameRng::new(5)),
            PlayerContext::new("tester"),
            settings,
            config,
        )
        .await
        .unwrap()
    }

    fn solve_sequence<S>(controller: &mut SessionController<S>) {
        let mut order = controller.current_round().unwrap().identifiers.clone();
        order.sort_unstable();
        for id in order {
            controller.click(id);
        }
    }

    #[tokio::test]
    async fn test_starts_awaiting_round() {
        let controller = controller(GameMode::Sequence, 6, 2).await;
        assert_eq!(controller.state(), SessionState::AwaitingRound);
        assert!(controller.current_round().is_none());
        assert_eq!(controller.snapshot().total_rounds, 2);
    }

    #[tokio::test]
    async fn test_sequence_session_runs_to_finish() {
        let mut controller = controller(GameMode::Sequence, 6, 2).await;
        let advance = controller.request_next_round().await.unwrap();
        assert_eq!(
            advance,
            RoundAdvance::Started {
                round_number: 1,
                total_rounds: 2
            }
        );
        assert_eq!(controller.state(), SessionState::RoundInProgress);

        solve_sequence(&mut controller);
        let SubmitOutcome::Submitted { summary, next } = controller.on_round_complete().await.unwrap() else {
            panic!("round should submit");
        };
        assert!(summary.verdict.as_ref().unwrap().correct);
        assert!(matches!(next, RoundAdvance::Started { round_number: 2, .. }));

        solve_sequence(&mut controller);
        let SubmitOutcome::Submitted { next, .. } = controller.on_round_complete().await.unwrap() else {
            panic!("round should submit");
        };
        let RoundAdvance::Finished(final_summary) = next else {
            panic!("session should finish");
        };
        assert_eq!(controller.state(), SessionState::Finished);
        assert_eq!(final_summary.server_total, Some(controller.score()));
        assert_eq!(final_summary.total_score, controller.score());
        assert!(final_summary.recorded);
        assert_eq!(controller.history().len(), 2);
    }

    #[tokio::test]
    async fn test_incomplete_round_is_not_submitted() {
        let mut controller = controller(GameMode::Sequence, 6, 1).await;
        controller.request_next_round().await.unwrap();
        assert_eq!(controller.on_round_complete().await.unwrap(), SubmitOutcome::Dropped);
        assert_eq!(controller.state(), SessionState::RoundInProgress);
    }

    #[tokio::test]
    async fn test_request_out_of_turn_is_ignored() {
        let mut controller = controller(GameMode::Sequence, 6, 1).await;
        controller.request_next_round().await.unwrap();
        assert_eq!(controller.request_next_round().await.unwrap(), RoundAdvance::Ignored);
        assert_eq!(controller.current_round().unwrap().round_number, 1);
    }

    #[tokio::test]
    async fn test_input_for_other_mode_is_ignored() {
        let mut controller = controller(GameMode::Memory, 6, 1).await;
        controller.request_next_round().await.unwrap();
        assert_eq!(controller.click(ColorId(0)), ClickOutcome::Ignored);
        assert!(matches!(controller.flip(TileId(0)), FlipOutcome::Revealed(TileId(0))));
    }

    #[tokio::test]
    async fn test_memory_points_are_client_side() {
        let mut controller = controller(GameMode::Memory, 4, 1).await;
        controller.request_next_round().await.unwrap();

        let keys: Vec<ColorId> = controller.current_round().unwrap().identifiers.clone();
        for key in 0..2 {
            let tiles: Vec<TileId> = keys
                .iter()
                .enumerate()
                .filter(|(_, &k)| k == ColorId(key))
                .map(|(i, _)| TileId(i as u32))
                .collect();
            controller.flip(tiles[0]);
            controller.flip(tiles[1]);
        }
        assert!(controller.active_round().unwrap().is_complete());

        let SubmitOutcome::Submitted { summary, next } = controller.on_round_complete().await.unwrap() else {
            panic!("round should submit");
        };
        assert_eq!(summary.points(), 20);
        assert!(summary.verdict.is_none());
        let RoundAdvance::Finished(final_summary) = next else {
            panic!("session should finish");
        };
        assert_eq!(final_summary.server_total, Some(0));
        assert_eq!(final_summary.total_score, 20);
    }
}
