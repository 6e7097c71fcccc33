//! Session controller integration tests.
//!
//! A scripted service records every call so the tests can check exactly
//! what the controller sent and in which order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use color_sort::core::{
    ColorId, Difficulty, EngineConfig, GameMode, Round, ServiceError, SessionError, SessionId,
    SessionSettings, TileId,
};
use color_sort::modes::{ClickOutcome, FlipOutcome};
use color_sort::service::{
    AnswerSubmission, AnswerVerdict, FinalScore, GameService, NextRound, ScoreRecord, StartSession,
};
use color_sort::session::{
    EventOutcome, PlayerContext, RoundAdvance, SessionController, SessionEvent, SessionState,
    SubmitOutcome,
};

const SESSION: SessionId = SessionId(7);

#[derive(Default)]
struct ScriptedService {
    rounds: Mutex<VecDeque<NextRound>>,
    submit_failures: AtomicU32,
    next_round_failures: AtomicU32,
    verdict_score: u32,
    final_total: Option<u32>,
    record_fails: bool,
    calls: Mutex<Vec<&'static str>>,
    submissions: Mutex<Vec<AnswerSubmission>>,
    records: Mutex<Vec<ScoreRecord>>,
}

impl ScriptedService {
    fn with_rounds(rounds: Vec<NextRound>) -> Self {
        Self {
            rounds: Mutex::new(rounds.into()),
            verdict_score: 100,
            final_total: Some(0),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| **c == name).count()
    }

    fn log(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

#[async_trait]
impl GameService for ScriptedService {
    async fn start_session(&self, _request: &StartSession) -> Result<SessionId, ServiceError> {
        self.log("start_session");
        Ok(SESSION)
    }

    async fn next_round(&self, _session: SessionId) -> Result<NextRound, ServiceError> {
        self.log("next_round");
        let remaining = self.next_round_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.next_round_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ServiceError::Rejected("backend hiccup".into()));
        }
        Ok(self
            .rounds
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(NextRound::Finished))
    }

    async fn submit_answer(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<AnswerVerdict, ServiceError> {
        self.log("submit_answer");
        let remaining = self.submit_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.submit_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ServiceError::Rejected("service unavailable".into()));
        }
        self.submissions.lock().unwrap().push(submission.clone());
        Ok(AnswerVerdict {
            correct: true,
            score: self.verdict_score,
            answer: submission.answer.clone(),
        })
    }

    async fn final_score(&self, _session: SessionId) -> Result<FinalScore, ServiceError> {
        self.log("final_score");
        match self.final_total {
            Some(total_score) => Ok(FinalScore {
                total_score,
                history: Vec::new(),
            }),
            None => Err(ServiceError::Rejected("Game not found".into())),
        }
    }

    async fn record_score(&self, record: &ScoreRecord) -> Result<(), ServiceError> {
        self.log("record_score");
        if self.record_fails {
            return Err(ServiceError::Rejected("leaderboard offline".into()));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

fn round(number: u32, total: u32, blocks: &[u32]) -> NextRound {
    NextRound::Round {
        session: SESSION,
        round: Round::new(number, total, blocks.iter().copied().map(ColorId).collect()),
    }
}

async fn start(
    service: &Arc<ScriptedService>,
    mode: GameMode,
) -> SessionController<Arc<ScriptedService>> {
    let settings = SessionSettings::new(Difficulty(4), mode).with_rounds(2);
    let config = EngineConfig::default()
        .with_seed(3)
        .with_mismatch_reveal_ms(500);
    SessionController::start(Arc::clone(service), PlayerContext::new("ada"), settings, config)
        .await
        .unwrap()
}

fn solve<S>(controller: &mut SessionController<S>) {
    let mut order = controller.current_round().unwrap().identifiers.clone();
    order.sort_unstable();
    for id in order {
        controller.handle_event(SessionEvent::Click(id));
    }
}

// =============================================================================
// Finishing
// =============================================================================

/// Test that a failed RecordScore still leaves the session finished.
#[tokio::test]
async fn test_record_failure_still_finishes() {
    let service = Arc::new(ScriptedService {
        record_fails: true,
        final_total: Some(240),
        ..ScriptedService::default()
    });
    let mut controller = start(&service, GameMode::Sequence).await;

    let advance = controller.request_next_round().await.unwrap();
    let RoundAdvance::Finished(summary) = advance else {
        panic!("expected the session to finish, got {advance:?}");
    };
    assert_eq!(summary.total_score, 240);
    assert!(!summary.recorded);
    assert_eq!(controller.state(), SessionState::Finished);
    assert_eq!(
        service.calls(),
        vec!["start_session", "next_round", "final_score", "record_score"]
    );
}

/// Test that a failed FinalScore falls back to the local tally.
#[tokio::test]
async fn test_final_score_failure_uses_local_tally() {
    let service = Arc::new(ScriptedService {
        final_total: None,
        ..ScriptedService::with_rounds(vec![round(1, 1, &[1, 0])])
    });
    let mut controller = start(&service, GameMode::Sequence).await;
    controller.request_next_round().await.unwrap();
    solve(&mut controller);

    let SubmitOutcome::Submitted { next, .. } = controller.on_round_complete().await.unwrap() else {
        panic!("round should submit");
    };
    let RoundAdvance::Finished(summary) = next else {
        panic!("expected the session to finish");
    };
    assert_eq!(summary.server_total, None);
    assert_eq!(summary.total_score, 100);

    let records = service.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].username, "ada");
    assert_eq!(records[0].score, 100);
    assert_eq!(records[0].session, Some(SESSION));
}

// =============================================================================
// Submission
// =============================================================================

/// Test that a second completion signal never submits twice.
#[tokio::test]
async fn test_duplicate_completion_submits_once() {
    let service = Arc::new(ScriptedService::with_rounds(vec![
        round(1, 2, &[2, 0, 1]),
        round(2, 2, &[0, 1, 2]),
    ]));
    let mut controller = start(&service, GameMode::Sequence).await;
    controller.request_next_round().await.unwrap();
    solve(&mut controller);

    let first = controller.on_round_complete().await.unwrap();
    assert!(matches!(first, SubmitOutcome::Submitted { .. }));
    let second = controller.on_round_complete().await.unwrap();
    assert_eq!(second, SubmitOutcome::Dropped);

    assert_eq!(service.count("submit_answer"), 1);
    assert_eq!(controller.current_round().unwrap().round_number, 2);
}

/// Test that the submission carries the sorted answer and error count.
#[tokio::test]
async fn test_submission_payload() {
    let service = Arc::new(ScriptedService::with_rounds(vec![round(1, 1, &[2, 0, 1])]));
    let mut controller = start(&service, GameMode::Sequence).await;
    controller.request_next_round().await.unwrap();

    assert!(matches!(
        controller.handle_event(SessionEvent::Click(ColorId(1))),
        EventOutcome::Click(ClickOutcome::Wrong { .. })
    ));
    solve(&mut controller);
    controller.on_round_complete().await.unwrap();

    let submissions = service.submissions.lock().unwrap();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].session, SESSION);
    assert_eq!(submissions[0].answer, vec![ColorId(0), ColorId(1), ColorId(2)]);
    assert_eq!(submissions[0].errors_count, 1);
    assert!(submissions[0].time_used >= 0.0);
}

/// Test that a failed submission can be retried without replaying the round.
#[tokio::test]
async fn test_submit_failure_allows_retry() {
    let service = Arc::new(ScriptedService::with_rounds(vec![round(1, 1, &[1, 0])]));
    service.submit_failures.store(1, Ordering::SeqCst);
    let mut controller = start(&service, GameMode::Sequence).await;
    controller.request_next_round().await.unwrap();
    solve(&mut controller);

    let err = controller.on_round_complete().await.unwrap_err();
    assert!(matches!(err, SessionError::Service(ServiceError::Rejected(_))));
    assert_eq!(controller.state(), SessionState::RoundInProgress);
    assert!(controller.history().is_empty());

    let outcome = controller.on_round_complete().await.unwrap();
    assert!(matches!(
        outcome,
        SubmitOutcome::Submitted {
            next: RoundAdvance::Finished(_),
            ..
        }
    ));
    assert_eq!(service.count("submit_answer"), 2);
    assert_eq!(controller.score(), 100);
}

/// Test that resuming after the next round failed fetches it without resubmitting.
#[tokio::test]
async fn test_resume_after_next_round_failure() {
    let service = Arc::new(ScriptedService::with_rounds(vec![
        round(1, 2, &[1, 0]),
        round(2, 2, &[0, 2, 1]),
    ]));
    let mut controller = start(&service, GameMode::Sequence).await;
    controller.request_next_round().await.unwrap();
    solve(&mut controller);
    service.next_round_failures.store(1, Ordering::SeqCst);

    let err = controller.on_round_complete().await.unwrap_err();
    assert!(matches!(err, SessionError::Service(ServiceError::Rejected(_))));
    assert_eq!(controller.state(), SessionState::AwaitingRound);
    assert_eq!(controller.history().len(), 1);

    // The round is already recorded, so completion is no longer the way forward.
    assert_eq!(controller.on_round_complete().await.unwrap(), SubmitOutcome::Dropped);

    let advance = controller.resume().await.unwrap();
    assert_eq!(
        advance,
        RoundAdvance::Started {
            round_number: 2,
            total_rounds: 2
        }
    );
    assert_eq!(controller.state(), SessionState::RoundInProgress);
    assert_eq!(service.count("submit_answer"), 1);
    assert_eq!(controller.history().len(), 1);
    assert_eq!(controller.score(), 100);
}

/// Test that resuming after a failed submission resubmits the same round.
#[tokio::test]
async fn test_resume_after_submit_failure() {
    let service = Arc::new(ScriptedService::with_rounds(vec![round(1, 1, &[1, 0])]));
    service.submit_failures.store(1, Ordering::SeqCst);
    let mut controller = start(&service, GameMode::Sequence).await;
    controller.request_next_round().await.unwrap();
    solve(&mut controller);

    controller.on_round_complete().await.unwrap_err();
    assert_eq!(controller.state(), SessionState::RoundInProgress);

    let advance = controller.resume().await.unwrap();
    assert!(matches!(advance, RoundAdvance::Finished(ref s) if s.total_score == 0));
    assert_eq!(service.count("submit_answer"), 2);
    assert_eq!(service.submissions.lock().unwrap().len(), 1);

    // Resuming a finished session repeats the summary and calls nothing.
    let calls = service.calls().len();
    assert!(matches!(controller.resume().await.unwrap(), RoundAdvance::Finished(_)));
    assert_eq!(service.calls().len(), calls);
}

// =============================================================================
// Round Responses
// =============================================================================

/// Test that a repeated round number is discarded as stale.
#[tokio::test]
async fn test_stale_round_is_discarded() {
    let service = Arc::new(ScriptedService::with_rounds(vec![
        round(1, 2, &[1, 0]),
        round(1, 2, &[1, 0]),
        round(2, 2, &[0, 1]),
    ]));
    let mut controller = start(&service, GameMode::Sequence).await;
    controller.request_next_round().await.unwrap();
    solve(&mut controller);

    let err = controller.on_round_complete().await.unwrap_err();
    assert!(matches!(err, SessionError::StaleResponse(_)));
    assert_eq!(controller.state(), SessionState::AwaitingRound);
    assert_eq!(controller.history().len(), 1);

    let advance = controller.request_next_round().await.unwrap();
    assert!(matches!(advance, RoundAdvance::Started { round_number: 2, .. }));
}

/// Test that a round for a different session is rejected.
#[tokio::test]
async fn test_round_for_other_session_is_rejected() {
    let service = Arc::new(ScriptedService::with_rounds(vec![NextRound::Round {
        session: SessionId(99),
        round: Round::new(1, 1, vec![ColorId(0)]),
    }]));
    let mut controller = start(&service, GameMode::Sequence).await;

    let err = controller.request_next_round().await.unwrap_err();
    assert!(matches!(err, SessionError::StaleResponse(_)));
    assert_eq!(controller.state(), SessionState::AwaitingRound);
}

/// Test that an unplayable round surfaces as an error.
#[tokio::test]
async fn test_malformed_round() {
    let service = Arc::new(ScriptedService::with_rounds(vec![round(1, 1, &[0, 0, 1])]));
    let mut controller = start(&service, GameMode::Sequence).await;

    let err = controller.request_next_round().await.unwrap_err();
    assert!(matches!(err, SessionError::MalformedRound { round_number: 1, .. }));
    assert_eq!(controller.state(), SessionState::AwaitingRound);
}

// =============================================================================
// Memory Sessions
// =============================================================================

/// Test a memory session with a mismatch revert and client-side scoring.
#[tokio::test(start_paused = true)]
async fn test_memory_session_scores_on_client() {
    let service = Arc::new(ScriptedService::with_rounds(vec![round(1, 1, &[5, 0, 5, 0])]));
    let mut controller = start(&service, GameMode::Memory).await;
    controller.request_next_round().await.unwrap();

    controller.handle_event(SessionEvent::Flip(TileId(0)));
    let outcome = controller.handle_event(SessionEvent::Flip(TileId(1)));
    let revert = outcome.pending_revert().unwrap();
    assert_eq!(revert.delay, Duration::from_millis(500));

    let revert = color_sort::session::timer::after_reveal(revert).await;
    assert_eq!(
        controller.handle_event(SessionEvent::RevealElapsed(revert)),
        EventOutcome::Reverted(true)
    );
    assert_eq!(
        controller.handle_event(SessionEvent::RevealElapsed(revert)),
        EventOutcome::Reverted(false)
    );

    for (a, b) in [(0, 2), (1, 3)] {
        controller.handle_event(SessionEvent::Flip(TileId(a)));
        let outcome = controller.handle_event(SessionEvent::Flip(TileId(b)));
        assert!(!matches!(outcome, EventOutcome::Flip(FlipOutcome::Mismatched(_))));
    }

    let SubmitOutcome::Submitted { summary, next } = controller.on_round_complete().await.unwrap() else {
        panic!("round should submit");
    };
    assert_eq!(summary.points(), 20);
    assert!(matches!(next, RoundAdvance::Finished(ref s) if s.total_score == 20));
    assert_eq!(service.count("submit_answer"), 0);
    assert_eq!(service.records.lock().unwrap()[0].score, 20);
}

/// Test that the snapshot reflects progress and keeps history.
#[tokio::test]
async fn test_snapshot_tracks_progress() {
    let service = Arc::new(ScriptedService::with_rounds(vec![
        round(1, 2, &[1, 0]),
        round(2, 2, &[0, 1]),
    ]));
    let mut controller = start(&service, GameMode::Sequence).await;
    controller.request_next_round().await.unwrap();

    let before = controller.snapshot();
    assert_eq!(before.state, SessionState::RoundInProgress);
    assert_eq!(before.round_number, Some(1));
    assert_eq!(before.score, 0);

    solve(&mut controller);
    controller.on_round_complete().await.unwrap();

    let after = controller.snapshot();
    assert_eq!(after.round_number, Some(2));
    assert_eq!(after.score, 100);
    assert_eq!(after.history.len(), 1);
    assert!(before.history.is_empty());
}
