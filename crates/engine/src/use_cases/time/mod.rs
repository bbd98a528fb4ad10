//! Time use cases.
//!
//! Handles game clock operations including:
//! - Pausing, resuming and changing the speed of a session's clock
//! - Starting timed forensic analyses
//! - Driving the clock from a per-session background task

use std::sync::Arc;
use std::time::Duration;

use casefile_domain::{
    ActionProcessor, AnalysisType, AnalysisView, ClockView, EvidenceId, GameProgress,
    TimedAnalysis,
};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{commit, install, require_session, save, GameError};
use crate::infrastructure::ports::{ClockPort, ProgressRepo};
use crate::stores::session::SharedSession;
use crate::stores::{GameSession, SessionKey, SessionStore};

// =============================================================================
// Clock Driver
// =============================================================================

/// Advances session clocks and folds completed analyses into progress.
pub struct ClockDriver {
    progress: Arc<dyn ProgressRepo>,
    clock: Arc<dyn ClockPort>,
    tick_interval: Duration,
}

impl ClockDriver {
    pub fn new(
        progress: Arc<dyn ProgressRepo>,
        clock: Arc<dyn ClockPort>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            progress,
            clock,
            tick_interval,
        }
    }

    /// One tick: advance game time and record any analyses that finished.
    ///
    /// The session lock is released before the new progress is saved.
    pub async fn tick(
        &self,
        key: &SessionKey,
        session: &tokio::sync::Mutex<GameSession>,
    ) -> Result<Vec<TimedAnalysis>, GameError> {
        let (completions, progress, gate) = {
            let mut guard = session.lock().await;
            let session = &mut *guard;

            let now = self.clock.now();
            let game_time = session.clock.tick(now);
            let completions = session.clock.poll_completions(game_time);
            if completions.is_empty() {
                return Ok(completions);
            }

            for analysis in &completions {
                tracing::info!(
                    session = %key,
                    analysis = %analysis.key(),
                    result = ?analysis.result(),
                    "Analysis completed"
                );
            }
            let case = Arc::clone(&session.case);
            let outcome =
                ActionProcessor::new(&case).fold_completions(&session.progress, &completions, now);
            let Some(progress) = install(key, session, outcome) else {
                return Ok(completions);
            };
            let gate = session.save_gate.clone().lock_owned().await;
            (completions, progress, gate)
        };

        let saved = save(self.progress.as_ref(), key, &progress).await;
        drop(gate);
        saved?;
        Ok(completions)
    }

    /// Tick the session every `tick_interval` until `cancel` fires.
    pub fn spawn(
        self: &Arc<Self>,
        key: SessionKey,
        session: SharedSession,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let driver = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(driver.tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::debug!(session = %key, "Clock driver started");

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!(session = %key, "Clock driver stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(e) = driver.tick(&key, &session).await {
                            tracing::warn!(session = %key, error = %e, "Clock tick failed");
                        }
                    }
                }
            }
        })
    }
}

// =============================================================================
// Clock Controls
// =============================================================================

pub struct TimeControl {
    sessions: Arc<SessionStore>,
    progress: Arc<dyn ProgressRepo>,
    clock: Arc<dyn ClockPort>,
    driver: Arc<ClockDriver>,
}

impl TimeControl {
    pub fn new(
        sessions: Arc<SessionStore>,
        progress: Arc<dyn ProgressRepo>,
        clock: Arc<dyn ClockPort>,
        driver: Arc<ClockDriver>,
    ) -> Self {
        Self {
            sessions,
            progress,
            clock,
            driver,
        }
    }

    pub async fn pause(&self, key: &SessionKey) -> Result<ClockView, GameError> {
        let session = require_session(&self.sessions, key)?;
        let mut guard = session.lock().await;
        guard.clock.pause(self.clock.now());
        tracing::info!(session = %key, game_time = %guard.clock.game_time(), "Game time paused");
        Ok(guard.clock.view())
    }

    pub async fn resume(&self, key: &SessionKey) -> Result<ClockView, GameError> {
        let session = require_session(&self.sessions, key)?;
        let mut guard = session.lock().await;
        guard.clock.resume(self.clock.now());
        tracing::info!(session = %key, game_time = %guard.clock.game_time(), "Game time resumed");
        Ok(guard.clock.view())
    }

    pub async fn set_speed(&self, key: &SessionKey, speed: f64) -> Result<ClockView, GameError> {
        let session = require_session(&self.sessions, key)?;
        let mut guard = session.lock().await;
        guard.clock.set_speed(speed, self.clock.now())?;
        tracing::info!(session = %key, speed, "Game time speed changed");
        Ok(guard.clock.view())
    }

    /// Current clock state, ticked to now.
    pub async fn clock_state(&self, key: &SessionKey) -> Result<ClockView, GameError> {
        let session = require_session(&self.sessions, key)?;
        let mut guard = session.lock().await;
        guard.clock.tick(self.clock.now());
        Ok(guard.clock.view())
    }

    /// Start a timed analysis. It completes on a later tick once its
    /// duration of game time has passed.
    pub async fn start_analysis(
        &self,
        key: &SessionKey,
        evidence_id: &EvidenceId,
        analysis_type: &AnalysisType,
        duration_minutes: u32,
    ) -> Result<(GameProgress, AnalysisView), GameError> {
        let session = require_session(&self.sessions, key)?;
        let mut guard = session.lock().await;
        let session = &mut *guard;

        let now = self.clock.now();
        let case = Arc::clone(&session.case);
        let (outcome, analysis) = ActionProcessor::new(&case).start_analysis(
            &session.progress,
            &mut session.clock,
            evidence_id,
            analysis_type,
            duration_minutes,
            now,
        )?;
        tracing::info!(
            session = %key,
            analysis = %analysis.key(),
            duration_minutes,
            "Analysis started"
        );
        let view = analysis.view(session.clock.game_time());
        let progress = commit(self.progress.as_ref(), key, session, outcome).await?;
        Ok((progress, view))
    }

    /// Tick a session outside its driver's cadence.
    pub async fn tick_session(&self, key: &SessionKey) -> Result<Vec<TimedAnalysis>, GameError> {
        let session = require_session(&self.sessions, key)?;
        self.driver.tick(key, &session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::ManualClock;
    use crate::infrastructure::persistence::InMemoryProgressRepo;
    use crate::test_fixtures::{open_sample_session, t0, TestEngine};
    use casefile_domain::{AnalysisKey, DomainError};
    use chrono::Duration as ChronoDuration;

    fn engine() -> TestEngine {
        TestEngine::new(Arc::new(ManualClock::new(t0())))
    }

    #[tokio::test]
    async fn when_analysis_deadline_passes_then_it_completes_once() {
        let engine = engine();
        let key = open_sample_session(&engine).await;
        let glove = EvidenceId::from("torn_glove");
        let dna = AnalysisType::from("dna");

        engine.game.discover_evidence(&key, &glove, None).await.unwrap();
        let (_, analysis) = engine
            .time
            .start_analysis(&key, &glove, &dna, 60)
            .await
            .unwrap();

        engine.clock.advance(ChronoDuration::minutes(59));
        assert!(engine.time.tick_session(&key).await.unwrap().is_empty());

        engine.clock.advance(ChronoDuration::minutes(2));
        let completions = engine.time.tick_session(&key).await.unwrap();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].id(), analysis.id);
        assert_eq!(analysis.result, None);
        assert!(engine.time.tick_session(&key).await.unwrap().is_empty());

        let progress = engine.game.progress(&key).await.unwrap();
        assert!(progress.has_completed_analysis(&AnalysisKey::new(&dna, &glove)));

        let saved = engine
            .progress
            .load(&key.case_id, &key.player_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved, progress);
    }

    #[tokio::test]
    async fn when_paused_then_analyses_do_not_advance() {
        let engine = engine();
        let key = open_sample_session(&engine).await;
        let glove = EvidenceId::from("torn_glove");
        engine.game.discover_evidence(&key, &glove, None).await.unwrap();
        engine
            .time
            .start_analysis(&key, &glove, &AnalysisType::from("dna"), 10)
            .await
            .unwrap();

        let paused = engine.time.pause(&key).await.unwrap();
        engine.clock.advance(ChronoDuration::hours(1));
        assert!(engine.time.tick_session(&key).await.unwrap().is_empty());
        assert_eq!(engine.time.clock_state(&key).await.unwrap().game_time, paused.game_time);

        engine.time.resume(&key).await.unwrap();
        engine.clock.advance(ChronoDuration::minutes(11));
        assert_eq!(engine.time.tick_session(&key).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn when_speed_is_raised_then_analyses_finish_sooner() {
        let engine = engine();
        let key = open_sample_session(&engine).await;
        let glove = EvidenceId::from("torn_glove");
        engine.game.discover_evidence(&key, &glove, None).await.unwrap();

        engine.time.set_speed(&key, 60.0).await.unwrap();
        engine
            .time
            .start_analysis(&key, &glove, &AnalysisType::from("dna"), 60)
            .await
            .unwrap();

        engine.clock.advance(ChronoDuration::seconds(61));
        assert_eq!(engine.time.tick_session(&key).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn when_speed_is_invalid_then_domain_error() {
        let engine = engine();
        let key = open_sample_session(&engine).await;

        let result = engine.time.set_speed(&key, 0.0).await;
        assert!(matches!(result, Err(GameError::Domain(DomainError::Validation(_)))));
    }

    #[tokio::test]
    async fn when_session_unknown_then_session_not_found() {
        let engine = engine();
        let result = engine
            .time
            .pause(&SessionKey::new("gallery_heist", "ghost"))
            .await;
        assert!(matches!(result, Err(GameError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn when_cancelled_then_driver_task_finishes() {
        let clock = Arc::new(ManualClock::new(t0()));
        let driver = Arc::new(ClockDriver::new(
            Arc::new(InMemoryProgressRepo::new()),
            clock,
            Duration::from_millis(5),
        ));
        let case = Arc::new(crate::test_fixtures::sample_case());
        let progress = GameProgress::new(
            case.id().clone(),
            casefile_domain::PlayerId::from("detective"),
            t0(),
        );
        let session = Arc::new(tokio::sync::Mutex::new(GameSession::new(
            case,
            progress,
            casefile_domain::VirtualClock::new(t0(), t0()),
        )));
        let cancel = CancellationToken::new();

        let handle = driver.spawn(
            SessionKey::new("gallery_heist", "detective"),
            session,
            cancel.clone(),
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("driver should stop after cancellation")
            .unwrap();
    }

    // =========================================================================
    // Saving outside the session lock
    // =========================================================================

    /// Saves block until the test releases them.
    struct StalledSaves {
        entered: tokio::sync::Notify,
        release: tokio::sync::Semaphore,
    }

    #[async_trait::async_trait]
    impl ProgressRepo for StalledSaves {
        async fn load(
            &self,
            _case_id: &casefile_domain::CaseId,
            _player_id: &casefile_domain::PlayerId,
        ) -> Result<Option<GameProgress>, crate::infrastructure::ports::RepoError> {
            Ok(None)
        }

        async fn save(
            &self,
            _progress: &GameProgress,
        ) -> Result<(), crate::infrastructure::ports::RepoError> {
            self.entered.notify_one();
            let _permit = self
                .release
                .acquire()
                .await
                .map_err(|e| crate::infrastructure::ports::RepoError::io("save", e))?;
            Ok(())
        }

        async fn clear(
            &self,
            _case_id: &casefile_domain::CaseId,
            _player_id: &casefile_domain::PlayerId,
        ) -> Result<(), crate::infrastructure::ports::RepoError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn when_completion_is_being_saved_then_session_lock_is_free() {
        let clock = Arc::new(ManualClock::new(t0()));
        let repo = Arc::new(StalledSaves {
            entered: tokio::sync::Notify::new(),
            release: tokio::sync::Semaphore::new(0),
        });
        let driver = Arc::new(ClockDriver::new(
            repo.clone(),
            clock.clone(),
            Duration::from_secs(3600),
        ));

        let case = Arc::new(crate::test_fixtures::sample_case());
        let glove = EvidenceId::from("torn_glove");
        let dna = AnalysisType::from("dna");
        let processor = ActionProcessor::new(&case);
        let fresh = GameProgress::new(
            case.id().clone(),
            casefile_domain::PlayerId::from("detective"),
            t0(),
        );
        let discovered = processor
            .discover_evidence(&fresh, &glove, None, t0())
            .unwrap()
            .progress;
        let mut virtual_clock = casefile_domain::VirtualClock::new(t0(), t0());
        let (started, _) = processor
            .start_analysis(&discovered, &mut virtual_clock, &glove, &dna, 1, t0())
            .unwrap();
        let session = Arc::new(tokio::sync::Mutex::new(GameSession::new(
            Arc::clone(&case),
            started.progress,
            virtual_clock,
        )));
        clock.advance(ChronoDuration::minutes(2));

        let tick = tokio::spawn({
            let driver = Arc::clone(&driver);
            let session = Arc::clone(&session);
            async move {
                let key = SessionKey::new("gallery_heist", "detective");
                driver.tick(&key, &session).await
            }
        });
        repo.entered.notified().await;

        {
            let guard = session
                .try_lock()
                .expect("session lock should be free while saving");
            assert!(guard
                .progress
                .has_completed_analysis(&AnalysisKey::new(&dna, &glove)));
        }

        repo.release.add_permits(1);
        let completions = tick.await.unwrap().unwrap();
        assert_eq!(completions.len(), 1);
    }

    #[tokio::test]
    async fn when_analysis_starts_then_returned_view_hides_the_result() {
        let engine = engine();
        let key = open_sample_session(&engine).await;
        let glove = EvidenceId::from("torn_glove");
        engine.game.discover_evidence(&key, &glove, None).await.unwrap();

        let (_, analysis) = engine
            .time
            .start_analysis(&key, &glove, &AnalysisType::from("dna"), 60)
            .await
            .unwrap();
        assert!(!analysis.is_completed);
        assert_eq!(analysis.result, None);

        let state = engine.time.clock_state(&key).await.unwrap();
        let json = serde_json::to_value(&state).unwrap();
        let pending = &json["analyses"][0];
        assert_eq!(pending["isCompleted"], false);
        assert!(pending["result"].is_null());
        assert!(pending.get("pendingResult").is_none());
        assert!(!json.to_string().contains("pending_result"));
    }
}
