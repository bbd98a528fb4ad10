//! Investigation use cases.
//!
//! Session lifecycle (open, reset, close), the player actions of a case and
//! the read-only progress queries.

use std::sync::Arc;

use casefile_domain::{
    Accusation, AccusationEligibility, AccusationValidation, ActionOutcome, ActionProcessor,
    ActionType, AnalysisResult, AnalysisType, CaseDefinition, CaseFile, CaseId, DomainError, EvidenceId,
    GameAction, GameProgress, LocationId, Milestone, PlayerId, ProgressStats, SuspectId,
    VirtualClock,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{commit, require_session, save, ClockDriver, GameError};
use crate::infrastructure::ports::{CaseRepo, ClockPort, ProgressRepo};
use crate::stores::{GameSession, SessionKey, SessionStore};

/// An accusation as the player writes it; the engine stamps the time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccusationDraft {
    pub suspect_id: SuspectId,
    pub motive: String,
    pub method: String,
    pub supporting_evidence: Vec<EvidenceId>,
    pub reasoning: String,
}

impl AccusationDraft {
    pub fn submitted_at(self, now: DateTime<Utc>) -> Accusation {
        Accusation {
            suspect_id: self.suspect_id,
            motive: self.motive,
            method: self.method,
            supporting_evidence: self.supporting_evidence,
            reasoning: self.reasoning,
            submitted_at: now,
        }
    }
}

/// Orchestrates player actions against open sessions.
pub struct GameManager {
    sessions: Arc<SessionStore>,
    cases: Arc<dyn CaseRepo>,
    progress: Arc<dyn ProgressRepo>,
    clock: Arc<dyn ClockPort>,
    driver: Arc<ClockDriver>,
    time_speed: f64,
}

impl GameManager {
    pub fn new(
        sessions: Arc<SessionStore>,
        cases: Arc<dyn CaseRepo>,
        progress: Arc<dyn ProgressRepo>,
        clock: Arc<dyn ClockPort>,
        driver: Arc<ClockDriver>,
        time_speed: f64,
    ) -> Self {
        Self {
            sessions,
            cases,
            progress,
            clock,
            driver,
            time_speed,
        }
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Load the case, restore or create the player's progress, start a game
    /// clock and its driver.
    pub async fn open_session(
        &self,
        case_id: CaseId,
        player_id: PlayerId,
    ) -> Result<GameProgress, GameError> {
        let key = SessionKey { case_id, player_id };
        if self.sessions.contains(&key) {
            return Err(GameError::SessionAlreadyOpen(key));
        }

        let case = match self.cases.load(&key.case_id).await {
            Ok(case) => Arc::new(case),
            Err(e) if e.is_not_found() => return Err(GameError::CaseNotFound(key.case_id)),
            Err(e) => return Err(e.into()),
        };

        let now = self.clock.now();
        let progress = match self.progress.load(&key.case_id, &key.player_id).await? {
            Some(saved) => {
                tracing::info!(
                    session = %key,
                    evidence = saved.evidence_discovered().len(),
                    actions = saved.actions().len(),
                    "Resuming saved progress"
                );
                saved
            }
            None => GameProgress::new(key.case_id.clone(), key.player_id.clone(), now),
        };
        let clock = VirtualClock::with_speed(now, self.time_speed, now)?;

        let session = GameSession::new(case, progress.clone(), clock);
        let cancel = session.cancel.clone();
        let Some(shared) = self.sessions.insert(key.clone(), session) else {
            return Err(GameError::SessionAlreadyOpen(key));
        };
        self.driver.spawn(key.clone(), shared, cancel);

        tracing::info!(session = %key, "Session opened");
        Ok(progress)
    }

    /// Discard the player's progress and start the case over.
    pub async fn reset_session(&self, key: &SessionKey) -> Result<GameProgress, GameError> {
        let session = require_session(&self.sessions, key)?;
        let mut guard = session.lock().await;

        {
            let _gate = guard.save_gate.clone().lock_owned().await;
            self.progress.clear(&key.case_id, &key.player_id).await?;
        }
        let now = self.clock.now();
        let speed = guard.clock.time_speed();
        guard.progress = GameProgress::new(key.case_id.clone(), key.player_id.clone(), now);
        guard.clock = VirtualClock::with_speed(now, speed, now)?;

        tracing::info!(session = %key, "Session reset");
        Ok(guard.progress.clone())
    }

    /// Stop the clock driver, save and forget the session.
    ///
    /// Analyses still running are dropped with the clock.
    pub async fn close_session(&self, key: &SessionKey) -> Result<GameProgress, GameError> {
        let session = self
            .sessions
            .remove(key)
            .ok_or_else(|| GameError::SessionNotFound(key.clone()))?;
        let guard = session.lock().await;
        guard.cancel.cancel();

        let pending = guard.clock.pending_analyses().count();
        if pending > 0 {
            tracing::warn!(session = %key, pending, "Closing session with analyses still running");
        }
        {
            let _gate = guard.save_gate.clone().lock_owned().await;
            save(self.progress.as_ref(), key, &guard.progress).await?;
        }

        tracing::info!(session = %key, "Session closed");
        Ok(guard.progress.clone())
    }

    /// Close every open session, logging failures.
    pub async fn close_all(&self) {
        for key in self.sessions.keys() {
            if let Err(e) = self.close_session(&key).await {
                tracing::warn!(session = %key, error = %e, "Failed to close session");
            }
        }
    }

    // =========================================================================
    // Player actions
    // =========================================================================

    pub async fn discover_evidence(
        &self,
        key: &SessionKey,
        evidence_id: &EvidenceId,
        location_id: Option<&LocationId>,
    ) -> Result<GameProgress, GameError> {
        self.apply(key, |processor, progress, now| {
            processor.discover_evidence(progress, evidence_id, location_id, now)
        })
        .await
    }

    pub async fn complete_analysis(
        &self,
        key: &SessionKey,
        analysis_type: &AnalysisType,
        evidence_id: &EvidenceId,
        result: AnalysisResult,
    ) -> Result<GameProgress, GameError> {
        self.apply(key, |processor, progress, now| {
            processor.complete_analysis(progress, analysis_type, evidence_id, result, now)
        })
        .await
    }

    pub async fn use_hint(&self, key: &SessionKey, hint_type: &str) -> Result<GameProgress, GameError> {
        self.apply(key, |processor, progress, now| {
            Ok(processor.use_hint(progress, hint_type, now))
        })
        .await
    }

    pub async fn conduct_interview(
        &self,
        key: &SessionKey,
        suspect_id: &SuspectId,
        question_ids: &[String],
    ) -> Result<GameProgress, GameError> {
        self.apply(key, |processor, progress, now| {
            processor.conduct_interview(progress, suspect_id, question_ids, now)
        })
        .await
    }

    pub async fn visit_location(
        &self,
        key: &SessionKey,
        location_id: &LocationId,
    ) -> Result<GameProgress, GameError> {
        self.apply(key, |processor, progress, now| {
            processor.visit_location(progress, location_id, now)
        })
        .await
    }

    // =========================================================================
    // Accusation
    // =========================================================================

    pub async fn can_submit_accusation(
        &self,
        key: &SessionKey,
    ) -> Result<AccusationEligibility, GameError> {
        self.read(key, |processor, progress| processor.can_submit_accusation(progress))
            .await
    }

    pub async fn submit_accusation(
        &self,
        key: &SessionKey,
        draft: AccusationDraft,
    ) -> Result<AccusationValidation, GameError> {
        let session = require_session(&self.sessions, key)?;
        let mut guard = session.lock().await;
        let session = &mut *guard;

        let accusation = draft.submitted_at(self.clock.now());
        let case = Arc::clone(&session.case);
        let result = ActionProcessor::new(&case)
            .submit_accusation(&session.progress, &accusation)
            .inspect_err(|e| {
                tracing::warn!(session = %key, error = %e, "Accusation rejected");
            })?;

        let validation = result.validation;
        tracing::info!(
            session = %key,
            suspect = %accusation.suspect_id,
            correct = validation.is_correct,
            score = validation.score,
            "Accusation submitted"
        );
        commit(self.progress.as_ref(), key, session, result.outcome).await?;
        Ok(validation)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The case definition the session plays.
    pub async fn case(&self, key: &SessionKey) -> Result<Arc<CaseDefinition>, GameError> {
        let session = require_session(&self.sessions, key)?;
        let case = Arc::clone(&session.lock().await.case);
        Ok(case)
    }

    pub async fn progress(&self, key: &SessionKey) -> Result<GameProgress, GameError> {
        self.read(key, |_, progress| progress.clone()).await
    }

    pub async fn stats(&self, key: &SessionKey) -> Result<ProgressStats, GameError> {
        let now = self.clock.now();
        self.read(key, |processor, progress| processor.stats(progress, now))
            .await
    }

    pub async fn action_history(
        &self,
        key: &SessionKey,
        action_type: Option<ActionType>,
        limit: Option<usize>,
    ) -> Result<Vec<GameAction>, GameError> {
        self.read(key, |processor, progress| {
            processor
                .action_history(progress, action_type, limit)
                .into_iter()
                .cloned()
                .collect()
        })
        .await
    }

    pub async fn milestones(&self, key: &SessionKey) -> Result<Vec<Milestone>, GameError> {
        self.read(key, |processor, progress| processor.milestones(progress))
            .await
    }

    pub async fn accessible_files(&self, key: &SessionKey) -> Result<Vec<CaseFile>, GameError> {
        self.read(key, |processor, progress| processor.accessible_files(progress))
            .await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn apply<F>(&self, key: &SessionKey, action: F) -> Result<GameProgress, GameError>
    where
        F: FnOnce(&ActionProcessor<'_>, &GameProgress, DateTime<Utc>) -> Result<ActionOutcome, DomainError>,
    {
        let session = require_session(&self.sessions, key)?;
        let mut guard = session.lock().await;
        let session = &mut *guard;

        let now = self.clock.now();
        let case = Arc::clone(&session.case);
        let outcome = action(&ActionProcessor::new(&case), &session.progress, now).inspect_err(|e| {
            tracing::warn!(session = %key, error = %e, "Action rejected");
        })?;
        commit(self.progress.as_ref(), key, session, outcome).await
    }

    async fn read<T, F>(&self, key: &SessionKey, query: F) -> Result<T, GameError>
    where
        F: FnOnce(&ActionProcessor<'_>, &GameProgress) -> T,
    {
        let session = require_session(&self.sessions, key)?;
        let guard = session.lock().await;
        Ok(query(&ActionProcessor::new(&guard.case), &guard.progress))
    }
}
