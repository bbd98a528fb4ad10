//! Applies player intents to progress.
//!
//! Every operation takes the current progress by reference and returns a new
//! snapshot; the input is never touched. An operation either fails with a
//! [`DomainError`] (nothing changes), is a no-op (the snapshot equals the
//! input and no action is logged) or appends exactly one [`GameAction`].
//! Folding clock completions is the one operation that may log several.
//!
//! After each applied action, file dependencies the new progress fulfils are
//! promoted to `ok` for the session.

use chrono::{DateTime, Duration, Utc};

use crate::accusation::{self, Accusation, AccusationEligibility, AccusationValidation};
use crate::case::{CaseDefinition, EvidenceDefinition};
use crate::dependency::{self, CaseFile, DependencyKey};
use crate::error::DomainError;
use crate::ids::{AnalysisKey, AnalysisType, EvidenceId, LocationId, SuspectId};
use crate::progress::{
    ActionDetails, ActionType, AnalysisResult, CompletedAnalysis, GameAction, GameProgress,
    Milestone, ProgressStats,
};
use crate::virtual_clock::{TimedAnalysis, VirtualClock};

/// New progress snapshot plus what was logged and unlocked to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub progress: GameProgress,
    pub actions: Vec<GameAction>,
    pub unlocked: Vec<DependencyKey>,
}

impl ActionOutcome {
    fn unchanged(progress: &GameProgress) -> Self {
        Self {
            progress: progress.clone(),
            actions: Vec::new(),
            unlocked: Vec::new(),
        }
    }

    /// False for idempotent no-ops.
    pub fn is_applied(&self) -> bool {
        !self.actions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccusationOutcome {
    pub outcome: ActionOutcome,
    pub validation: AccusationValidation,
}

/// Rule engine for one case definition.
#[derive(Debug, Clone, Copy)]
pub struct ActionProcessor<'a> {
    case: &'a CaseDefinition,
}

impl<'a> ActionProcessor<'a> {
    pub fn new(case: &'a CaseDefinition) -> Self {
        Self { case }
    }

    #[inline]
    pub fn case(&self) -> &'a CaseDefinition {
        self.case
    }

    // =========================================================================
    // Player actions
    // =========================================================================

    pub fn discover_evidence(
        &self,
        progress: &GameProgress,
        evidence_id: &EvidenceId,
        location_id: Option<&LocationId>,
        now: DateTime<Utc>,
    ) -> Result<ActionOutcome, DomainError> {
        self.require_evidence(evidence_id)?;
        if let Some(location_id) = location_id {
            self.require_location(location_id)?;
        }
        if progress.has_discovered(evidence_id) {
            return Ok(ActionOutcome::unchanged(progress));
        }

        let mut next = progress.clone();
        next.add_evidence(evidence_id.clone());
        Ok(self.commit(
            next,
            vec![GameAction::new(
                now,
                ActionDetails::EvidenceDiscovered {
                    evidence_id: evidence_id.clone(),
                    location_id: location_id.cloned(),
                },
            )],
        ))
    }

    pub fn complete_analysis(
        &self,
        progress: &GameProgress,
        analysis_type: &AnalysisType,
        evidence_id: &EvidenceId,
        result: AnalysisResult,
        now: DateTime<Utc>,
    ) -> Result<ActionOutcome, DomainError> {
        self.require_evidence(evidence_id)?;
        if progress.has_completed_analysis(&AnalysisKey::new(analysis_type, evidence_id)) {
            return Ok(ActionOutcome::unchanged(progress));
        }

        let mut next = progress.clone();
        let action = apply_completion(&mut next, analysis_type, evidence_id, result, now);
        Ok(self.commit(next, vec![action]))
    }

    /// Schedule a timed analysis on `clock` and log its start.
    ///
    /// The result is decided now and revealed when the clock completes it:
    /// correct iff the evidence needs analysis and the type is the right one.
    pub fn start_analysis(
        &self,
        progress: &GameProgress,
        clock: &mut VirtualClock,
        evidence_id: &EvidenceId,
        analysis_type: &AnalysisType,
        duration_minutes: u32,
        now: DateTime<Utc>,
    ) -> Result<(ActionOutcome, TimedAnalysis), DomainError> {
        let evidence = self.require_evidence(evidence_id)?;
        if !progress.has_discovered(evidence_id) {
            return Err(DomainError::constraint(format!(
                "Evidence {} has not been discovered yet",
                evidence_id
            )));
        }
        if duration_minutes == 0 {
            return Err(DomainError::validation("Analysis duration must be positive"));
        }
        let key = AnalysisKey::new(analysis_type, evidence_id);
        if progress.has_completed_analysis(&key) {
            return Err(DomainError::constraint(format!(
                "Analysis {} is already completed",
                key
            )));
        }
        if clock.is_pending(&key) {
            return Err(DomainError::constraint(format!(
                "Analysis {} is already running",
                key
            )));
        }

        let result = if evidence.is_correct_analysis(analysis_type) {
            AnalysisResult::Correct
        } else {
            AnalysisResult::Incorrect
        };
        clock.tick(now);
        let analysis = clock.schedule_analysis(
            evidence_id.clone(),
            analysis_type.clone(),
            Duration::minutes(i64::from(duration_minutes)),
            result,
        )?;

        let outcome = self.commit(
            progress.clone(),
            vec![GameAction::new(
                now,
                ActionDetails::AnalysisStarted {
                    analysis_id: analysis.id(),
                    evidence_id: evidence_id.clone(),
                    analysis_type: analysis_type.clone(),
                    duration_minutes,
                },
            )],
        );
        Ok((outcome, analysis))
    }

    /// Record analyses the clock reported as completed.
    ///
    /// Completions for keys already present are skipped.
    pub fn fold_completions(
        &self,
        progress: &GameProgress,
        completions: &[TimedAnalysis],
        now: DateTime<Utc>,
    ) -> ActionOutcome {
        let mut next = progress.clone();
        let mut actions = Vec::new();

        for analysis in completions {
            let Some(result) = analysis.result() else {
                continue;
            };
            if next.has_completed_analysis(&analysis.key()) {
                continue;
            }
            actions.push(apply_completion(
                &mut next,
                analysis.analysis_type(),
                analysis.evidence_id(),
                result,
                now,
            ));
        }

        if actions.is_empty() {
            return ActionOutcome::unchanged(progress);
        }
        self.commit(next, actions)
    }

    pub fn use_hint(&self, progress: &GameProgress, hint_type: &str, now: DateTime<Utc>) -> ActionOutcome {
        let mut next = progress.clone();
        next.increment_hints();
        self.commit(
            next,
            vec![GameAction::new(
                now,
                ActionDetails::HintUsed {
                    hint_type: hint_type.to_string(),
                },
            )],
        )
    }

    pub fn conduct_interview(
        &self,
        progress: &GameProgress,
        suspect_id: &SuspectId,
        question_ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<ActionOutcome, DomainError> {
        if self.case.find_suspect(suspect_id).is_none() {
            return Err(DomainError::not_found("Suspect", suspect_id.as_str()));
        }

        let mut next = progress.clone();
        let new_questions = next.record_interview(suspect_id.clone(), question_ids, now);
        Ok(self.commit(
            next,
            vec![GameAction::new(
                now,
                ActionDetails::InterviewConducted {
                    suspect_id: suspect_id.clone(),
                    question_ids: question_ids.to_vec(),
                    new_questions,
                },
            )],
        ))
    }

    pub fn visit_location(
        &self,
        progress: &GameProgress,
        location_id: &LocationId,
        now: DateTime<Utc>,
    ) -> Result<ActionOutcome, DomainError> {
        self.require_location(location_id)?;
        if progress.locations().contains(location_id) {
            return Ok(ActionOutcome::unchanged(progress));
        }

        let mut next = progress.clone();
        next.add_location(location_id.clone());
        Ok(self.commit(
            next,
            vec![GameAction::new(
                now,
                ActionDetails::LocationVisited {
                    location_id: location_id.clone(),
                },
            )],
        ))
    }

    // =========================================================================
    // Accusation
    // =========================================================================

    pub fn can_submit_accusation(&self, progress: &GameProgress) -> AccusationEligibility {
        accusation::eligibility(self.case, progress)
    }

    /// Score the accusation and apply the verdict.
    ///
    /// `accusations_made` grows whether or not the accusation is correct; a
    /// fully correct one completes the case and freezes the final score.
    pub fn submit_accusation(
        &self,
        progress: &GameProgress,
        accusation: &Accusation,
    ) -> Result<AccusationOutcome, DomainError> {
        let eligibility = self.can_submit_accusation(progress);
        if !eligibility.can_submit {
            return Err(DomainError::constraint(
                eligibility
                    .reason
                    .unwrap_or_else(|| "Accusation not allowed".to_string()),
            ));
        }
        let validation = accusation::validate(accusation, self.case, progress)?;

        let mut next = progress.clone();
        next.increment_accusations();
        next.set_score(validation.score);
        if validation.is_correct {
            next.complete(validation.score, accusation.submitted_at)?;
        }

        let outcome = self.commit(
            next,
            vec![GameAction::new(
                accusation.submitted_at,
                ActionDetails::AccusationSubmitted {
                    suspect_id: accusation.suspect_id.clone(),
                    is_correct: validation.is_correct,
                    score: validation.score,
                },
            )],
        );
        Ok(AccusationOutcome {
            outcome,
            validation,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn stats(&self, progress: &GameProgress, now: DateTime<Utc>) -> ProgressStats {
        ProgressStats::compute(self.case, progress, now)
    }

    /// Chronological actions, optionally of one type, keeping the most
    /// recent `limit`.
    pub fn action_history<'p>(
        &self,
        progress: &'p GameProgress,
        action_type: Option<ActionType>,
        limit: Option<usize>,
    ) -> Vec<&'p GameAction> {
        let matching: Vec<&GameAction> = progress
            .actions()
            .iter()
            .filter(|a| action_type.map_or(true, |t| a.action_type() == t))
            .collect();
        match limit {
            Some(limit) if limit < matching.len() => matching[matching.len() - limit..].to_vec(),
            _ => matching,
        }
    }

    pub fn milestones(&self, progress: &GameProgress) -> Vec<Milestone> {
        Milestone::reached(self.case, progress)
    }

    pub fn accessible_files(&self, progress: &GameProgress) -> Vec<CaseFile> {
        dependency::accessible_files(self.case, progress)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn require_evidence(
        &self,
        evidence_id: &EvidenceId,
    ) -> Result<&'a EvidenceDefinition, DomainError> {
        self.case
            .find_evidence(evidence_id)
            .ok_or_else(|| DomainError::not_found("Evidence", evidence_id.as_str()))
    }

    /// Locations are only checked when the case lists them.
    fn require_location(&self, location_id: &LocationId) -> Result<(), DomainError> {
        if self.case.locations().is_empty() || self.case.find_location(location_id).is_some() {
            Ok(())
        } else {
            Err(DomainError::not_found("Location", location_id.as_str()))
        }
    }

    fn commit(&self, mut next: GameProgress, actions: Vec<GameAction>) -> ActionOutcome {
        for action in &actions {
            next.push_action(action.clone());
        }
        let unlocked = dependency::newly_satisfied(self.case, &next);
        for key in &unlocked {
            next.unlock_dependency(key.clone());
        }
        ActionOutcome {
            progress: next,
            actions,
            unlocked,
        }
    }
}

fn apply_completion(
    progress: &mut GameProgress,
    analysis_type: &AnalysisType,
    evidence_id: &EvidenceId,
    result: AnalysisResult,
    now: DateTime<Utc>,
) -> GameAction {
    progress.add_analysis(CompletedAnalysis {
        evidence_id: evidence_id.clone(),
        analysis_type: analysis_type.clone(),
        result,
        completed_at: now,
    });
    GameAction::new(
        now,
        ActionDetails::AnalysisCompleted {
            evidence_id: evidence_id.clone(),
            analysis_type: analysis_type.clone(),
            result,
        },
    )
}
