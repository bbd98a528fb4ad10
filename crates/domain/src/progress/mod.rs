//! Per-player investigation state.
//!
//! # Invariants
//!
//! - Discovered evidence, completed analyses, interviewed questions, visited
//!   locations and unlocked dependencies only ever grow.
//! - `hints_used` and `accusations_made` only ever increase.
//! - `actions` is append-only.
//! - `is_completed` / `final_score` are set exactly once.
//!
//! Fields are private; mutation goes through the crate-internal methods used
//! by the [`crate::processor::ActionProcessor`], which works on a clone and
//! hands back the new snapshot.

mod action;
mod stats;

pub use action::{ActionDetails, ActionType, AnalysisResult, GameAction};
pub use stats::{Milestone, ProgressStats};

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dependency::DependencyKey;
use crate::error::DomainError;
use crate::ids::{AnalysisKey, AnalysisType, CaseId, EvidenceId, LocationId, PlayerId, SuspectId};

/// A finished analysis, keyed by `<type>_<evidenceId>` on the progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedAnalysis {
    pub evidence_id: EvidenceId,
    pub analysis_type: AnalysisType,
    pub result: AnalysisResult,
    pub completed_at: DateTime<Utc>,
}

/// Questions asked to one suspect so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRecord {
    pub questions_asked: BTreeSet<String>,
    pub interview_count: u32,
    pub last_interviewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameProgress {
    case_id: CaseId,
    player_id: PlayerId,
    started_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    evidence_discovered: BTreeSet<EvidenceId>,
    analyses_completed: BTreeMap<AnalysisKey, CompletedAnalysis>,
    suspect_interviews: BTreeMap<SuspectId, InterviewRecord>,
    locations: BTreeSet<LocationId>,
    #[serde(default)]
    unlocked_dependencies: BTreeSet<DependencyKey>,
    hints_used: u32,
    accusations_made: u32,
    score: u32,
    is_completed: bool,
    final_score: Option<u32>,
    completed_at: Option<DateTime<Utc>>,
    actions: Vec<GameAction>,
}

impl GameProgress {
    // =========================================================================
    // Constructor
    // =========================================================================

    /// Fresh progress: all counters zero, all sets empty, not completed.
    pub fn new(case_id: CaseId, player_id: PlayerId, now: DateTime<Utc>) -> Self {
        Self {
            case_id,
            player_id,
            started_at: now,
            last_updated: now,
            evidence_discovered: BTreeSet::new(),
            analyses_completed: BTreeMap::new(),
            suspect_interviews: BTreeMap::new(),
            locations: BTreeSet::new(),
            unlocked_dependencies: BTreeSet::new(),
            hints_used: 0,
            accusations_made: 0,
            score: 0,
            is_completed: false,
            final_score: None,
            completed_at: None,
            actions: Vec::new(),
        }
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Encode as JSON; timestamps are ISO-8601 strings.
    pub fn to_json(&self) -> Result<String, DomainError> {
        serde_json::to_string(self).map_err(|e| DomainError::parse(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        serde_json::from_str(json).map_err(|e| DomainError::parse(e.to_string()))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn case_id(&self) -> &CaseId {
        &self.case_id
    }

    #[inline]
    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    #[inline]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[inline]
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    #[inline]
    pub fn evidence_discovered(&self) -> &BTreeSet<EvidenceId> {
        &self.evidence_discovered
    }

    #[inline]
    pub fn analyses_completed(&self) -> &BTreeMap<AnalysisKey, CompletedAnalysis> {
        &self.analyses_completed
    }

    #[inline]
    pub fn suspect_interviews(&self) -> &BTreeMap<SuspectId, InterviewRecord> {
        &self.suspect_interviews
    }

    #[inline]
    pub fn locations(&self) -> &BTreeSet<LocationId> {
        &self.locations
    }

    #[inline]
    pub fn unlocked_dependencies(&self) -> &BTreeSet<DependencyKey> {
        &self.unlocked_dependencies
    }

    #[inline]
    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    #[inline]
    pub fn accusations_made(&self) -> u32 {
        self.accusations_made
    }

    #[inline]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[inline]
    pub fn final_score(&self) -> Option<u32> {
        self.final_score
    }

    #[inline]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[inline]
    pub fn actions(&self) -> &[GameAction] {
        &self.actions
    }

    pub fn has_discovered(&self, evidence_id: &EvidenceId) -> bool {
        self.evidence_discovered.contains(evidence_id)
    }

    pub fn has_completed_analysis(&self, key: &AnalysisKey) -> bool {
        self.analyses_completed.contains_key(key)
    }

    pub fn correct_analyses(&self) -> usize {
        self.analyses_completed
            .values()
            .filter(|a| a.result.is_correct())
            .count()
    }

    // =========================================================================
    // Mutation (crate-internal, monotonic)
    // =========================================================================

    /// Returns false if the evidence was already discovered.
    pub(crate) fn add_evidence(&mut self, evidence_id: EvidenceId) -> bool {
        self.evidence_discovered.insert(evidence_id)
    }

    /// Returns false if the analysis key was already present.
    pub(crate) fn add_analysis(&mut self, analysis: CompletedAnalysis) -> bool {
        let key = AnalysisKey::new(&analysis.analysis_type, &analysis.evidence_id);
        if self.analyses_completed.contains_key(&key) {
            return false;
        }
        self.analyses_completed.insert(key, analysis);
        true
    }

    /// Merge questions into the suspect's record and count the interview.
    /// Returns how many of the questions were new.
    pub(crate) fn record_interview(
        &mut self,
        suspect_id: SuspectId,
        question_ids: &[String],
        now: DateTime<Utc>,
    ) -> u32 {
        let record = self
            .suspect_interviews
            .entry(suspect_id)
            .or_insert_with(|| InterviewRecord {
                questions_asked: BTreeSet::new(),
                interview_count: 0,
                last_interviewed_at: now,
            });
        let new_questions = question_ids
            .iter()
            .filter(|q| record.questions_asked.insert((*q).clone()))
            .count();
        record.interview_count = record.interview_count.saturating_add(1);
        record.last_interviewed_at = now;
        saturating_u32(new_questions)
    }

    /// Returns false if the location was already visited.
    pub(crate) fn add_location(&mut self, location_id: LocationId) -> bool {
        self.locations.insert(location_id)
    }

    /// Record a dependency as `ok` for this session.
    pub(crate) fn unlock_dependency(&mut self, key: DependencyKey) -> bool {
        self.unlocked_dependencies.insert(key)
    }

    pub(crate) fn increment_hints(&mut self) {
        self.hints_used = self.hints_used.saturating_add(1);
    }

    pub(crate) fn increment_accusations(&mut self) {
        self.accusations_made = self.accusations_made.saturating_add(1);
    }

    pub(crate) fn set_score(&mut self, score: u32) {
        self.score = score;
    }

    /// Freeze the final score. Fails if the case was already completed.
    pub(crate) fn complete(&mut self, final_score: u32, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.is_completed {
            return Err(DomainError::invalid_state_transition(
                "case progress is already completed",
            ));
        }
        self.is_completed = true;
        self.final_score = Some(final_score);
        self.completed_at = Some(now);
        Ok(())
    }

    pub(crate) fn push_action(&mut self, action: GameAction) {
        self.last_updated = action.timestamp();
        self.actions.push(action);
    }
}

fn saturating_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
