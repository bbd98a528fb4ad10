//! Derived views over progress: statistics and milestones.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::GameProgress;
use crate::accusation;
use crate::case::CaseDefinition;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub evidence_found: usize,
    pub total_evidence: usize,
    pub evidence_percent: u32,
    pub analyses_completed: usize,
    pub suspects_interviewed: usize,
    pub total_suspects: usize,
    pub locations_visited: usize,
    pub hints_used: u32,
    pub accusations_made: u32,
    pub actions_taken: usize,
    pub current_score: u32,
    pub elapsed_minutes: i64,
    pub is_completed: bool,
}

impl ProgressStats {
    pub fn compute(case: &CaseDefinition, progress: &GameProgress, now: DateTime<Utc>) -> Self {
        let total_evidence = case.evidence().len();
        let evidence_found = progress.evidence_discovered().len();
        let end = progress.completed_at().unwrap_or(now);

        Self {
            evidence_found,
            total_evidence,
            evidence_percent: percent(evidence_found, total_evidence),
            analyses_completed: progress.analyses_completed().len(),
            suspects_interviewed: progress.suspect_interviews().len(),
            total_suspects: case.suspects().len(),
            locations_visited: progress.locations().len(),
            hints_used: progress.hints_used(),
            accusations_made: progress.accusations_made(),
            actions_taken: progress.actions().len(),
            current_score: progress.final_score().unwrap_or(progress.score()),
            elapsed_minutes: (end - progress.started_at()).num_minutes().max(0),
            is_completed: progress.is_completed(),
        }
    }
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part * 100) / total) as u32
}

/// Investigation checkpoints a UI can celebrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    FirstEvidence,
    HalfEvidence,
    AllEvidence,
    FirstAnalysis,
    AllSuspectsInterviewed,
    ReadyToAccuse,
    CaseSolved,
}

impl Milestone {
    /// Milestones the progress has reached, in checklist order.
    pub fn reached(case: &CaseDefinition, progress: &GameProgress) -> Vec<Milestone> {
        let found = progress.evidence_discovered().len();
        let total = case.evidence().len();
        let mut reached = Vec::new();

        if found >= 1 {
            reached.push(Milestone::FirstEvidence);
        }
        if total > 0 && found * 2 >= total {
            reached.push(Milestone::HalfEvidence);
        }
        if total > 0 && case.evidence().iter().all(|e| progress.has_discovered(&e.id)) {
            reached.push(Milestone::AllEvidence);
        }
        if !progress.analyses_completed().is_empty() {
            reached.push(Milestone::FirstAnalysis);
        }
        if !case.suspects().is_empty()
            && case
                .suspects()
                .iter()
                .all(|s| progress.suspect_interviews().contains_key(&s.id))
        {
            reached.push(Milestone::AllSuspectsInterviewed);
        }
        if accusation::eligibility(case, progress).can_submit {
            reached.push(Milestone::ReadyToAccuse);
        }
        if progress.is_completed() {
            reached.push(Milestone::CaseSolved);
        }
        reached
    }
}
