//! Accusations and their scored verdicts.

mod feedback;
mod scorer;
mod similarity;

pub use feedback::Feedback;
pub use scorer::{validate, OVERTIME_RATIO, SIMILARITY_THRESHOLD};
pub use similarity::{similarity, words};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::case::CaseDefinition;
use crate::ids::{EvidenceId, SuspectId};
use crate::progress::GameProgress;

/// The player's final claim about the case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accusation {
    pub suspect_id: SuspectId,
    pub motive: String,
    pub method: String,
    pub supporting_evidence: Vec<EvidenceId>,
    pub reasoning: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBonuses {
    pub time: u32,
    pub thoroughness: u32,
    pub analysis: u32,
}

impl ScoreBonuses {
    pub fn total(&self) -> i64 {
        i64::from(self.time) + i64::from(self.thoroughness) + i64::from(self.analysis)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorePenalties {
    pub hints: u32,
    pub overtime: u32,
    /// Deducted for analyses that came back incorrect.
    pub analysis: u32,
}

impl ScorePenalties {
    pub fn total(&self) -> i64 {
        i64::from(self.hints) + i64::from(self.overtime) + i64::from(self.analysis)
    }
}

/// The engine's verdict on an accusation. Computed, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccusationValidation {
    pub score: u32,
    pub max_score: u32,
    pub is_correct: bool,
    pub correct_culprit: bool,
    pub correct_motive: bool,
    pub correct_method: bool,
    pub motive_similarity: f64,
    pub method_similarity: f64,
    pub base_points: i64,
    pub evidence_score: u32,
    pub key_evidence_cited: usize,
    pub reasoning_score: u32,
    pub bonuses: ScoreBonuses,
    pub penalties: ScorePenalties,
    pub feedback: Feedback,
}

/// Whether an accusation may be submitted right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccusationEligibility {
    pub can_submit: bool,
    pub reason: Option<String>,
}

impl AccusationEligibility {
    fn allowed() -> Self {
        Self {
            can_submit: true,
            reason: None,
        }
    }

    fn refused(reason: impl Into<String>) -> Self {
        Self {
            can_submit: false,
            reason: Some(reason.into()),
        }
    }
}

/// Check the case's accusation rules against the progress.
pub fn eligibility(case: &CaseDefinition, progress: &GameProgress) -> AccusationEligibility {
    let rules = case.validation();

    if progress.is_completed() {
        return AccusationEligibility::refused("The case has already been solved");
    }
    if !rules.allow_multiple_accusations && progress.accusations_made() > 0 {
        return AccusationEligibility::refused("Only one accusation is allowed for this case");
    }

    let found = progress.evidence_discovered().len();
    let minimum = rules.minimum_evidence_to_accuse as usize;
    if found < minimum {
        return AccusationEligibility::refused(format!(
            "At least {} pieces of evidence are needed, {} found",
            minimum, found
        ));
    }

    let missing: Vec<&str> = rules
        .required_evidence
        .iter()
        .filter(|id| !progress.has_discovered(id))
        .map(|id| id.as_str())
        .collect();
    if !missing.is_empty() {
        return AccusationEligibility::refused(format!(
            "Required evidence not yet discovered: {}",
            missing.join(", ")
        ));
    }

    AccusationEligibility::allowed()
}
