//! Append-only audit trail of player actions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{ActionId, AnalysisId, AnalysisType, EvidenceId, LocationId, SuspectId};

/// Outcome of a forensic analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisResult {
    Correct,
    Incorrect,
}

impl AnalysisResult {
    pub fn is_correct(&self) -> bool {
        matches!(self, AnalysisResult::Correct)
    }
}

/// Kind of a logged action, used for filtering the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    EvidenceDiscovered,
    AnalysisStarted,
    AnalysisCompleted,
    HintUsed,
    InterviewConducted,
    LocationVisited,
    AccusationSubmitted,
}

impl ActionType {
    pub const ALL: [ActionType; 7] = [
        ActionType::EvidenceDiscovered,
        ActionType::AnalysisStarted,
        ActionType::AnalysisCompleted,
        ActionType::HintUsed,
        ActionType::InterviewConducted,
        ActionType::LocationVisited,
        ActionType::AccusationSubmitted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::EvidenceDiscovered => "evidence_discovered",
            ActionType::AnalysisStarted => "analysis_started",
            ActionType::AnalysisCompleted => "analysis_completed",
            ActionType::HintUsed => "hint_used",
            ActionType::InterviewConducted => "interview_conducted",
            ActionType::LocationVisited => "location_visited",
            ActionType::AccusationSubmitted => "accusation_submitted",
        }
    }
}

impl FromStr for ActionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::parse(format!("Unknown action type: {}", s)))
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened, with the data the scorer and statistics need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ActionDetails {
    EvidenceDiscovered {
        evidence_id: EvidenceId,
        location_id: Option<LocationId>,
    },
    AnalysisStarted {
        analysis_id: AnalysisId,
        evidence_id: EvidenceId,
        analysis_type: AnalysisType,
        duration_minutes: u32,
    },
    AnalysisCompleted {
        evidence_id: EvidenceId,
        analysis_type: AnalysisType,
        result: AnalysisResult,
    },
    HintUsed {
        hint_type: String,
    },
    InterviewConducted {
        suspect_id: SuspectId,
        question_ids: Vec<String>,
        new_questions: u32,
    },
    LocationVisited {
        location_id: LocationId,
    },
    AccusationSubmitted {
        suspect_id: SuspectId,
        is_correct: bool,
        score: u32,
    },
}

impl ActionDetails {
    pub fn action_type(&self) -> ActionType {
        match self {
            ActionDetails::EvidenceDiscovered { .. } => ActionType::EvidenceDiscovered,
            ActionDetails::AnalysisStarted { .. } => ActionType::AnalysisStarted,
            ActionDetails::AnalysisCompleted { .. } => ActionType::AnalysisCompleted,
            ActionDetails::HintUsed { .. } => ActionType::HintUsed,
            ActionDetails::InterviewConducted { .. } => ActionType::InterviewConducted,
            ActionDetails::LocationVisited { .. } => ActionType::LocationVisited,
            ActionDetails::AccusationSubmitted { .. } => ActionType::AccusationSubmitted,
        }
    }
}

/// An immutable entry of the action log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAction {
    id: ActionId,
    timestamp: DateTime<Utc>,
    details: ActionDetails,
}

impl GameAction {
    pub fn new(timestamp: DateTime<Utc>, details: ActionDetails) -> Self {
        Self {
            id: ActionId::new(),
            timestamp,
            details,
        }
    }

    #[inline]
    pub fn id(&self) -> ActionId {
        self.id
    }

    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[inline]
    pub fn details(&self) -> &ActionDetails {
        &self.details
    }

    pub fn action_type(&self) -> ActionType {
        self.details.action_type()
    }
}
