//! Typed case definition.
//!
//! A `CaseDefinition` is produced once by [`super::parse`] and never mutated
//! afterwards. Everything a session needs to judge player actions (evidence,
//! suspects, the ground-truth solution, scoring tables and accusation rules)
//! lives here.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::dependency::CaseFile;
use crate::error::DomainError;
use crate::ids::{AnalysisKey, AnalysisType, CaseId, EvidenceId, FileId, LocationId, SuspectId};

// =============================================================================
// Metadata
// =============================================================================

/// Category of crime a case is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    Murder,
    Theft,
    Fraud,
    Kidnapping,
    Arson,
    Cybercrime,
    MissingPerson,
}

impl CaseType {
    pub const ALL: [CaseType; 7] = [
        CaseType::Murder,
        CaseType::Theft,
        CaseType::Fraud,
        CaseType::Kidnapping,
        CaseType::Arson,
        CaseType::Cybercrime,
        CaseType::MissingPerson,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseType::Murder => "murder",
            CaseType::Theft => "theft",
            CaseType::Fraud => "fraud",
            CaseType::Kidnapping => "kidnapping",
            CaseType::Arson => "arson",
            CaseType::Cybercrime => "cybercrime",
            CaseType::MissingPerson => "missing_person",
        }
    }
}

impl FromStr for CaseType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaseType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::parse(format!("Unknown case type: {}", s)))
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case difficulty, 1 (easiest) to 5 (hardest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Result<Self, DomainError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(DomainError::validation(format!(
                "Difficulty must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseMetadata {
    pub difficulty: Difficulty,
    pub estimated_time_minutes: u32,
    #[serde(rename = "type")]
    pub case_type: CaseType,
    pub tags: Vec<String>,
}

// =============================================================================
// Evidence, suspects, locations
// =============================================================================

/// How much a piece of evidence matters to the solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Low,
    Medium,
    High,
    Critical,
}

impl Importance {
    pub const ALL: [Importance; 4] = [
        Importance::Low,
        Importance::Medium,
        Importance::High,
        Importance::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Medium => "medium",
            Importance::High => "high",
            Importance::Critical => "critical",
        }
    }

    /// High and critical evidence count toward the thoroughness bonus.
    pub fn is_major(&self) -> bool {
        *self >= Importance::High
    }
}

impl FromStr for Importance {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Importance::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| DomainError::parse(format!("Unknown importance: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceDefinition {
    pub id: EvidenceId,
    pub name: String,
    pub description: String,
    pub location: Option<LocationId>,
    pub importance: Importance,
    pub points: u32,
    pub requires_analysis: bool,
    pub analysis_type: Option<AnalysisType>,
}

impl EvidenceDefinition {
    /// Whether running `analysis_type` on this evidence yields a meaningful result.
    pub fn is_correct_analysis(&self, analysis_type: &AnalysisType) -> bool {
        self.requires_analysis && self.analysis_type.as_ref() == Some(analysis_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspectDefinition {
    pub id: SuspectId,
    pub name: String,
    pub is_guilty: bool,
    pub motive: String,
    pub alibi: String,
    pub evidence_connections: Vec<EvidenceId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDefinition {
    pub id: LocationId,
    pub name: String,
    pub description: String,
}

// =============================================================================
// Solution and rules
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub culprit: SuspectId,
    pub motive: String,
    pub method: String,
    pub key_evidence: Vec<EvidenceId>,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccusationPoints {
    pub correct_culprit: u32,
    pub correct_motive: u32,
    pub correct_method: u32,
    /// Awarded instead of the above when the culprit is wrong; usually negative.
    pub incorrect_accusation: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPoints {
    pub correct: i64,
    pub incorrect: i64,
}

/// Speed bonus awarded when elapsed time / estimated time <= `max_time_ratio`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBonusTier {
    pub max_time_ratio: f64,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringRules {
    pub max_score: u32,
    pub accusation_points: AccusationPoints,
    pub analysis_points: AnalysisPoints,
    /// Sorted by ascending ratio; the first matching tier wins.
    pub time_bonus: Vec<TimeBonusTier>,
    pub thoroughness_bonus: u32,
    pub hints_used_penalty: u32,
    pub overtime_penalty: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredAnalysis {
    pub evidence_id: EvidenceId,
    pub analysis_type: AnalysisType,
}

impl RequiredAnalysis {
    pub fn key(&self) -> AnalysisKey {
        AnalysisKey::new(&self.analysis_type, &self.evidence_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    pub required_evidence: Vec<EvidenceId>,
    pub required_analyses: Vec<RequiredAnalysis>,
    pub minimum_evidence_to_accuse: u32,
    pub allow_multiple_accusations: bool,
    /// Carried from the document; no rule currently enforces it.
    pub accusation_cooldown_minutes: Option<u32>,
}

// =============================================================================
// Case definition
// =============================================================================

/// Immutable, validated description of a playable case.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseDefinition {
    pub(crate) id: CaseId,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) metadata: CaseMetadata,
    pub(crate) evidence: Vec<EvidenceDefinition>,
    pub(crate) suspects: Vec<SuspectDefinition>,
    pub(crate) locations: Vec<LocationDefinition>,
    pub(crate) files: Vec<CaseFile>,
    pub(crate) solution: Solution,
    pub(crate) scoring: ScoringRules,
    pub(crate) validation: ValidationRules,
}

impl CaseDefinition {
    #[inline]
    pub fn id(&self) -> &CaseId {
        &self.id
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    pub fn metadata(&self) -> &CaseMetadata {
        &self.metadata
    }

    #[inline]
    pub fn evidence(&self) -> &[EvidenceDefinition] {
        &self.evidence
    }

    #[inline]
    pub fn suspects(&self) -> &[SuspectDefinition] {
        &self.suspects
    }

    #[inline]
    pub fn locations(&self) -> &[LocationDefinition] {
        &self.locations
    }

    #[inline]
    pub fn files(&self) -> &[CaseFile] {
        &self.files
    }

    #[inline]
    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    #[inline]
    pub fn scoring(&self) -> &ScoringRules {
        &self.scoring
    }

    #[inline]
    pub fn validation(&self) -> &ValidationRules {
        &self.validation
    }

    pub fn find_evidence(&self, id: &EvidenceId) -> Option<&EvidenceDefinition> {
        self.evidence.iter().find(|e| &e.id == id)
    }

    pub fn find_suspect(&self, id: &SuspectId) -> Option<&SuspectDefinition> {
        self.suspects.iter().find(|s| &s.id == id)
    }

    pub fn find_location(&self, id: &LocationId) -> Option<&LocationDefinition> {
        self.locations.iter().find(|l| &l.id == id)
    }

    pub fn find_file(&self, id: &FileId) -> Option<&CaseFile> {
        self.files.iter().find(|f| &f.id == id)
    }

    pub fn is_key_evidence(&self, id: &EvidenceId) -> bool {
        self.solution.key_evidence.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_rejects_out_of_range() {
        assert!(Difficulty::new(0).is_err());
        assert!(Difficulty::new(6).is_err());
        assert_eq!(Difficulty::new(5).map(|d| d.value()), Ok(5));
    }

    #[test]
    fn case_type_parses_snake_case_names() {
        assert_eq!("missing_person".parse::<CaseType>(), Ok(CaseType::MissingPerson));
        assert!("heist".parse::<CaseType>().is_err());
    }

    #[test]
    fn importance_orders_by_severity() {
        assert!(Importance::Critical > Importance::High);
        assert!(Importance::High.is_major());
        assert!(!Importance::Medium.is_major());
    }

    #[test]
    fn correct_analysis_requires_matching_type() {
        let evidence = EvidenceDefinition {
            id: EvidenceId::from("torn_glove"),
            name: "Torn Glove".to_string(),
            description: String::new(),
            location: None,
            importance: Importance::High,
            points: 20,
            requires_analysis: true,
            analysis_type: Some(AnalysisType::from("dna")),
        };
        assert!(evidence.is_correct_analysis(&AnalysisType::from("dna")));
        assert!(!evidence.is_correct_analysis(&AnalysisType::from("fingerprint")));
    }
}
