//! Case file dependency graph.
//!
//! A case file (a report, a roster, a lab result) is locked behind a list of
//! prerequisite actions. Each prerequisite carries a status that only ever
//! moves from `pending` to `ok`. A file is accessible once every prerequisite
//! is `ok`.
//!
//! Statuses authored in the case document are the starting point; per-session
//! promotions are recorded on `GameProgress` as [`DependencyKey`]s and
//! overlaid at resolution time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::case::CaseDefinition;
use crate::error::DomainError;
use crate::ids::{EvidenceId, FileId, LocationId, SuspectId};
use crate::progress::GameProgress;

/// The kind of player action a dependency waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyAction {
    DiscoverEvidence,
    CompleteAnalysis,
    InterviewSuspect,
    VisitLocation,
}

impl DependencyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyAction::DiscoverEvidence => "discover_evidence",
            DependencyAction::CompleteAnalysis => "complete_analysis",
            DependencyAction::InterviewSuspect => "interview_suspect",
            DependencyAction::VisitLocation => "visit_location",
        }
    }
}

impl FromStr for DependencyAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discover_evidence" => Ok(Self::DiscoverEvidence),
            "complete_analysis" => Ok(Self::CompleteAnalysis),
            "interview_suspect" => Ok(Self::InterviewSuspect),
            "visit_location" => Ok(Self::VisitLocation),
            _ => Err(DomainError::parse(format!("Unknown dependency action: {}", s))),
        }
    }
}

impl fmt::Display for DependencyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyStatus {
    Pending,
    Ok,
}

impl FromStr for DependencyStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "ok" => Ok(Self::Ok),
            _ => Err(DomainError::parse(format!("Unknown dependency status: {}", s))),
        }
    }
}

/// One prerequisite gating access to a case file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDependency {
    pub action: DependencyAction,
    pub item_id: String,
    pub status: DependencyStatus,
}

impl FileDependency {
    pub fn pending(action: DependencyAction, item_id: impl Into<String>) -> Self {
        Self {
            action,
            item_id: item_id.into(),
            status: DependencyStatus::Pending,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == DependencyStatus::Ok
    }

    /// Promote to `ok`. There is no way back to `pending`.
    pub fn mark_ok(&mut self) {
        self.status = DependencyStatus::Ok;
    }

    pub fn key(&self, file_id: &FileId) -> DependencyKey {
        DependencyKey {
            file_id: file_id.clone(),
            action: self.action,
            item_id: self.item_id.clone(),
        }
    }

    /// Whether the player's progress fulfils this prerequisite.
    pub fn is_satisfied_by(&self, progress: &GameProgress) -> bool {
        match self.action {
            DependencyAction::DiscoverEvidence => progress
                .evidence_discovered()
                .contains(&EvidenceId::new(self.item_id.as_str())),
            DependencyAction::CompleteAnalysis => progress
                .analyses_completed()
                .values()
                .any(|a| a.evidence_id.as_str() == self.item_id),
            DependencyAction::InterviewSuspect => progress
                .suspect_interviews()
                .contains_key(&SuspectId::new(self.item_id.as_str())),
            DependencyAction::VisitLocation => progress
                .locations()
                .contains(&LocationId::new(self.item_id.as_str())),
        }
    }
}

/// Identifies one dependency of one file, for per-session status tracking.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyKey {
    pub file_id: FileId,
    pub action: DependencyAction,
    pub item_id: String,
}

/// A case document (report, statement, record) the player can unlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseFile {
    pub id: FileId,
    pub name: String,
    pub content: String,
    pub dependencies: Vec<FileDependency>,
}

// =============================================================================
// Resolution
// =============================================================================

/// True iff the file has no dependencies or all of them are `ok`.
pub fn is_accessible(file: &CaseFile) -> bool {
    file.dependencies.iter().all(FileDependency::is_ok)
}

/// The file with the session's promoted statuses applied.
pub fn resolve_file(file: &CaseFile, progress: &GameProgress) -> CaseFile {
    let mut resolved = file.clone();
    for dependency in &mut resolved.dependencies {
        if progress
            .unlocked_dependencies()
            .contains(&dependency.key(&file.id))
        {
            dependency.mark_ok();
        }
    }
    resolved
}

/// Files of the case the player can currently open.
pub fn accessible_files(case: &CaseDefinition, progress: &GameProgress) -> Vec<CaseFile> {
    case.files()
        .iter()
        .map(|file| resolve_file(file, progress))
        .filter(is_accessible)
        .collect()
}

/// Pending dependencies the given progress now fulfils.
///
/// The caller records each returned key on the progress, which is how a
/// status moves from `pending` to `ok` for a session.
pub fn newly_satisfied(case: &CaseDefinition, progress: &GameProgress) -> Vec<DependencyKey> {
    case.files()
        .iter()
        .flat_map(|file| {
            file.dependencies
                .iter()
                .filter(|d| !d.is_ok())
                .map(move |d| (d.key(&file.id), d))
        })
        .filter(|(key, d)| {
            !progress.unlocked_dependencies().contains(key) && d.is_satisfied_by(progress)
        })
        .map(|(key, _)| key)
        .collect()
}
