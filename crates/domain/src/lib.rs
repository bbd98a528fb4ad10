//! Investigation rules for detective cases.
//!
//! Pure and synchronous: no I/O and no wall-clock reads. Operations that
//! depend on the current instant take it as a `now` argument.
//!
//! - [`case`]: loading and validating case documents.
//! - [`dependency`]: which case files are unlocked.
//! - [`virtual_clock`]: simulated game time and timed analyses.
//! - [`progress`]: per-player investigation state.
//! - [`processor`]: applying player actions to progress.
//! - [`accusation`]: scoring the final accusation.

pub mod accusation;
pub mod case;
pub mod dependency;
pub mod error;
pub mod ids;
pub mod processor;
pub mod progress;
pub mod virtual_clock;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use accusation::{
    Accusation, AccusationEligibility, AccusationValidation, Feedback, ScoreBonuses,
    ScorePenalties,
};
pub use case::{CaseDefinition, EvidenceDefinition, Importance, SuspectDefinition};
pub use dependency::{CaseFile, DependencyAction, DependencyKey, DependencyStatus, FileDependency};
pub use error::{CaseLoadError, DomainError, ValidationError};
pub use ids::{
    ActionId, AnalysisId, AnalysisKey, AnalysisType, CaseId, EvidenceId, FileId, LocationId,
    PlayerId, SuspectId,
};
pub use processor::{AccusationOutcome, ActionOutcome, ActionProcessor};
pub use progress::{
    ActionDetails, ActionType, AnalysisResult, CompletedAnalysis, GameAction, GameProgress,
    InterviewRecord, Milestone, ProgressStats,
};
pub use virtual_clock::{
    AnalysisView, ClockState, ClockView, TimedAnalysis, VirtualClock, MAX_TIME_SPEED,
};
