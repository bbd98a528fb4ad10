//! Repository port traits.

use async_trait::async_trait;
use casefile_domain::{CaseDefinition, CaseId, GameProgress, PlayerId};

use super::RepoError;

// =============================================================================
// Progress
// =============================================================================

/// Persisted investigation progress, one entry per (case, player).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressRepo: Send + Sync {
    /// `None` when nothing was saved for the pair yet.
    async fn load(
        &self,
        case_id: &CaseId,
        player_id: &PlayerId,
    ) -> Result<Option<GameProgress>, RepoError>;

    async fn save(&self, progress: &GameProgress) -> Result<(), RepoError>;

    /// Removing an absent entry succeeds.
    async fn clear(&self, case_id: &CaseId, player_id: &PlayerId) -> Result<(), RepoError>;
}

// =============================================================================
// Cases
// =============================================================================

/// Source of case documents. Returned cases are parsed and validated.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaseRepo: Send + Sync {
    async fn load(&self, case_id: &CaseId) -> Result<CaseDefinition, RepoError>;
}
