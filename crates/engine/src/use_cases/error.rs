//! Errors surfaced by the use cases.

use casefile_domain::{CaseId, DomainError};

use crate::infrastructure::ports::RepoError;
use crate::stores::SessionKey;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Case not found: {0}")]
    CaseNotFound(CaseId),

    #[error("No open session for {0}")]
    SessionNotFound(SessionKey),

    #[error("Session already open for {0}")]
    SessionAlreadyOpen(SessionKey),

    /// The action was refused; progress is unchanged.
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),

    /// The in-memory progress was updated but persisting it failed.
    #[error("Progress for {session} was updated but not saved: {source}")]
    SaveFailed {
        session: SessionKey,
        #[source]
        source: RepoError,
    },
}

impl GameError {
    /// Whether the in-memory state moved despite the error.
    pub fn is_save_failure(&self) -> bool {
        matches!(self, Self::SaveFailed { .. })
    }
}
