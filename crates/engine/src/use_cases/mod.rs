//! Use cases - player-facing orchestration.
//!
//! - `investigation`: session lifecycle, player actions and progress queries
//! - `time`: game clock controls, timed analyses and the clock driver
//!
//! Every operation locks the session, applies the pure domain transition and
//! persists the new progress before releasing the lock.

mod error;
pub mod investigation;
pub mod time;

pub use error::GameError;
pub use investigation::{AccusationDraft, GameManager};
pub use time::{ClockDriver, TimeControl};

use casefile_domain::{ActionOutcome, GameProgress};

use crate::infrastructure::ports::ProgressRepo;
use crate::stores::{GameSession, SessionKey, SessionStore};
use crate::stores::session::SharedSession;

pub(crate) fn require_session(
    sessions: &SessionStore,
    key: &SessionKey,
) -> Result<SharedSession, GameError> {
    sessions
        .get(key)
        .ok_or_else(|| GameError::SessionNotFound(key.clone()))
}

/// Install an applied outcome on the session and persist it.
///
/// A failed save leaves the new progress in place and reports `SaveFailed`.
pub(crate) async fn commit(
    repo: &dyn ProgressRepo,
    key: &SessionKey,
    session: &mut GameSession,
    outcome: ActionOutcome,
) -> Result<GameProgress, GameError> {
    let Some(progress) = install(key, session, outcome) else {
        return Ok(session.progress.clone());
    };
    let _gate = session.save_gate.clone().lock_owned().await;
    save(repo, key, &progress).await?;
    Ok(progress)
}

/// Install an applied outcome on the session without saving it.
///
/// `None` when the outcome changed nothing.
pub(crate) fn install(
    key: &SessionKey,
    session: &mut GameSession,
    outcome: ActionOutcome,
) -> Option<GameProgress> {
    if !outcome.is_applied() {
        return None;
    }

    for action in &outcome.actions {
        tracing::debug!(session = %key, action = %action.action_type(), "Action applied");
    }
    for unlocked in &outcome.unlocked {
        tracing::debug!(
            session = %key,
            file = %unlocked.file_id,
            action = %unlocked.action,
            item = %unlocked.item_id,
            "File dependency satisfied"
        );
    }

    session.progress = outcome.progress;
    Some(session.progress.clone())
}

pub(crate) async fn save(
    repo: &dyn ProgressRepo,
    key: &SessionKey,
    progress: &GameProgress,
) -> Result<(), GameError> {
    repo.save(progress).await.map_err(|source| {
        tracing::warn!(session = %key, error = %source, "Failed to save progress");
        GameError::SaveFailed {
            session: key.clone(),
            source,
        }
    })
}
