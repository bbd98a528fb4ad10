//! Open investigation sessions.
//!
//! A session owns the (progress, clock) pair for one player on one case.
//! Player actions and clock ticks both take the session mutex, so the pair is
//! never mutated concurrently.

use std::fmt;
use std::sync::Arc;

use casefile_domain::{CaseDefinition, CaseId, GameProgress, PlayerId, VirtualClock};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Sessions are keyed by (case, player).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub case_id: CaseId,
    pub player_id: PlayerId,
}

impl SessionKey {
    pub fn new(case_id: impl Into<CaseId>, player_id: impl Into<PlayerId>) -> Self {
        Self {
            case_id: case_id.into(),
            player_id: player_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.case_id, self.player_id)
    }
}

pub struct GameSession {
    pub case: Arc<CaseDefinition>,
    pub progress: GameProgress,
    pub clock: VirtualClock,
    /// Stops the session's clock driver.
    pub cancel: CancellationToken,
    /// Held across each persistence call so saves land in commit order.
    pub save_gate: Arc<Mutex<()>>,
}

impl GameSession {
    pub fn new(case: Arc<CaseDefinition>, progress: GameProgress, clock: VirtualClock) -> Self {
        Self {
            case,
            progress,
            clock,
            cancel: CancellationToken::new(),
            save_gate: Arc::new(Mutex::new(())),
        }
    }
}

pub type SharedSession = Arc<Mutex<GameSession>>;

#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<SessionKey, SharedSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &SessionKey) -> Option<SharedSession> {
        self.sessions.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Register a session. Returns `None` if one is already open for the key.
    pub fn insert(&self, key: SessionKey, session: GameSession) -> Option<SharedSession> {
        match self.sessions.entry(key) {
            Entry::Occupied(_) => None,
            Entry::Vacant(vacant) => {
                let shared = Arc::new(Mutex::new(session));
                vacant.insert(Arc::clone(&shared));
                Some(shared)
            }
        }
    }

    pub fn remove(&self, key: &SessionKey) -> Option<SharedSession> {
        self.sessions.remove(key).map(|(_, session)| session)
    }

    pub fn contains(&self, key: &SessionKey) -> bool {
        self.sessions.contains_key(key)
    }

    pub fn keys(&self) -> Vec<SessionKey> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{sample_case, t0};

    fn session() -> GameSession {
        let case = Arc::new(sample_case());
        let progress = GameProgress::new(case.id().clone(), PlayerId::from("detective"), t0());
        GameSession::new(case, progress, VirtualClock::new(t0(), t0()))
    }

    #[test]
    fn one_session_per_case_and_player() {
        let store = SessionStore::new();
        let key = SessionKey::new("gallery_heist", "detective");

        assert!(store.insert(key.clone(), session()).is_some());
        assert!(store.insert(key.clone(), session()).is_none());
        assert!(store
            .insert(SessionKey::new("gallery_heist", "watson"), session())
            .is_some());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn removed_sessions_are_gone() {
        let store = SessionStore::new();
        let key = SessionKey::new("gallery_heist", "detective");
        store.insert(key.clone(), session());

        assert!(store.remove(&key).is_some());
        assert!(store.get(&key).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn key_displays_case_then_player() {
        assert_eq!(
            SessionKey::new("gallery_heist", "detective").to_string(),
            "gallery_heist/detective"
        );
    }
}
