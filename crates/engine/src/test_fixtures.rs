//! Shared fixtures for engine unit tests.

use std::sync::Arc;
use std::time::Duration;

use casefile_domain::{
    case, ActionProcessor, CaseDefinition, CaseId, EvidenceId, GameProgress, PlayerId,
};
use chrono::{DateTime, TimeZone, Utc};

use crate::infrastructure::clock::ManualClock;
use crate::infrastructure::persistence::{InMemoryCaseRepo, InMemoryProgressRepo};
use crate::stores::{SessionKey, SessionStore};
use crate::use_cases::{ClockDriver, GameManager, TimeControl};

pub const SAMPLE_CASE_JSON: &str = include_str!("../../../cases/gallery_heist.json");

pub const SAMPLE_PLAYER: &str = "detective";

pub fn sample_case() -> CaseDefinition {
    case::load_str(SAMPLE_CASE_JSON).expect("sample case loads")
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 21, 0, 0).unwrap()
}

/// Progress on the sample case with two pieces of evidence found.
pub fn sample_progress() -> GameProgress {
    let case = sample_case();
    let processor = ActionProcessor::new(&case);
    let mut progress = GameProgress::new(case.id().clone(), PlayerId::from(SAMPLE_PLAYER), t0());
    for id in ["torn_glove", "muddy_footprint"] {
        progress = processor
            .discover_evidence(&progress, &EvidenceId::from(id), None, t0())
            .expect("sample evidence exists")
            .progress;
    }
    progress
}

/// The engine wired against in-memory repositories and a manual clock.
///
/// The clock driver ticks hourly so tests drive completions themselves
/// through `TimeControl::tick_session`.
pub struct TestEngine {
    pub game: GameManager,
    pub time: TimeControl,
    pub sessions: Arc<SessionStore>,
    pub cases: Arc<InMemoryCaseRepo>,
    pub progress: Arc<InMemoryProgressRepo>,
    pub clock: Arc<ManualClock>,
}

impl TestEngine {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        let sessions = Arc::new(SessionStore::new());
        let cases = Arc::new(InMemoryCaseRepo::new());
        cases.insert(sample_case());
        let progress = Arc::new(InMemoryProgressRepo::new());

        let driver = Arc::new(ClockDriver::new(
            progress.clone(),
            clock.clone(),
            Duration::from_secs(3600),
        ));
        let game = GameManager::new(
            sessions.clone(),
            cases.clone(),
            progress.clone(),
            clock.clone(),
            driver.clone(),
            1.0,
        );
        let time = TimeControl::new(sessions.clone(), progress.clone(), clock.clone(), driver);

        Self {
            game,
            time,
            sessions,
            cases,
            progress,
            clock,
        }
    }
}

pub async fn open_sample_session(engine: &TestEngine) -> SessionKey {
    engine
        .game
        .open_session(CaseId::from("gallery_heist"), PlayerId::from(SAMPLE_PLAYER))
        .await
        .expect("sample session opens");
    SessionKey::new("gallery_heist", SAMPLE_PLAYER)
}
