//! Application state and composition.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::persistence::{JsonCaseRepo, JsonFileProgressRepo};
use crate::infrastructure::ports::{CaseRepo, ClockPort, ProgressRepo};
use crate::stores::SessionStore;
use crate::use_cases::{ClockDriver, GameManager, TimeControl};

/// Main application state.
///
/// Holds the open sessions and the use cases acting on them.
pub struct App {
    pub config: EngineConfig,
    pub sessions: Arc<SessionStore>,
    pub game: Arc<GameManager>,
    pub time: Arc<TimeControl>,
}

impl App {
    pub fn new(
        config: EngineConfig,
        cases: Arc<dyn CaseRepo>,
        progress: Arc<dyn ProgressRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new());
        let driver = Arc::new(ClockDriver::new(
            progress.clone(),
            clock.clone(),
            config.tick_interval,
        ));

        let game = Arc::new(GameManager::new(
            sessions.clone(),
            cases,
            progress.clone(),
            clock.clone(),
            driver.clone(),
            config.time_speed,
        ));
        let time = Arc::new(TimeControl::new(sessions.clone(), progress, clock, driver));

        Self {
            config,
            sessions,
            game,
            time,
        }
    }

    /// Wire the JSON file repositories and the system clock.
    pub fn from_config(config: EngineConfig) -> Self {
        let cases = Arc::new(JsonCaseRepo::new(&config.cases_dir));
        let progress = Arc::new(JsonFileProgressRepo::new(&config.data_dir));
        Self::new(config, cases, progress, Arc::new(SystemClock::new()))
    }

    /// Save and close every open session.
    pub async fn shutdown(&self) {
        let open = self.sessions.len();
        self.game.close_all().await;
        tracing::info!(sessions = open, "Engine shut down");
    }
}
