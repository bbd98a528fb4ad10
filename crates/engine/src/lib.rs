//! Casefile Engine library.
//!
//! Hosts investigation sessions on top of `casefile-domain`.
//!
//! ## Structure
//!
//! - `infrastructure/` - Ports and their adapters (persistence, clocks)
//! - `stores/` - Open sessions
//! - `use_cases/` - Player actions, game clock controls and the clock driver
//! - `config` - Environment configuration
//! - `app` - Application composition

pub mod app;
pub mod config;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use app::App;
pub use config::EngineConfig;
