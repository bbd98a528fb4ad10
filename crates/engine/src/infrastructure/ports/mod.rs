//! Port traits for infrastructure boundaries.
//!
//! These are the only abstractions in the engine. Ports exist for:
//! - Progress persistence (JSON files, in memory)
//! - Case documents
//! - Clock (for testing)

mod error;
mod repos;
mod testing;

pub use error::RepoError;
pub use repos::{CaseRepo, ProgressRepo};
pub use testing::ClockPort;

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::{MockCaseRepo, MockProgressRepo};

#[cfg(test)]
pub use testing::MockClockPort;
