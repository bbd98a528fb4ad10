//! In-memory state storage modules.
//!
//! Stores manage runtime state that doesn't belong in persistence:
//! - `SessionStore` - open investigation sessions and their game clocks

pub mod session;

pub use session::{GameSession, SessionKey, SessionStore};
