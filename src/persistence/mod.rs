//! Save/load persistence with integrity verification
//!
//! Features:
//! - JSON envelope with a keyed BLAKE3 digest
//! - Corruption and tamper detection with fallback to defaults
//! - Independent high score and best distance records

pub mod envelope;
pub mod store;

pub use envelope::EnvelopeError;
pub use store::{BEST_DISTANCE_KEY, HIGH_SCORE_KEY, PROFILE_KEY, ProfileStore};
