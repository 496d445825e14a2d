//! Profile and record persistence
//!
//! Three independent records, each sealed in an integrity envelope:
//! the player profile, the high score and the best distance. Reads never
//! fail to the caller: missing, corrupted or edited data falls back to
//! defaults with a logged warning.

use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::envelope::{self, EnvelopeError};
use crate::platform::{Storage, StorageError};
use crate::sim::{PlayerProfile, stats_for_level};
use crate::tuning::BalanceConfig;

pub const PROFILE_KEY: &str = "orbital_decay_profile";
pub const HIGH_SCORE_KEY: &str = "orbital_decay_high_score";
pub const BEST_DISTANCE_KEY: &str = "orbital_decay_best_distance";

#[derive(Debug, thiserror::Error)]
enum ReadError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

/// Persistent profile store over any [`Storage`] backend
pub struct ProfileStore<S: Storage> {
    storage: S,
    config: Rc<BalanceConfig>,
}

impl<S: Storage> ProfileStore<S> {
    pub fn new(storage: S, config: Rc<BalanceConfig>) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &Rc<BalanceConfig> {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn defaults(&self) -> PlayerProfile {
        PlayerProfile::new(&self.config)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ReadError> {
        match self.storage.get(key)? {
            Some(raw) => Ok(Some(envelope::open(&raw)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&mut self, key: &str, value: &T) -> bool {
        let sealed = match envelope::seal(value) {
            Ok(sealed) => sealed,
            Err(e) => {
                log::warn!("Failed to encode {key}: {e}");
                return false;
            }
        };
        match self.storage.set(key, &sealed) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to write {key}: {e}");
                false
            }
        }
    }

    /// Load the profile, or defaults if absent or untrustworthy
    pub fn load(&self) -> PlayerProfile {
        match self.read::<PlayerProfile>(PROFILE_KEY) {
            Ok(Some(profile)) if profile.is_valid() => {
                log::info!("Loaded profile (level {})", profile.level);
                profile
            }
            Ok(Some(_)) => {
                log::warn!("Stored profile failed validation, using defaults");
                self.defaults()
            }
            Ok(None) => {
                log::info!("No profile found, starting fresh");
                self.defaults()
            }
            Err(e) => {
                log::warn!("Discarding stored profile: {e}");
                self.defaults()
            }
        }
    }

    /// Persist the profile; returns whether the write succeeded
    pub fn save(&mut self, profile: &PlayerProfile) -> bool {
        let ok = self.write(PROFILE_KEY, profile);
        if ok {
            log::info!("Profile saved (level {}, gold {})", profile.level, profile.gold);
        }
        ok
    }

    /// Wipe every record and return a fresh profile
    pub fn reset(&mut self) -> PlayerProfile {
        for key in [PROFILE_KEY, HIGH_SCORE_KEY, BEST_DISTANCE_KEY] {
            if let Err(e) = self.storage.remove(key) {
                log::warn!("Failed to clear {key}: {e}");
            }
        }
        log::info!("Profile reset");
        self.defaults()
    }

    fn load_record(&self, key: &str) -> u64 {
        match self.read::<u64>(key) {
            Ok(value) => value.unwrap_or(0),
            Err(e) => {
                log::warn!("Discarding stored {key}: {e}");
                0
            }
        }
    }

    fn save_record(&mut self, key: &str, value: u64) -> bool {
        if value <= self.load_record(key) {
            return false;
        }
        let ok = self.write(key, &value);
        if ok {
            log::info!("New record for {key}: {value}");
        }
        ok
    }

    pub fn load_high_score(&self) -> u64 {
        self.load_record(HIGH_SCORE_KEY)
    }

    /// Store `score` if it beats the current high score
    pub fn save_high_score(&mut self, score: u64) -> bool {
        self.save_record(HIGH_SCORE_KEY, score)
    }

    pub fn load_best_distance(&self) -> u64 {
        self.load_record(BEST_DISTANCE_KEY)
    }

    /// Store `distance` if it beats the current best
    pub fn save_best_distance(&mut self, distance: u64) -> bool {
        self.save_record(BEST_DISTANCE_KEY, distance)
    }

    /// Jump-to-level profile, identical to leveling up from scratch
    pub fn calculate_stats_for_level(&self, target_level: u32) -> PlayerProfile {
        stats_for_level(&self.config, target_level)
    }
}
