//! Player preferences
//!
//! Persisted separately from the profile, as plain JSON with no digest.

use serde::{Deserialize, Serialize};

use crate::platform::{Storage, StorageError};
use crate::sim::GameEvent;

/// Audio and presentation preferences
///
/// The engine reads the volume, mute and announcement fields. `music_volume`,
/// `mute_on_blur` and `reduced_motion` are stored for the JS host, which reads
/// them through `WebGame::settings_json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0), applied by the host's music player
    pub music_volume: f32,
    pub muted: bool,
    /// Mute when window loses focus (host visibility handler)
    pub mute_on_blur: bool,

    // === HUD ===
    /// Show the "Wave N" banner
    pub wave_announcements: bool,

    // === Accessibility ===
    /// Reduced motion (no screen flashes on hit), applied by the host renderer
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,
            mute_on_blur: true,
            wave_announcements: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "orbital_decay_settings";

    /// Final playback volume for a sound cue
    pub fn effective_volume(&self, cue_volume: Option<f32>) -> f32 {
        if self.muted {
            return 0.0;
        }
        (self.master_volume * self.sfx_volume * cue_volume.unwrap_or(1.0)).clamp(0.0, 1.0)
    }

    /// Whether an event should reach the presentation layer
    pub fn shows(&self, event: &GameEvent) -> bool {
        match event {
            GameEvent::ShowWaveAnnouncement { .. } => self.wave_announcements,
            GameEvent::Sound { .. } => !self.muted,
            _ => true,
        }
    }

    /// Load settings, falling back to defaults
    pub fn load(storage: &impl Storage) -> Self {
        match storage.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring malformed settings: {e}");
                    Self::default()
                }
            },
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Settings unavailable: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, storage: &mut impl Storage) -> Result<(), StorageError> {
        let json = serde_json::to_string(self).map_err(|e| {
            log::warn!("Failed to encode settings: {e}");
            StorageError::WriteRejected(Self::STORAGE_KEY.to_string())
        })?;
        storage.set(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;
    use crate::sim::SoundEffect;

    #[test]
    fn test_effective_volume() {
        let mut settings = Settings::default();
        assert!((settings.effective_volume(None) - 0.8).abs() < 1e-6);
        assert!((settings.effective_volume(Some(0.5)) - 0.4).abs() < 1e-6);
        settings.muted = true;
        assert_eq!(settings.effective_volume(Some(1.0)), 0.0);
    }

    #[test]
    fn test_event_filter() {
        let mut settings = Settings::default();
        let banner = GameEvent::ShowWaveAnnouncement { wave: 2 };
        let sound = GameEvent::sound(SoundEffect::Shoot);
        assert!(settings.shows(&banner));
        settings.wave_announcements = false;
        settings.muted = true;
        assert!(!settings.shows(&banner));
        assert!(!settings.shows(&sound));
        assert!(settings.shows(&GameEvent::FuelDepleted));
    }

    #[test]
    fn test_save_load() {
        let mut storage = MemoryStorage::new();
        assert_eq!(Settings::load(&storage), Settings::default());
        let settings = Settings {
            sfx_volume: 0.25,
            wave_announcements: false,
            ..Settings::default()
        };
        settings.save(&mut storage).unwrap();
        assert_eq!(Settings::load(&storage), settings);
    }

    #[test]
    fn test_host_fields_persist() {
        let mut storage = MemoryStorage::new();
        let settings = Settings {
            music_volume: 0.1,
            mute_on_blur: false,
            reduced_motion: true,
            ..Settings::default()
        };
        settings.save(&mut storage).unwrap();
        let json = storage.raw(Settings::STORAGE_KEY).unwrap();
        assert!(json.contains("\"reduced_motion\":true"));
        assert_eq!(Settings::load(&storage), settings);
    }

    #[test]
    fn test_partial_and_malformed_json() {
        let mut storage = MemoryStorage::new();
        storage.raw_set(Settings::STORAGE_KEY, r#"{"muted":true}"#);
        let loaded = Settings::load(&storage);
        assert!(loaded.muted);
        assert_eq!(loaded.master_volume, 0.8);

        storage.raw_set(Settings::STORAGE_KEY, "nope");
        assert_eq!(Settings::load(&storage), Settings::default());
    }
}
