//! Orbital Decay - run simulation and progression engine for a vertical shooter
//!
//! Core modules:
//! - `sim`: Deterministic run simulation (waves, encounters, powerups, fuel)
//! - `persistence`: Save/load with integrity verification
//! - `platform`: Storage backends and the browser facade
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences

pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::Settings;
pub use tuning::{BalanceConfig, BalancePreset};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tick per rendered frame)
    pub const SIM_DT_MS: f64 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Playfield size in world units (portrait)
    pub const ARENA_WIDTH: f32 = 450.0;
    pub const ARENA_HEIGHT: f32 = 800.0;

    /// Collision radii for the built-in overlap pass
    pub const PLAYER_RADIUS: f32 = 16.0;
    pub const ENEMY_RADIUS: f32 = 16.0;
    pub const BULLET_RADIUS: f32 = 4.0;
    pub const DROP_RADIUS: f32 = 8.0;
}
