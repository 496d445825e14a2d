//! Outbound events for the presentation and audio collaborators
//!
//! The simulation never calls into UI or audio code. It queues events on the
//! run state and the host drains them after each tick.

use serde::Serialize;

use super::powerup::PowerupKind;
use super::progression::PlayerProfile;

/// Sound cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundEffect {
    Shoot,
    EnemyHit,
    EnemyExplode,
    EnemyShoot,
    XpPickup,
    GoldPickup,
    /// Fuel and powerup pickups
    DropPickup,
    LevelUp,
    PlayerHit,
    GameOver,
    ShopSpend,
}

impl SoundEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundEffect::Shoot => "shoot",
            SoundEffect::EnemyHit => "enemy_hit",
            SoundEffect::EnemyExplode => "explode",
            SoundEffect::EnemyShoot => "enemy_shoot",
            SoundEffect::XpPickup => "xp",
            SoundEffect::GoldPickup => "gold",
            SoundEffect::DropPickup => "pickup",
            SoundEffect::LevelUp => "levelup",
            SoundEffect::PlayerHit => "player_hit",
            SoundEffect::GameOver => "game_over",
            SoundEffect::ShopSpend => "spend",
        }
    }
}

/// Everything the core tells the outside world
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    StartUi { profile: PlayerProfile },
    UpdateHealth { current: f32, max: f32 },
    UpdateXp { current: f32, required: f32 },
    UpdateFuel { current: f32 },
    UpdateScore { value: u64 },
    UpdateGold { value: u64 },
    UpdateDistance { value: u64 },
    PowerupActivated { kind: PowerupKind },
    PowerupExpired,
    /// Run is paused until the host calls `RunController::resume`
    ShowLevelUp { profile: PlayerProfile },
    ShowGameOver { score: u64, is_new_high_score: bool },
    ShowWaveAnnouncement { wave: u32 },
    /// Tank is empty and the ship can no longer move
    FuelDepleted,
    Revived,
    Sound { effect: SoundEffect, volume: Option<f32> },
}

impl GameEvent {
    pub fn sound(effect: SoundEffect) -> Self {
        GameEvent::Sound { effect, volume: None }
    }
}
