//! Persistent player profile and leveling rules

use serde::{Deserialize, Serialize};

use crate::tuning::{BalanceConfig, LevelUpTuning};

/// One-time shop upgrades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OwnedUpgrades {
    /// Two extra guns flanking the main one
    pub extra_shooter: bool,
    /// Survive one lethal hit per run
    pub revive: bool,
}

/// Cross-run progression and currency
///
/// Only persistent fields live here. Powerup effects are applied to the run's
/// live stats, so a saved profile never contains a temporary boost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub level: u32,
    pub xp: f32,
    pub xp_to_next_level: f32,
    pub move_speed: f32,
    pub fire_rate_ms: f32,
    pub max_health: f32,
    pub damage_multiplier: f32,
    pub xp_multiplier: f32,
    pub gold: u64,
    pub gold_multiplier: u32,
    pub max_fuel: f32,
    pub magnetic_radius: f32,
    pub upgrades: OwnedUpgrades,
}

impl PlayerProfile {
    /// Fresh profile from the balance table's starting stats
    pub fn new(config: &BalanceConfig) -> Self {
        let start = &config.player;
        Self {
            level: start.level,
            xp: start.xp,
            xp_to_next_level: start.xp_to_next_level,
            move_speed: start.move_speed,
            fire_rate_ms: start.fire_rate_ms,
            max_health: start.max_health,
            damage_multiplier: start.damage_multiplier,
            xp_multiplier: start.xp_multiplier,
            gold: start.gold,
            gold_multiplier: start.gold_multiplier,
            max_fuel: start.max_fuel,
            magnetic_radius: start.magnetic_radius,
            upgrades: OwnedUpgrades::default(),
        }
    }

    /// Structural invariants a loaded profile must satisfy
    pub fn is_valid(&self) -> bool {
        let finite = [
            self.xp,
            self.xp_to_next_level,
            self.move_speed,
            self.fire_rate_ms,
            self.max_health,
            self.damage_multiplier,
            self.xp_multiplier,
            self.max_fuel,
            self.magnetic_radius,
        ]
        .iter()
        .all(|v| v.is_finite());

        finite
            && self.level >= 1
            && self.xp >= 0.0
            && self.xp_to_next_level > 0.0
            && self.fire_rate_ms > 0.0
            && self.max_health > 0.0
            && self.gold_multiplier >= 1
            && self.max_fuel > 0.0
            && self.magnetic_radius >= 0.0
    }
}

/// Apply one level of stat growth
///
/// The XP requirement always grows by at least one point, so tiny requirements
/// cannot stall at the same value after flooring.
pub fn level_up(profile: &mut PlayerProfile, tuning: &LevelUpTuning) {
    profile.level += 1;
    profile.xp = 0.0;
    profile.xp_to_next_level = (profile.xp_to_next_level * tuning.xp_requirement_multiplier)
        .floor()
        .max(profile.xp_to_next_level + 1.0);
    profile.max_health += tuning.health_increase;
    profile.move_speed += tuning.speed_increase;
    profile.fire_rate_ms = (profile.fire_rate_ms - tuning.fire_rate_decrease).max(tuning.fire_rate_min);
    profile.damage_multiplier += tuning.damage_increase;
}

/// Credit XP; returns true when the gain triggered a level-up
///
/// At most one level is gained per call, matching one check per pickup.
pub fn add_xp(profile: &mut PlayerProfile, amount: f32, xp_multiplier: f32, tuning: &LevelUpTuning) -> bool {
    profile.xp += amount * xp_multiplier;
    if profile.xp >= profile.xp_to_next_level {
        level_up(profile, tuning);
        true
    } else {
        false
    }
}

/// Profile a player would have after reaching `target_level` from scratch
///
/// Replays [`level_up`] rather than using a closed form: the fire-rate floor
/// and the flooring of the XP requirement make the growth non-linear.
pub fn stats_for_level(config: &BalanceConfig, target_level: u32) -> PlayerProfile {
    let mut profile = PlayerProfile::new(config);
    while profile.level < target_level {
        level_up(&mut profile, &config.level_up);
    }
    profile
}
