//! Data-driven game balance
//!
//! Every number the simulation reads lives in [`BalanceConfig`]. The table is
//! plain data: presets and JSON overrides change the feel of a run without
//! touching gameplay code. Missing JSON fields fall back to the standard
//! tuning, so an override file only needs the values it changes.

mod presets;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::{EnemyVariant, PowerupKind};

pub use presets::BalancePreset;

/// Newest balance table layout this build understands
pub const BALANCE_VERSION: u32 = 5;

/// Errors raised while loading a balance table
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid balance JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("balance version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("invalid balance value: {0}")]
    Invalid(&'static str),
}

/// Inclusive numeric range sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.max <= self.min {
            return self.min;
        }
        rng.random_range(self.min..=self.max)
    }
}

/// How the wave director chooses which variant to spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPolicy {
    /// Time-gated unlocks, each unlocked variant rolls its own spawn chance
    #[default]
    ThresholdRoll,
    /// One variant per wave, cycling through `WaveTuning::color_cycle`
    CyclicByWave,
}

/// What happens when the fuel tank runs dry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelExhaustion {
    /// Ship freezes in place, the run continues
    #[default]
    Immobilize,
    /// Run ends immediately
    EndsRun,
}

/// Starting values for a fresh profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStart {
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
}

impl Default for PlayerStart {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0.0,
            xp_to_next_level: 100.0,
            move_speed: 200.0,
            fire_rate_ms: 1000.0,
            max_health: 10.0,
            damage_multiplier: 1.0,
            xp_multiplier: 1.0,
            gold: 0,
            gold_multiplier: 1,
            max_fuel: 10_000.0,
            magnetic_radius: 80.0,
        }
    }
}

/// Stat growth applied on every level-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelUpTuning {
    pub health_increase: f32,
    pub speed_increase: f32,
    pub fire_rate_decrease: f32,
    /// Fire delay never drops below this
    pub fire_rate_min: f32,
    pub damage_increase: f32,
    pub xp_requirement_multiplier: f32,
    /// Fuel granted to the current run (clamped to max fuel)
    pub fuel_bonus: f32,
}

impl Default for LevelUpTuning {
    fn default() -> Self {
        Self {
            health_increase: 10.0,
            speed_increase: 10.0,
            fire_rate_decrease: 10.0,
            fire_rate_min: 50.0,
            damage_increase: 0.1,
            xp_requirement_multiplier: 1.25,
            fuel_bonus: 100.0,
        }
    }
}

/// Spawn and enemy-fire cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    pub spawn_delay_ms: f64,
    pub fire_delay_ms: f64,
    /// Per-enemy probability of firing on each fire decision
    pub fire_chance: f64,
    /// Enemies fire only while above this fraction of the arena height
    pub fire_boundary_ratio: f32,
    pub bullet_speed: f32,
    pub bullet_pool_size: usize,
    /// Horizontal distance from the arena edges for spawn positions
    pub padding: f32,
    /// Spawn line (negative = above the visible area)
    pub spawn_y: f32,
    /// Distance beyond every edge before an object is swept
    pub cleanup_margin: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            spawn_delay_ms: 800.0,
            fire_delay_ms: 1500.0,
            fire_chance: 0.1,
            fire_boundary_ratio: 0.75,
            bullet_speed: 150.0,
            bullet_pool_size: 100,
            padding: 30.0,
            spawn_y: -50.0,
            cleanup_margin: 60.0,
        }
    }
}

/// Stats and rewards for one enemy variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantTuning {
    /// Elapsed run time before this variant may spawn
    pub introduction_time_ms: f64,
    /// Threshold compared against the shared spawn roll
    pub spawn_chance: f64,
    pub pool_size: usize,
    pub velocity_x: ValueRange,
    pub velocity_y: ValueRange,
    pub base_health: f32,
    pub xp_multiplier: u32,
    pub gold_multiplier: u32,
    pub score_multiplier: u32,
}

/// Per-variant table, one entry per [`EnemyVariant`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantTable {
    pub red: VariantTuning,
    pub blue: VariantTuning,
    pub green: VariantTuning,
    pub yellow: VariantTuning,
    pub purple: VariantTuning,
}

impl VariantTable {
    pub fn get(&self, variant: EnemyVariant) -> &VariantTuning {
        match variant {
            EnemyVariant::Red => &self.red,
            EnemyVariant::Blue => &self.blue,
            EnemyVariant::Green => &self.green,
            EnemyVariant::Yellow => &self.yellow,
            EnemyVariant::Purple => &self.purple,
        }
    }

    pub fn get_mut(&mut self, variant: EnemyVariant) -> &mut VariantTuning {
        match variant {
            EnemyVariant::Red => &mut self.red,
            EnemyVariant::Blue => &mut self.blue,
            EnemyVariant::Green => &mut self.green,
            EnemyVariant::Yellow => &mut self.yellow,
            EnemyVariant::Purple => &mut self.purple,
        }
    }
}

impl Default for VariantTable {
    fn default() -> Self {
        let tier = |intro_s: f64, chance: f64, pool: usize, vx: f32, vy: (f32, f32), hp: f32, mult: u32| {
            VariantTuning {
                introduction_time_ms: intro_s * 1000.0,
                spawn_chance: chance,
                pool_size: pool,
                velocity_x: ValueRange::new(-vx, vx),
                velocity_y: ValueRange::new(vy.0, vy.1),
                base_health: hp,
                xp_multiplier: mult,
                gold_multiplier: mult,
                score_multiplier: mult,
            }
        };
        Self {
            red: tier(0.0, 1.0, 30, 25.0, (50.0, 100.0), 2.0, 1),
            blue: tier(45.0, 0.3, 40, 40.0, (80.0, 120.0), 4.0, 2),
            green: tier(90.0, 0.2, 30, 60.0, (120.0, 160.0), 6.0, 3),
            yellow: tier(120.0, 0.15, 20, 80.0, (150.0, 200.0), 8.0, 4),
            purple: tier(150.0, 0.1, 15, 100.0, (180.0, 240.0), 10.0, 5),
        }
    }
}

/// Wave timing and exponential difficulty growth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    pub wave_duration_ms: f64,
    /// Health multiplier base, raised to `wave - 1`
    pub health_multiplier: f32,
    /// Velocity multiplier base, raised to `wave - 1`
    pub velocity_multiplier: f32,
    pub color_cycle: Vec<EnemyVariant>,
    pub policy: SpawnPolicy,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            wave_duration_ms: 30_000.0,
            health_multiplier: 1.15,
            velocity_multiplier: 1.1,
            color_cycle: EnemyVariant::ALL.to_vec(),
            policy: SpawnPolicy::ThresholdRoll,
        }
    }
}

/// Rewards and drop tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionTuning {
    pub xp_per_pickup: f32,
    pub score_per_kill: u64,
    pub gold_drop_chance: f64,
    pub gold_per_drop: u64,
    pub fuel_drop_chance: f64,
    pub fuel_per_pickup: f32,
    pub powerup_drop_chance: f64,
    /// Initial downward speed of a fresh drop
    pub drop_velocity_y: f32,
    /// Horizontal fan-out between sibling drops
    pub drop_spacing: f32,
    pub drop_pool_size: usize,
    pub magnet_pull_speed: f32,
}

impl Default for ProgressionTuning {
    fn default() -> Self {
        Self {
            xp_per_pickup: 25.0,
            score_per_kill: 100,
            gold_drop_chance: 0.6,
            gold_per_drop: 1,
            fuel_drop_chance: 0.2,
            fuel_per_pickup: 500.0,
            powerup_drop_chance: 0.1,
            drop_velocity_y: 100.0,
            drop_spacing: 5.0,
            drop_pool_size: 50,
            magnet_pull_speed: 400.0,
        }
    }
}

/// Fuel and distance clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelTuning {
    pub tick_interval_ms: f64,
    pub depletion_per_second: f32,
    /// Extra drain on a fuel tick if the ship moved since the previous one
    pub depletion_per_movement: f32,
    pub distance_per_tick: u64,
    pub exhaustion: FuelExhaustion,
}

impl Default for FuelTuning {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000.0,
            depletion_per_second: 1.0,
            depletion_per_movement: 2.0,
            distance_per_tick: 1,
            exhaustion: FuelExhaustion::Immobilize,
        }
    }
}

/// Player weapons and damage rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub collision_damage: f32,
    pub hit_flash_ms: f64,
    pub revive_health_fraction: f32,
    pub revive_invulnerability_ms: f64,
    pub player_bullet_speed: f32,
    pub player_bullet_pool_size: usize,
    /// Horizontal speed of the outer spray-shot bullets
    pub spray_spread: f32,
    /// Horizontal offset of the extra-shooter side guns
    pub flank_offset: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            collision_damage: 5.0,
            hit_flash_ms: 100.0,
            revive_health_fraction: 0.5,
            revive_invulnerability_ms: 3000.0,
            player_bullet_speed: 600.0,
            player_bullet_pool_size: 50,
            spray_spread: 150.0,
            flank_offset: 20.0,
        }
    }
}

/// Timed powerups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerupTuning {
    pub duration_ms: f64,
    /// Kinds that may drop, chosen uniformly
    pub kinds: Vec<PowerupKind>,
    pub pool_size: usize,
    /// Rapid fire never halves the delay below this
    pub rapid_fire_floor_ms: f32,
}

impl Default for PowerupTuning {
    fn default() -> Self {
        Self {
            duration_ms: 15_000.0,
            kinds: PowerupKind::ALL.to_vec(),
            pool_size: 10,
            rapid_fire_floor_ms: 50.0,
        }
    }
}

/// Prices and amounts for between-run upgrades
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopTuning {
    pub gold_value_cost: u64,
    pub health_cost: u64,
    pub fire_rate_cost: u64,
    pub fuel_cost: u64,
    pub magnetic_cost: u64,
    pub xp_gain_cost: u64,
    pub damage_cost: u64,
    pub extra_shooter_cost: u64,
    pub revive_cost: u64,
    pub health_amount: f32,
    pub fire_rate_amount: f32,
    pub fuel_amount: f32,
    pub magnetic_amount: f32,
    /// Percent added to the XP multiplier
    pub xp_gain_percent: f32,
    pub damage_amount: f32,
}

impl Default for ShopTuning {
    fn default() -> Self {
        Self {
            gold_value_cost: 50,
            health_cost: 50,
            fire_rate_cost: 50,
            fuel_cost: 50,
            magnetic_cost: 100,
            xp_gain_cost: 50,
            damage_cost: 100,
            extra_shooter_cost: 400,
            revive_cost: 2000,
            health_amount: 10.0,
            fire_rate_amount: 10.0,
            fuel_amount: 100.0,
            magnetic_amount: 10.0,
            xp_gain_percent: 10.0,
            damage_amount: 0.5,
        }
    }
}

/// Play-area dimensions (logical pixels)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    pub width: f32,
    pub height: f32,
    pub player_start_y: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            width: crate::consts::ARENA_WIDTH,
            height: crate::consts::ARENA_HEIGHT,
            player_start_y: 710.0,
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    pub version: u32,
    pub player: PlayerStart,
    pub level_up: LevelUpTuning,
    pub spawn: SpawnTuning,
    pub variants: VariantTable,
    pub waves: WaveTuning,
    pub progression: ProgressionTuning,
    pub fuel: FuelTuning,
    pub combat: CombatTuning,
    pub powerup: PowerupTuning,
    pub shop: ShopTuning,
    pub arena: ArenaTuning,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            version: BALANCE_VERSION,
            player: PlayerStart::default(),
            level_up: LevelUpTuning::default(),
            spawn: SpawnTuning::default(),
            variants: VariantTable::default(),
            waves: WaveTuning::default(),
            progression: ProgressionTuning::default(),
            fuel: FuelTuning::default(),
            combat: CombatTuning::default(),
            powerup: PowerupTuning::default(),
            shop: ShopTuning::default(),
            arena: ArenaTuning::default(),
        }
    }
}

impl BalanceConfig {
    /// Parse a JSON override on top of the standard tuning
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject tables the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.version > BALANCE_VERSION {
            return Err(TuningError::UnsupportedVersion {
                found: self.version,
                supported: BALANCE_VERSION,
            });
        }
        if self.player.level == 0 {
            return Err(TuningError::Invalid("player.level must be at least 1"));
        }
        if self.player.xp_to_next_level <= 0.0 {
            return Err(TuningError::Invalid("player.xp_to_next_level must be positive"));
        }
        if self.player.max_fuel <= 0.0 {
            return Err(TuningError::Invalid("player.max_fuel must be positive"));
        }
        if self.player.gold_multiplier == 0 {
            return Err(TuningError::Invalid("player.gold_multiplier must be at least 1"));
        }
        if self.player.fire_rate_ms < self.level_up.fire_rate_min {
            return Err(TuningError::Invalid("player.fire_rate_ms is below level_up.fire_rate_min"));
        }
        if self.waves.wave_duration_ms <= 0.0 {
            return Err(TuningError::Invalid("waves.wave_duration_ms must be positive"));
        }
        if self.waves.policy == SpawnPolicy::CyclicByWave && self.waves.color_cycle.is_empty() {
            return Err(TuningError::Invalid("waves.color_cycle is empty"));
        }
        if self.spawn.spawn_delay_ms <= 0.0
            || self.spawn.fire_delay_ms <= 0.0
            || self.fuel.tick_interval_ms <= 0.0
        {
            return Err(TuningError::Invalid("timer intervals must be positive"));
        }
        if self.spawn.cleanup_margin <= -self.spawn.spawn_y {
            return Err(TuningError::Invalid("spawn.cleanup_margin must reach past spawn.spawn_y"));
        }
        if EnemyVariant::ALL
            .iter()
            .any(|v| self.variants.get(*v).base_health <= 0.0)
        {
            return Err(TuningError::Invalid("variant base_health must be positive"));
        }
        Ok(())
    }
}
