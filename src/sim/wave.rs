//! Wave progression, enemy variant selection and enemy fire
//!
//! Waves are fixed-length buckets of elapsed run time. The wave number drives
//! exponential health and velocity scaling and, under the cyclic policy, the
//! variant of every spawn. Under the threshold policy variants unlock one way
//! by elapsed time and compete on one shared roll per spawn.

use glam::Vec2;
use rand::Rng;

use super::events::{GameEvent, SoundEffect};
use super::state::{Bullet, Enemy, EnemyRef, EnemyVariant, RunState};
use crate::tuning::{BalanceConfig, SpawnPolicy, VariantTable, WaveTuning};

/// 1-based wave number for a point in the run
pub fn wave_for_elapsed(elapsed_ms: f64, tuning: &WaveTuning) -> u32 {
    if tuning.wave_duration_ms <= 0.0 {
        return 1;
    }
    (elapsed_ms.max(0.0) / tuning.wave_duration_ms).floor() as u32 + 1
}

/// Scaling applied to a freshly spawned enemy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Difficulty {
    pub health: f32,
    pub velocity: f32,
}

pub fn difficulty(wave: u32, tuning: &WaveTuning) -> Difficulty {
    let exponent = wave.saturating_sub(1).min(i32::MAX as u32) as i32;
    Difficulty {
        health: tuning.health_multiplier.powi(exponent),
        velocity: tuning.velocity_multiplier.powi(exponent),
    }
}

/// Hit points for a variant under the given scaling, at least one
pub fn scaled_health(base_health: f32, difficulty: Difficulty) -> f32 {
    (base_health * difficulty.health).ceil().max(1.0)
}

/// Variants unlocked at `elapsed_ms`, weakest first
pub fn eligible_variants(elapsed_ms: f64, table: &VariantTable) -> Vec<EnemyVariant> {
    EnemyVariant::ALL
        .into_iter()
        .filter(|v| table.get(*v).introduction_time_ms <= elapsed_ms)
        .collect()
}

/// Threshold roll against one shared draw in `[0, 1)`
///
/// Eligible variants are checked hardest first and the first whose spawn
/// chance exceeds the draw wins. Red is the fallback and always eligible.
pub fn select_by_threshold(elapsed_ms: f64, table: &VariantTable, draw: f64) -> EnemyVariant {
    eligible_variants(elapsed_ms, table)
        .into_iter()
        .rev()
        .filter(|v| *v != EnemyVariant::Red)
        .find(|v| draw < table.get(*v).spawn_chance)
        .unwrap_or(EnemyVariant::Red)
}

pub fn select_by_cycle(wave: u32, cycle: &[EnemyVariant]) -> EnemyVariant {
    if cycle.is_empty() {
        return EnemyVariant::Red;
    }
    cycle[wave.saturating_sub(1) as usize % cycle.len()]
}

/// Variant for the next spawn under the configured policy
pub fn select_variant<R: Rng + ?Sized>(config: &BalanceConfig, elapsed_ms: f64, wave: u32, rng: &mut R) -> EnemyVariant {
    match config.waves.policy {
        SpawnPolicy::ThresholdRoll => select_by_threshold(elapsed_ms, &config.variants, rng.random::<f64>()),
        SpawnPolicy::CyclicByWave => select_by_cycle(wave, &config.waves.color_cycle),
    }
}

/// Spawn one enemy along the top edge
///
/// Returns `None` when the variant's pool is full; the spawn is skipped.
pub fn spawn_enemy(state: &mut RunState, config: &BalanceConfig) -> Option<EnemyRef> {
    let variant = select_variant(config, state.elapsed_ms, state.wave, &mut state.rng);
    let tuning = config.variants.get(variant);
    let scale = difficulty(state.wave, &config.waves);

    let width = config.arena.width;
    let padding = config.spawn.padding.min(width / 2.0);
    let x = if width - padding > padding {
        state.rng.random_range(padding..=width - padding)
    } else {
        width / 2.0
    };
    let vel = Vec2::new(
        tuning.velocity_x.sample(&mut state.rng),
        tuning.velocity_y.sample(&mut state.rng),
    ) * scale.velocity;

    let enemy = Enemy {
        variant,
        hp: scaled_health(tuning.base_health, scale),
        pos: Vec2::new(x, config.spawn.spawn_y),
        vel,
        flashing: false,
        flash_timer: None,
    };
    let spawned = state.enemies.acquire(enemy);
    if spawned.is_none() {
        log::trace!("{} pool exhausted, spawn skipped", variant.as_str());
    }
    spawned
}

/// Whether an enemy is far enough on screen to shoot
pub fn can_fire(pos: Vec2, config: &BalanceConfig) -> bool {
    pos.y > 0.0 && pos.y < config.arena.height * config.spawn.fire_boundary_ratio
}

/// One fire-decision pass: each eligible enemy fires with the configured chance
///
/// Bullets are aimed at the player. Returns the number of bullets fired.
pub fn fire_decisions(state: &mut RunState, config: &BalanceConfig) -> usize {
    let shooters: Vec<Vec2> = state
        .enemies
        .iter()
        .filter(|(_, e)| can_fire(e.pos, config))
        .map(|(_, e)| e.pos)
        .collect();

    let chance = config.spawn.fire_chance.clamp(0.0, 1.0);
    let mut fired = 0;
    for pos in shooters {
        if !state.rng.random_bool(chance) {
            continue;
        }
        let dir = (state.player.pos - pos).normalize_or(Vec2::Y);
        let bullet = Bullet {
            pos,
            vel: dir * config.spawn.bullet_speed,
        };
        if state.enemy_bullets.acquire(bullet).is_some() {
            fired += 1;
        }
    }
    if fired > 0 {
        state.emit(GameEvent::Sound {
            effect: SoundEffect::EnemyShoot,
            volume: Some(0.5),
        });
    }
    fired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::progression::PlayerProfile;
    use proptest::prelude::*;

    #[test]
    fn test_wave_numbering() {
        let tuning = WaveTuning::default();
        assert_eq!(wave_for_elapsed(0.0, &tuning), 1);
        assert_eq!(wave_for_elapsed(29_999.0, &tuning), 1);
        assert_eq!(wave_for_elapsed(30_000.0, &tuning), 2);
        assert_eq!(wave_for_elapsed(95_000.0, &tuning), 4);
    }

    #[test]
    fn test_wave_three_health() {
        let tuning = WaveTuning::default();
        let scale = difficulty(3, &tuning);
        assert_eq!(scaled_health(2.0, scale), 3.0);
        assert_eq!(scaled_health(2.0, difficulty(1, &tuning)), 2.0);
    }

    #[test]
    fn test_unlocks_are_time_gated() {
        let table = VariantTable::default();
        assert_eq!(eligible_variants(0.0, &table), vec![EnemyVariant::Red]);
        assert_eq!(
            eligible_variants(90_000.0, &table),
            vec![EnemyVariant::Red, EnemyVariant::Blue, EnemyVariant::Green]
        );
        assert_eq!(eligible_variants(1e9, &table).len(), 5);
    }

    #[test]
    fn test_threshold_roll_hardest_first() {
        let table = VariantTable::default();
        let late = 1e9;
        // purple 0.1, yellow 0.15, green 0.2, blue 0.3
        assert_eq!(select_by_threshold(late, &table, 0.05), EnemyVariant::Purple);
        assert_eq!(select_by_threshold(late, &table, 0.12), EnemyVariant::Yellow);
        assert_eq!(select_by_threshold(late, &table, 0.19), EnemyVariant::Green);
        assert_eq!(select_by_threshold(late, &table, 0.25), EnemyVariant::Blue);
        assert_eq!(select_by_threshold(late, &table, 0.9), EnemyVariant::Red);
        // Locked variants never win
        assert_eq!(select_by_threshold(50_000.0, &table, 0.05), EnemyVariant::Blue);
        assert_eq!(select_by_threshold(0.0, &table, 0.0), EnemyVariant::Red);
    }

    #[test]
    fn test_cycle_by_wave() {
        let cycle = EnemyVariant::ALL.to_vec();
        assert_eq!(select_by_cycle(1, &cycle), EnemyVariant::Red);
        assert_eq!(select_by_cycle(2, &cycle), EnemyVariant::Blue);
        assert_eq!(select_by_cycle(5, &cycle), EnemyVariant::Purple);
        assert_eq!(select_by_cycle(6, &cycle), EnemyVariant::Red);
        assert_eq!(select_by_cycle(3, &[]), EnemyVariant::Red);
    }

    #[test]
    fn test_spawn_scales_and_skips_when_full() {
        let mut config = BalanceConfig::default();
        config.waves.policy = SpawnPolicy::CyclicByWave;
        config.waves.color_cycle = vec![EnemyVariant::Red];
        config.variants.red.pool_size = 1;
        let profile = PlayerProfile::new(&config);
        let mut state = RunState::new(&config, &profile, 9);
        state.wave = 3;

        let r = spawn_enemy(&mut state, &config).unwrap();
        let enemy = state.enemies.get(r).unwrap();
        assert_eq!(enemy.hp, 3.0);
        assert_eq!(enemy.pos.y, config.spawn.spawn_y);
        assert!(enemy.pos.x >= config.spawn.padding);
        assert!(enemy.pos.x <= config.arena.width - config.spawn.padding);
        assert!(spawn_enemy(&mut state, &config).is_none());
    }

    #[test]
    fn test_fire_gate() {
        let config = BalanceConfig::default();
        assert!(!can_fire(Vec2::new(100.0, -10.0), &config));
        assert!(can_fire(Vec2::new(100.0, 10.0), &config));
        assert!(can_fire(Vec2::new(100.0, 599.0), &config));
        assert!(!can_fire(Vec2::new(100.0, 600.0), &config));
    }

    #[test]
    fn test_fire_decisions_aim_at_player() {
        let mut config = BalanceConfig::default();
        config.spawn.fire_chance = 1.0;
        let profile = PlayerProfile::new(&config);
        let mut state = RunState::new(&config, &profile, 3);
        let shooter = Enemy {
            variant: EnemyVariant::Red,
            hp: 1.0,
            pos: Vec2::new(225.0, 100.0),
            vel: Vec2::ZERO,
            flashing: false,
            flash_timer: None,
        };
        let offscreen = Enemy {
            pos: Vec2::new(225.0, -40.0),
            ..shooter.clone()
        };
        state.enemies.acquire(shooter);
        state.enemies.acquire(offscreen);

        assert_eq!(fire_decisions(&mut state, &config), 1);
        let (_, bullet) = state.enemy_bullets.iter().next().unwrap();
        assert!(bullet.vel.y > 0.0);
        assert!((bullet.vel.length() - config.spawn.bullet_speed).abs() < 1e-3);
    }

    proptest! {
        #[test]
        fn prop_health_never_decreases_with_wave(wave in 1u32..60, base in 1.0f32..20.0) {
            let tuning = WaveTuning::default();
            let now = scaled_health(base, difficulty(wave, &tuning));
            let next = scaled_health(base, difficulty(wave + 1, &tuning));
            prop_assert!(next >= now);
            prop_assert!(now >= base.ceil());
        }
    }
}
