//! Run state and transient entity types
//!
//! Everything a single run needs lives in [`RunState`]: the player ship, the
//! pooled enemies, bullets and drops, the live stats, pending timers, the
//! outbound event queue and the seeded RNG. Nothing here is persisted.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::GameEvent;
use super::pool::{Handle, Pool};
use super::powerup::{LiveStats, PowerupKind, PowerupMachine};
use super::progression::PlayerProfile;
use super::timer::{Scheduler, TimerId};
use crate::tuning::BalanceConfig;

/// Enemy tiers, ordered by introduction time and difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyVariant {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
}

impl EnemyVariant {
    pub const ALL: [EnemyVariant; 5] = [
        EnemyVariant::Red,
        EnemyVariant::Blue,
        EnemyVariant::Green,
        EnemyVariant::Yellow,
        EnemyVariant::Purple,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyVariant::Red => "red",
            EnemyVariant::Blue => "blue",
            EnemyVariant::Green => "green",
            EnemyVariant::Yellow => "yellow",
            EnemyVariant::Purple => "purple",
        }
    }
}

/// Enemy identity: its variant pool plus the slot handle inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnemyRef {
    pub variant: EnemyVariant,
    pub handle: Handle,
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub variant: EnemyVariant,
    pub hp: f32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Showing the white hit flash
    pub flashing: bool,
    /// Pending flash revert, cancelled when the enemy is released
    pub flash_timer: Option<TimerId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
}

/// What a drop gives when collected
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum DropKind {
    Xp(f32),
    Gold(u64),
    Fuel(f32),
    Powerup(PowerupKind),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drop {
    pub kind: DropKind,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Within pickup radius at some point; homes in until collected
    pub magnetized: bool,
}

/// One fixed-capacity pool per variant
#[derive(Debug, Clone)]
pub struct EnemyPools {
    pools: [Pool<Enemy>; 5],
}

impl EnemyPools {
    pub fn new(config: &BalanceConfig) -> Self {
        Self {
            pools: EnemyVariant::ALL.map(|v| Pool::with_capacity(config.variants.get(v).pool_size)),
        }
    }

    fn index(variant: EnemyVariant) -> usize {
        variant as usize
    }

    pub fn pool(&self, variant: EnemyVariant) -> &Pool<Enemy> {
        &self.pools[Self::index(variant)]
    }

    pub fn acquire(&mut self, enemy: Enemy) -> Option<EnemyRef> {
        let variant = enemy.variant;
        self.pools[Self::index(variant)]
            .acquire(enemy)
            .map(|handle| EnemyRef { variant, handle })
    }

    pub fn get(&self, r: EnemyRef) -> Option<&Enemy> {
        self.pools[Self::index(r.variant)].get(r.handle)
    }

    pub fn get_mut(&mut self, r: EnemyRef) -> Option<&mut Enemy> {
        self.pools[Self::index(r.variant)].get_mut(r.handle)
    }

    pub fn is_live(&self, r: EnemyRef) -> bool {
        self.get(r).is_some()
    }

    fn release(&mut self, r: EnemyRef) -> Option<Enemy> {
        self.pools[Self::index(r.variant)].release(r.handle)
    }

    pub fn len(&self) -> usize {
        self.pools.iter().map(Pool::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (EnemyRef, &Enemy)> + '_ {
        self.pools.iter().flat_map(|pool| {
            pool.iter().map(|(handle, e)| {
                (
                    EnemyRef {
                        variant: e.variant,
                        handle,
                    },
                    e,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Enemy> + '_ {
        self.pools.iter_mut().flat_map(|pool| pool.iter_mut().map(|(_, e)| e))
    }

    pub fn refs(&self) -> Vec<EnemyRef> {
        self.iter().map(|(r, _)| r).collect()
    }
}

/// The player ship
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub current_health: f32,
    /// Revive already spent this run
    pub revive_used: bool,
    pub revive_invulnerable: bool,
    pub revive_timer: Option<TimerId>,
    pub last_fired_ms: f64,
}

/// Ephemeral state of one run
#[derive(Debug, Clone)]
pub struct RunState {
    pub seed: u64,
    pub rng: Pcg32,
    pub time_ticks: u64,
    pub elapsed_ms: f64,
    /// 1-based wave number
    pub wave: u32,
    pub player: Player,
    pub fuel: f32,
    pub distance: u64,
    pub score: u64,
    pub is_game_over: bool,
    /// False once the tank is empty
    pub can_move: bool,
    /// Waiting for the level-up modal to close
    pub paused: bool,
    pub moved_since_fuel_tick: bool,
    pub stats: LiveStats,
    pub powerup: PowerupMachine,
    pub enemies: EnemyPools,
    pub player_bullets: Pool<Bullet>,
    pub enemy_bullets: Pool<Bullet>,
    pub drops: Pool<Drop>,
    pub powerups: Pool<Drop>,
    pub timers: Scheduler,
    pub events: Vec<GameEvent>,
}

impl RunState {
    pub fn new(config: &BalanceConfig, profile: &PlayerProfile, seed: u64) -> Self {
        let arena = &config.arena;
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            elapsed_ms: 0.0,
            wave: 1,
            player: Player {
                pos: Vec2::new(arena.width / 2.0, arena.player_start_y.min(arena.height)),
                current_health: profile.max_health,
                revive_used: false,
                revive_invulnerable: false,
                revive_timer: None,
                last_fired_ms: 0.0,
            },
            fuel: profile.max_fuel,
            distance: 0,
            score: 0,
            is_game_over: false,
            can_move: true,
            paused: false,
            moved_since_fuel_tick: false,
            stats: LiveStats::from_profile(profile),
            powerup: PowerupMachine::new(),
            enemies: EnemyPools::new(config),
            player_bullets: Pool::with_capacity(config.combat.player_bullet_pool_size),
            enemy_bullets: Pool::with_capacity(config.spawn.bullet_pool_size),
            drops: Pool::with_capacity(config.progression.drop_pool_size),
            powerups: Pool::with_capacity(config.powerup.pool_size),
            timers: Scheduler::new(),
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_invulnerable(&self) -> bool {
        self.stats.shielded || self.player.revive_invulnerable
    }

    /// Return an enemy to its pool and cancel the timers it owns
    ///
    /// Safe to call with a stale reference: the second release of the same
    /// enemy finds nothing and returns `None`.
    pub fn release_enemy(&mut self, r: EnemyRef) -> Option<Enemy> {
        let enemy = self.enemies.release(r)?;
        if let Some(timer) = enemy.flash_timer {
            self.timers.cancel(timer);
        }
        Some(enemy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::timer::TimerKind;

    fn enemy(variant: EnemyVariant) -> Enemy {
        Enemy {
            variant,
            hp: 2.0,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            flashing: false,
            flash_timer: None,
        }
    }

    #[test]
    fn test_new_run_from_profile() {
        let config = BalanceConfig::default();
        let profile = PlayerProfile::new(&config);
        let state = RunState::new(&config, &profile, 1);
        assert_eq!(state.player.current_health, profile.max_health);
        assert_eq!(state.fuel, profile.max_fuel);
        assert_eq!(state.wave, 1);
        assert!(state.can_move);
        assert_eq!(state.enemies.pool(EnemyVariant::Red).capacity(), 30);
        assert_eq!(state.enemies.pool(EnemyVariant::Purple).capacity(), 15);
    }

    #[test]
    fn test_release_enemy_cancels_flash_timer() {
        let config = BalanceConfig::default();
        let profile = PlayerProfile::new(&config);
        let mut state = RunState::new(&config, &profile, 1);
        let r = state.enemies.acquire(enemy(EnemyVariant::Blue)).unwrap();
        let timer = state.timers.schedule(0.0, 100.0, TimerKind::HitFlashRevert(r));
        state.enemies.get_mut(r).unwrap().flash_timer = Some(timer);

        assert!(state.release_enemy(r).is_some());
        assert!(!state.timers.is_pending(timer));
        assert!(state.release_enemy(r).is_none());
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_enemy_pools_are_per_variant() {
        let mut config = BalanceConfig::default();
        config.variants.red.pool_size = 1;
        let profile = PlayerProfile::new(&config);
        let mut state = RunState::new(&config, &profile, 1);
        assert!(state.enemies.acquire(enemy(EnemyVariant::Red)).is_some());
        assert!(state.enemies.acquire(enemy(EnemyVariant::Red)).is_none());
        assert!(state.enemies.acquire(enemy(EnemyVariant::Green)).is_some());
        assert_eq!(state.enemies.len(), 2);
        let variants: Vec<_> = state.enemies.iter().map(|(r, _)| r.variant).collect();
        assert_eq!(variants, vec![EnemyVariant::Red, EnemyVariant::Green]);
    }
}
