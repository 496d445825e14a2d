//! Fixed timestep run controller
//!
//! [`RunController`] owns one run: the balance table, the profile store, the
//! loaded profile and the [`RunState`]. Each call to [`RunController::tick`]
//! advances the run by one step:
//!
//! 1. advance the clock and announce wave changes
//! 2. fire due timers (spawn, fire decision, fuel, powerup expiry, flashes)
//! 3. move the ship and auto-fire
//! 4. integrate motion and magnetize drops
//! 5. resolve the collisions reported for this tick
//! 6. sweep objects that left the arena
//!
//! The profile is saved at level-ups, on death and when the controller is
//! finished. Events queue on the run state and are drained by the host.

use std::rc::Rc;

use glam::Vec2;

use super::encounter::{self, Collision, Outcome};
use super::events::{GameEvent, SoundEffect};
use super::powerup::LiveStats;
use super::progression::PlayerProfile;
use super::shop::{self, PurchaseError, Receipt, ShopItem};
use super::state::{Bullet, RunState};
use super::timer::{Fired, TimerKind};
use super::wave;
use crate::consts::PLAYER_RADIUS;
use crate::persistence::ProfileStore;
use crate::platform::Storage;
use crate::tuning::{BalanceConfig, FuelExhaustion};

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Joystick direction, expected in the unit disc
    pub direction: Vec2,
    /// Joystick held
    pub active: bool,
    /// Overlaps reported by the physics collaborator
    pub collisions: Vec<Collision>,
}

/// Orchestrates a run from start to game over
pub struct RunController<S: Storage> {
    config: Rc<BalanceConfig>,
    store: ProfileStore<S>,
    profile: PlayerProfile,
    state: RunState,
}

impl<S: Storage> RunController<S> {
    /// Load the profile and start a run
    pub fn new(store: ProfileStore<S>, seed: u64) -> Self {
        let config = Rc::clone(store.config());
        let profile = store.load();
        let state = RunState::new(&config, &profile, seed);
        let mut controller = Self {
            config,
            store,
            profile,
            state,
        };
        controller.begin();
        controller
    }

    /// Abandon the current run and start a fresh one from the stored profile
    pub fn restart(&mut self, seed: u64) {
        if !self.state.is_game_over {
            self.store.save(&self.profile);
        }
        self.state.timers.cancel_all();
        self.profile = self.store.load();
        self.state = RunState::new(&self.config, &self.profile, seed);
        self.begin();
    }

    /// Wipe all saved progress and start over
    pub fn reset_profile(&mut self, seed: u64) {
        self.state.timers.cancel_all();
        self.profile = self.store.reset();
        self.state = RunState::new(&self.config, &self.profile, seed);
        self.begin();
    }

    fn begin(&mut self) {
        let config = &self.config;
        let timers = &mut self.state.timers;
        timers.schedule_repeating(0.0, config.spawn.spawn_delay_ms, TimerKind::Spawn);
        timers.schedule_repeating(0.0, config.spawn.fire_delay_ms, TimerKind::FireDecision);
        timers.schedule_repeating(0.0, config.fuel.tick_interval_ms, TimerKind::FuelTick);

        log::info!(
            "Run started (seed {}, level {}, balance v{})",
            self.state.seed,
            self.profile.level,
            config.version
        );

        let profile = &self.profile;
        let state = &mut self.state;
        state.emit(GameEvent::StartUi {
            profile: profile.clone(),
        });
        state.emit(GameEvent::UpdateHealth {
            current: state.player.current_health,
            max: profile.max_health,
        });
        state.emit(GameEvent::UpdateXp {
            current: profile.xp,
            required: profile.xp_to_next_level,
        });
        state.emit(GameEvent::UpdateFuel { current: state.fuel });
        state.emit(GameEvent::UpdateScore { value: 0 });
        state.emit(GameEvent::UpdateGold { value: profile.gold });
        state.emit(GameEvent::UpdateDistance { value: 0 });
        state.emit(GameEvent::ShowWaveAnnouncement { wave: state.wave });
    }

    pub fn config(&self) -> &BalanceConfig {
        &self.config
    }

    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Direct state access for debug tools and tests
    pub fn state_mut(&mut self) -> &mut RunState {
        &mut self.state
    }

    pub fn store(&self) -> &ProfileStore<S> {
        &self.store
    }

    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    /// Close the level-up modal and continue the run
    pub fn resume(&mut self) {
        if self.state.paused {
            self.state.paused = false;
            log::debug!("Run resumed");
        }
    }

    /// Buy a shop item and save the profile
    ///
    /// Meant for the between-runs shop; stat changes take effect on the next run.
    pub fn purchase(&mut self, item: ShopItem) -> Result<Receipt, PurchaseError> {
        let receipt = shop::purchase(&mut self.profile, &self.config, item)?;
        self.store.save(&self.profile);
        log::info!("Bought {:?} for {} gold ({} left)", item, receipt.cost, receipt.gold_left);
        self.state.emit(GameEvent::sound(SoundEffect::ShopSpend));
        self.state.emit(GameEvent::UpdateGold {
            value: self.profile.gold,
        });
        Ok(receipt)
    }

    /// Flush the profile and hand the store back
    pub fn finish(mut self) -> ProfileStore<S> {
        if !self.state.is_game_over {
            self.store.save(&self.profile);
        }
        self.state.timers.cancel_all();
        self.store
    }

    /// Advance the run by `dt_ms`
    pub fn tick(&mut self, input: &TickInput, dt_ms: f64) {
        if self.state.is_game_over || self.state.paused {
            return;
        }
        self.state.time_ticks += 1;
        self.state.elapsed_ms += dt_ms.max(0.0);
        self.update_wave();

        while let Some(fired) = self.state.timers.next_due(self.state.elapsed_ms) {
            self.on_timer(fired);
            if self.state.is_game_over {
                return;
            }
        }

        let dt = (dt_ms.max(0.0) / 1000.0) as f32;
        self.move_player(input, dt);
        self.auto_fire();
        self.integrate(dt);

        for collision in &input.collisions {
            match encounter::resolve(&mut self.state, &mut self.profile, &self.config, *collision) {
                Outcome::Nothing => {}
                Outcome::LeveledUp => self.on_level_up(),
                Outcome::PlayerDown => {
                    self.end_run();
                    return;
                }
            }
        }

        encounter::sweep_out_of_bounds(&mut self.state, &self.config);
    }

    fn update_wave(&mut self) {
        let wave = wave::wave_for_elapsed(self.state.elapsed_ms, &self.config.waves);
        if wave != self.state.wave {
            self.state.wave = wave;
            log::info!("Wave {wave}");
            self.state.emit(GameEvent::ShowWaveAnnouncement { wave });
        }
    }

    fn on_timer(&mut self, fired: Fired) {
        match fired.kind {
            TimerKind::Spawn => {
                if let Some(r) = wave::spawn_enemy(&mut self.state, &self.config) {
                    log::debug!("Spawned {} at {:.0}ms", r.variant.as_str(), fired.due_ms);
                }
            }
            TimerKind::FireDecision => {
                wave::fire_decisions(&mut self.state, &self.config);
            }
            TimerKind::FuelTick => self.on_fuel_tick(),
            TimerKind::PowerupExpiry => {
                if let Some(kind) = self.state.powerup.on_expiry(fired.id, &mut self.state.stats) {
                    log::debug!("Powerup {} expired", kind.as_str());
                    self.state.emit(GameEvent::PowerupExpired);
                }
            }
            TimerKind::HitFlashRevert(target) => {
                if let Some(enemy) = self.state.enemies.get_mut(target) {
                    if enemy.flash_timer == Some(fired.id) {
                        enemy.flashing = false;
                        enemy.flash_timer = None;
                    }
                }
            }
            TimerKind::ReviveInvulnerabilityEnd => {
                let player = &mut self.state.player;
                if player.revive_timer == Some(fired.id) {
                    player.revive_invulnerable = false;
                    player.revive_timer = None;
                }
            }
        }
    }

    fn on_fuel_tick(&mut self) {
        let tuning = &self.config.fuel;
        let state = &mut self.state;

        let mut drain = tuning.depletion_per_second;
        if state.moved_since_fuel_tick {
            drain += tuning.depletion_per_movement;
        }
        state.moved_since_fuel_tick = false;

        if state.can_move {
            state.distance = state.distance.saturating_add(tuning.distance_per_tick);
            state.emit(GameEvent::UpdateDistance { value: state.distance });
        }

        state.fuel = (state.fuel - drain).max(0.0);
        state.emit(GameEvent::UpdateFuel { current: state.fuel });

        if state.fuel > 0.0 || !state.can_move {
            return;
        }
        let exhaustion = tuning.exhaustion;
        match exhaustion {
            FuelExhaustion::Immobilize => {
                state.can_move = false;
                log::info!("Out of fuel at distance {}", state.distance);
                state.emit(GameEvent::FuelDepleted);
            }
            FuelExhaustion::EndsRun => {
                log::info!("Out of fuel, run over");
                self.end_run();
            }
        }
    }

    fn move_player(&mut self, input: &TickInput, dt: f32) {
        let state = &mut self.state;
        if !input.active || !state.can_move {
            return;
        }
        let direction = input.direction.clamp_length_max(1.0);
        if !direction.is_finite() || direction == Vec2::ZERO {
            return;
        }
        let arena = &self.config.arena;
        let next = state.player.pos + direction * self.profile.move_speed * dt;
        state.player.pos = next.clamp(Vec2::ZERO, Vec2::new(arena.width, arena.height));
        state.moved_since_fuel_tick = true;
    }

    fn auto_fire(&mut self) {
        let state = &mut self.state;
        if state.elapsed_ms - state.player.last_fired_ms < state.stats.fire_rate_ms as f64 {
            return;
        }
        state.player.last_fired_ms = state.elapsed_ms;

        let combat = &self.config.combat;
        let origin = state.player.pos - Vec2::new(0.0, PLAYER_RADIUS);
        let up = Vec2::new(0.0, -combat.player_bullet_speed);
        let mut shots = vec![(origin, up)];
        if state.stats.spray_shot {
            shots.push((origin, up - Vec2::new(combat.spray_spread, 0.0)));
            shots.push((origin, up + Vec2::new(combat.spray_spread, 0.0)));
        }
        if self.profile.upgrades.extra_shooter {
            let flank = Vec2::new(combat.flank_offset, 0.0);
            shots.push((origin - flank, up));
            shots.push((origin + flank, up));
        }

        let fired = shots
            .into_iter()
            .filter(|&(pos, vel)| state.player_bullets.acquire(Bullet { pos, vel }).is_some())
            .count();
        if fired > 0 {
            state.emit(GameEvent::Sound {
                effect: SoundEffect::Shoot,
                volume: Some(0.3),
            });
        }
    }

    fn integrate(&mut self, dt: f32) {
        let state = &mut self.state;
        let player = state.player.pos;
        let radius = self.profile.magnetic_radius;
        let pull = self.config.progression.magnet_pull_speed;

        for enemy in state.enemies.iter_mut() {
            enemy.pos += enemy.vel * dt;
        }
        for pool in [&mut state.player_bullets, &mut state.enemy_bullets] {
            for (_, bullet) in pool.iter_mut() {
                bullet.pos += bullet.vel * dt;
            }
        }
        for pool in [&mut state.drops, &mut state.powerups] {
            for (_, drop) in pool.iter_mut() {
                if !drop.magnetized && drop.pos.distance(player) <= radius {
                    drop.magnetized = true;
                }
                if drop.magnetized {
                    drop.vel = (player - drop.pos).normalize_or_zero() * pull;
                }
                drop.pos += drop.vel * dt;
            }
        }
    }

    /// Level-up bookkeeping after the profile has grown
    fn on_level_up(&mut self) {
        let state = &mut self.state;
        let profile = &self.profile;
        state.player.current_health = profile.max_health;
        state.fuel = (state.fuel + self.config.level_up.fuel_bonus).min(profile.max_fuel);
        if state.fuel > 0.0 {
            state.can_move = true;
        }
        let fresh = LiveStats::from_profile(profile);
        state.powerup.rebase(&mut state.stats, fresh, &self.config.powerup);

        self.store.save(&self.profile);
        log::info!("Level up: {}", self.profile.level);

        let profile = &self.profile;
        let state = &mut self.state;
        state.emit(GameEvent::sound(SoundEffect::LevelUp));
        state.emit(GameEvent::UpdateHealth {
            current: state.player.current_health,
            max: profile.max_health,
        });
        state.emit(GameEvent::UpdateXp {
            current: profile.xp,
            required: profile.xp_to_next_level,
        });
        state.emit(GameEvent::UpdateFuel { current: state.fuel });
        state.emit(GameEvent::ShowLevelUp {
            profile: profile.clone(),
        });
        state.paused = true;
    }

    /// Stop the run and flush everything worth keeping
    fn end_run(&mut self) {
        if self.state.is_game_over {
            return;
        }
        let state = &mut self.state;
        state.is_game_over = true;
        state.paused = false;
        state.powerup.cancel(&mut state.stats, &mut state.timers);
        state.timers.cancel_all();
        for enemy in state.enemies.iter_mut() {
            enemy.flashing = false;
            enemy.flash_timer = None;
        }
        state.player.revive_timer = None;

        self.store.save(&self.profile);
        let score = self.state.score;
        let distance = self.state.distance;
        let is_new_high_score = self.store.save_high_score(score);
        self.store.save_best_distance(distance);
        log::info!("Game over: score {score}, distance {distance}, new high score {is_new_high_score}");

        self.state.emit(GameEvent::sound(SoundEffect::GameOver));
        self.state.emit(GameEvent::ShowGameOver {
            score,
            is_new_high_score,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT_MS;
    use crate::platform::MemoryStorage;
    use crate::sim::collision::detect_overlaps;
    use crate::sim::powerup::PowerupKind;
    use crate::sim::state::{Drop, DropKind, Enemy, EnemyVariant};

    fn controller(config: BalanceConfig) -> RunController<MemoryStorage> {
        let store = ProfileStore::new(MemoryStorage::new(), Rc::new(config));
        RunController::new(store, 42)
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    fn drop_on_player(c: &mut RunController<MemoryStorage>, kind: DropKind) -> Collision {
        let pos = c.state().player.pos;
        let drop = Drop {
            kind,
            pos,
            vel: Vec2::ZERO,
            magnetized: false,
        };
        match kind {
            DropKind::Powerup(_) => Collision::PlayerPowerup {
                drop: c.state_mut().powerups.acquire(drop).unwrap(),
            },
            _ => Collision::PlayerDrop {
                drop: c.state_mut().drops.acquire(drop).unwrap(),
            },
        }
    }

    #[test]
    fn test_start_emits_initial_ui() {
        let mut c = controller(BalanceConfig::default());
        let events = c.drain_events();
        assert!(matches!(events.first(), Some(GameEvent::StartUi { .. })));
        assert!(events.contains(&GameEvent::ShowWaveAnnouncement { wave: 1 }));
        assert_eq!(c.state().timers.pending(), 3);
    }

    #[test]
    fn test_fuel_depletion_ends_run() {
        let mut config = BalanceConfig::default();
        config.fuel.exhaustion = FuelExhaustion::EndsRun;
        let mut c = controller(config);
        c.state_mut().fuel = 2.0;

        c.tick(&idle(), 1000.0);
        assert_eq!(c.state().fuel, 1.0);
        assert!(!c.is_game_over());

        c.tick(&idle(), 1000.0);
        assert_eq!(c.state().fuel, 0.0);
        assert!(c.is_game_over());
        assert_eq!(c.state().timers.pending(), 0);
        assert_eq!(c.store().load_best_distance(), 2);

        let events = c.drain_events();
        assert!(events.contains(&GameEvent::ShowGameOver {
            score: 0,
            is_new_high_score: false
        }));
    }

    #[test]
    fn test_fuel_depletion_immobilizes() {
        let mut c = controller(BalanceConfig::default());
        c.state_mut().fuel = 1.0;
        c.tick(&idle(), 1000.0);
        assert!(!c.is_game_over());
        assert!(!c.state().can_move);
        assert!(c.drain_events().contains(&GameEvent::FuelDepleted));

        let start = c.state().player.pos;
        let input = TickInput {
            direction: Vec2::X,
            active: true,
            collisions: Vec::new(),
        };
        c.tick(&input, SIM_DT_MS);
        assert_eq!(c.state().player.pos, start);

        // Distance stops accumulating while grounded
        let distance = c.state().distance;
        c.tick(&idle(), 1000.0);
        assert_eq!(c.state().distance, distance);
    }

    #[test]
    fn test_movement_costs_fuel_and_stays_in_arena() {
        let mut c = controller(BalanceConfig::default());
        let input = TickInput {
            direction: Vec2::new(-1.0, 0.0),
            active: true,
            collisions: Vec::new(),
        };
        for _ in 0..130 {
            c.tick(&input, SIM_DT_MS);
        }
        assert_eq!(c.state().player.pos.x, 0.0);
        // Two fuel ticks, each with base and movement drain
        let fuel = &c.config().fuel;
        let expected = c.profile().max_fuel - 2.0 * (fuel.depletion_per_second + fuel.depletion_per_movement);
        assert_eq!(c.state().fuel, expected);
    }

    #[test]
    fn test_level_up_pauses_until_resume() {
        let mut c = controller(BalanceConfig::default());
        c.state_mut().player.current_health = 3.0;
        c.state_mut().fuel = 10.0;
        let pickup = drop_on_player(&mut c, DropKind::Xp(1000.0));
        c.tick(
            &TickInput {
                collisions: vec![pickup],
                ..idle()
            },
            SIM_DT_MS,
        );

        assert!(c.is_paused());
        assert_eq!(c.profile().level, 2);
        assert_eq!(c.state().player.current_health, c.profile().max_health);
        assert_eq!(c.state().fuel, 110.0);
        assert_eq!(c.store().load().level, 2);
        assert!(
            c.drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::ShowLevelUp { .. }))
        );

        let elapsed = c.state().elapsed_ms;
        c.tick(&idle(), SIM_DT_MS);
        assert_eq!(c.state().elapsed_ms, elapsed);

        c.resume();
        c.tick(&idle(), SIM_DT_MS);
        assert!(c.state().elapsed_ms > elapsed);
    }

    #[test]
    fn test_level_up_keeps_active_powerup() {
        let mut c = controller(BalanceConfig::default());
        let powerup = drop_on_player(&mut c, DropKind::Powerup(PowerupKind::DoubleDamage));
        c.tick(
            &TickInput {
                collisions: vec![powerup],
                ..idle()
            },
            SIM_DT_MS,
        );
        assert_eq!(c.state().stats.damage_multiplier, 2.0);

        let pickup = drop_on_player(&mut c, DropKind::Xp(1000.0));
        c.tick(
            &TickInput {
                collisions: vec![pickup],
                ..idle()
            },
            SIM_DT_MS,
        );
        c.resume();
        assert!((c.state().stats.damage_multiplier - 2.2).abs() < 1e-5);
        assert!((c.profile().damage_multiplier - 1.1).abs() < 1e-6);

        for _ in 0..(16_000.0 / SIM_DT_MS) as usize {
            c.tick(&idle(), SIM_DT_MS);
        }
        assert!(c.state().powerup.active().is_none());
        assert!((c.state().stats.damage_multiplier - 1.1).abs() < 1e-6);
        assert!(c.drain_events().contains(&GameEvent::PowerupExpired));
    }

    #[test]
    fn test_death_saves_records_and_stops() {
        let mut c = controller(BalanceConfig::default());
        c.state_mut().score = 700;
        c.state_mut().player.current_health = 5.0;
        let pos = c.state().player.pos;
        let enemy = c
            .state_mut()
            .enemies
            .acquire(Enemy {
                variant: EnemyVariant::Red,
                hp: 2.0,
                pos,
                vel: Vec2::ZERO,
                flashing: false,
                flash_timer: None,
            })
            .unwrap();
        c.tick(
            &TickInput {
                collisions: vec![Collision::PlayerEnemy { enemy }],
                ..idle()
            },
            SIM_DT_MS,
        );

        assert!(c.is_game_over());
        assert_eq!(c.state().timers.pending(), 0);
        assert_eq!(c.store().load_high_score(), 700);
        assert!(c.drain_events().contains(&GameEvent::ShowGameOver {
            score: 700,
            is_new_high_score: true
        }));

        let ticks = c.state().time_ticks;
        c.tick(&idle(), SIM_DT_MS);
        assert_eq!(c.state().time_ticks, ticks);
        assert!(c.drain_events().is_empty());
    }

    #[test]
    fn test_auto_fire_patterns() {
        let mut c = controller(BalanceConfig::default());
        c.tick(&idle(), 1000.0);
        assert_eq!(c.state().player_bullets.len(), 1);

        let mut store = c.finish();
        let mut profile = store.load();
        profile.upgrades.extra_shooter = true;
        store.save(&profile);
        let mut c = RunController::new(store, 7);
        let spray = drop_on_player(&mut c, DropKind::Powerup(PowerupKind::SprayShot));
        c.tick(
            &TickInput {
                collisions: vec![spray],
                ..idle()
            },
            SIM_DT_MS,
        );
        c.tick(&idle(), 1000.0);
        assert_eq!(c.state().player_bullets.len(), 5);
    }

    #[test]
    fn test_purchase_saves_profile() {
        let mut c = controller(BalanceConfig::default());
        assert_eq!(
            c.purchase(ShopItem::Health),
            Err(PurchaseError::InsufficientGold { cost: 50, gold: 0 })
        );
        let gold = drop_on_player(&mut c, DropKind::Gold(60));
        c.tick(
            &TickInput {
                collisions: vec![gold],
                ..idle()
            },
            SIM_DT_MS,
        );
        let receipt = c.purchase(ShopItem::Health).unwrap();
        assert_eq!(receipt.gold_left, 10);
        assert_eq!(c.store().load().max_health, 20.0);
    }

    #[test]
    fn test_restart_reloads_profile() {
        let mut c = controller(BalanceConfig::default());
        let gold = drop_on_player(&mut c, DropKind::Gold(5));
        c.tick(
            &TickInput {
                collisions: vec![gold],
                ..idle()
            },
            SIM_DT_MS,
        );
        c.restart(9);
        assert_eq!(c.profile().gold, 5);
        assert_eq!(c.state().elapsed_ms, 0.0);
        c.reset_profile(10);
        assert_eq!(c.profile().gold, 0);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed: u64| {
            let mut c = controller(BalanceConfig::default());
            c.restart(seed);
            let mut log = Vec::new();
            for i in 0..3000u32 {
                if c.is_paused() {
                    c.resume();
                }
                let t = i as f32 * 0.02;
                let input = TickInput {
                    direction: Vec2::new(t.sin(), 0.0),
                    active: true,
                    collisions: detect_overlaps(c.state()),
                };
                c.tick(&input, SIM_DT_MS);
                log.extend(c.drain_events());
            }
            (log, c.state().score, c.state().distance)
        };
        assert_eq!(run(1234), run(1234));
    }
}
