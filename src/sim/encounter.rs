//! Collision consequences, loot and cleanup
//!
//! Overlaps are detected elsewhere. This module only decides what happens when
//! two things touch: damage, kills and their loot, pickups and player hits.
//! Every handler tolerates stale handles, so an object consumed earlier in
//! the same tick is silently skipped.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::events::{GameEvent, SoundEffect};
use super::pool::Handle;
use super::progression::{PlayerProfile, add_xp};
use super::state::{Drop, DropKind, EnemyRef, RunState};
use super::timer::TimerKind;
use crate::tuning::BalanceConfig;

/// An overlap reported for this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    BulletEnemy { bullet: Handle, enemy: EnemyRef },
    PlayerEnemy { enemy: EnemyRef },
    PlayerEnemyBullet { bullet: Handle },
    PlayerDrop { drop: Handle },
    PlayerPowerup { drop: Handle },
}

/// What the controller must do after a collision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Nothing,
    LeveledUp,
    /// Lethal hit with no revive left
    PlayerDown,
}

/// Apply one collision to the run
pub fn resolve(
    state: &mut RunState,
    profile: &mut PlayerProfile,
    config: &BalanceConfig,
    collision: Collision,
) -> Outcome {
    match collision {
        Collision::BulletEnemy { bullet, enemy } => {
            bullet_hits_enemy(state, profile, config, bullet, enemy);
            Outcome::Nothing
        }
        Collision::PlayerEnemy { enemy } => {
            if state.release_enemy(enemy).is_none() {
                return Outcome::Nothing;
            }
            player_hit(state, profile, config)
        }
        Collision::PlayerEnemyBullet { bullet } => {
            if state.enemy_bullets.release(bullet).is_none() {
                return Outcome::Nothing;
            }
            player_hit(state, profile, config)
        }
        Collision::PlayerDrop { drop } => match state.drops.release(drop) {
            Some(d) => collect(state, profile, config, d.kind),
            None => Outcome::Nothing,
        },
        Collision::PlayerPowerup { drop } => match state.powerups.release(drop) {
            Some(d) => collect(state, profile, config, d.kind),
            None => Outcome::Nothing,
        },
    }
}

fn bullet_hits_enemy(
    state: &mut RunState,
    profile: &PlayerProfile,
    config: &BalanceConfig,
    bullet: Handle,
    target: EnemyRef,
) {
    if !state.enemies.is_live(target) || !state.player_bullets.is_live(bullet) {
        return;
    }
    state.player_bullets.release(bullet);

    let damage = state.stats.damage_multiplier;
    let now = state.elapsed_ms;
    let Some(enemy) = state.enemies.get_mut(target) else {
        return;
    };
    enemy.hp -= damage;
    if enemy.hp > 0.0 {
        let previous = enemy.flash_timer.take();
        if let Some(timer) = previous {
            state.timers.cancel(timer);
        }
        let timer = state
            .timers
            .schedule(now, config.combat.hit_flash_ms, TimerKind::HitFlashRevert(target));
        if let Some(enemy) = state.enemies.get_mut(target) {
            enemy.flashing = true;
            enemy.flash_timer = Some(timer);
        }
        state.emit(GameEvent::sound(SoundEffect::EnemyHit));
        return;
    }
    kill_enemy(state, profile, config, target);
}

/// Score the kill, roll loot and release the enemy
fn kill_enemy(state: &mut RunState, profile: &PlayerProfile, config: &BalanceConfig, target: EnemyRef) {
    let Some(enemy) = state.release_enemy(target) else {
        return;
    };
    let variant = config.variants.get(enemy.variant);
    let progression = &config.progression;

    let points = progression.score_per_kill as f64 * variant.score_multiplier as f64 * state.stats.score_multiplier as f64;
    state.score = state.score.saturating_add(points.round() as u64);
    state.emit(GameEvent::UpdateScore { value: state.score });
    state.emit(GameEvent::sound(SoundEffect::EnemyExplode));

    let gold_roll = state.rng.random_bool(progression.gold_drop_chance.clamp(0.0, 1.0));
    let fuel_roll = state.rng.random_bool(progression.fuel_drop_chance.clamp(0.0, 1.0));
    let powerup_roll = !state.powerup.is_active()
        && state.rng.random_bool(progression.powerup_drop_chance.clamp(0.0, 1.0));

    let xp = DropKind::Xp(progression.xp_per_pickup);
    spawn_fan(state, config, enemy.pos, xp, variant.xp_multiplier);
    if gold_roll {
        let gold = DropKind::Gold(progression.gold_per_drop);
        spawn_fan(state, config, enemy.pos, gold, variant.gold_multiplier);
    }
    if fuel_roll {
        spawn_fan(state, config, enemy.pos, DropKind::Fuel(progression.fuel_per_pickup), 1);
    }
    let powerup = if powerup_roll {
        config.powerup.kinds.choose(&mut state.rng).copied()
    } else {
        None
    };
    if let Some(kind) = powerup {
        let drop = Drop {
            kind: DropKind::Powerup(kind),
            pos: enemy.pos,
            vel: Vec2::new(0.0, progression.drop_velocity_y),
            magnetized: false,
        };
        if state.powerups.acquire(drop).is_none() {
            log::trace!("Powerup pool exhausted, drop skipped");
        }
    }
    log::trace!(
        "Killed {} (level {} player), score {}",
        enemy.variant.as_str(),
        profile.level,
        state.score
    );
}

/// Spawn `count` drops spread horizontally around `origin`
fn spawn_fan(state: &mut RunState, config: &BalanceConfig, origin: Vec2, kind: DropKind, count: u32) {
    let spacing = config.progression.drop_spacing;
    let center = (count.saturating_sub(1)) as f32 / 2.0;
    for i in 0..count {
        let offset = (i as f32 - center) * spacing;
        let drop = Drop {
            kind,
            pos: origin + Vec2::new(offset, 0.0),
            vel: Vec2::new(offset, config.progression.drop_velocity_y),
            magnetized: false,
        };
        if state.drops.acquire(drop).is_none() {
            log::trace!("Drop pool exhausted, {} drops skipped", count - i);
            return;
        }
    }
}

/// Fixed collision damage, revive or death
fn player_hit(state: &mut RunState, profile: &PlayerProfile, config: &BalanceConfig) -> Outcome {
    if state.is_invulnerable() {
        return Outcome::Nothing;
    }
    let player = &mut state.player;
    player.current_health -= config.combat.collision_damage;
    state.emit(GameEvent::sound(SoundEffect::PlayerHit));

    if state.player.current_health > 0.0 {
        emit_health(state, profile);
        return Outcome::Nothing;
    }

    if profile.upgrades.revive && !state.player.revive_used {
        let timer = state.timers.schedule(
            state.elapsed_ms,
            config.combat.revive_invulnerability_ms,
            TimerKind::ReviveInvulnerabilityEnd,
        );
        let player = &mut state.player;
        player.revive_used = true;
        player.current_health = profile.max_health * config.combat.revive_health_fraction;
        player.revive_invulnerable = true;
        player.revive_timer = Some(timer);
        log::info!("Revived at {} health", state.player.current_health);
        state.emit(GameEvent::Revived);
        emit_health(state, profile);
        return Outcome::Nothing;
    }

    state.player.current_health = 0.0;
    emit_health(state, profile);
    Outcome::PlayerDown
}

fn emit_health(state: &mut RunState, profile: &PlayerProfile) {
    state.emit(GameEvent::UpdateHealth {
        current: state.player.current_health,
        max: profile.max_health,
    });
}

/// Apply a pickup's effect
fn collect(state: &mut RunState, profile: &mut PlayerProfile, config: &BalanceConfig, kind: DropKind) -> Outcome {
    match kind {
        DropKind::Xp(amount) => {
            let leveled = add_xp(profile, amount, state.stats.xp_multiplier, &config.level_up);
            state.emit(GameEvent::sound(SoundEffect::XpPickup));
            state.emit(GameEvent::UpdateXp {
                current: profile.xp,
                required: profile.xp_to_next_level,
            });
            if leveled {
                return Outcome::LeveledUp;
            }
        }
        DropKind::Gold(amount) => {
            profile.gold = profile
                .gold
                .saturating_add(amount.saturating_mul(profile.gold_multiplier as u64));
            state.emit(GameEvent::sound(SoundEffect::GoldPickup));
            state.emit(GameEvent::UpdateGold { value: profile.gold });
        }
        DropKind::Fuel(amount) => {
            state.fuel = (state.fuel + amount).min(profile.max_fuel);
            if state.fuel > 0.0 {
                state.can_move = true;
            }
            state.emit(GameEvent::sound(SoundEffect::DropPickup));
            state.emit(GameEvent::UpdateFuel { current: state.fuel });
        }
        DropKind::Powerup(kind) => {
            let now = state.elapsed_ms;
            let preempted = state
                .powerup
                .activate(kind, &mut state.stats, &mut state.timers, now, &config.powerup);
            if let Some(previous) = preempted {
                log::debug!("{} replaced {}", kind.as_str(), previous.as_str());
            }
            state.emit(GameEvent::sound(SoundEffect::DropPickup));
            state.emit(GameEvent::PowerupActivated { kind });
        }
    }
    Outcome::Nothing
}

fn outside(pos: Vec2, config: &BalanceConfig) -> bool {
    let margin = config.spawn.cleanup_margin;
    pos.x < -margin || pos.x > config.arena.width + margin || pos.y < -margin || pos.y > config.arena.height + margin
}

/// Release every pooled object beyond the cleanup margin
///
/// Enemies spawn above the top edge, so the margin must exceed the spawn
/// offset. Returns the number of released objects.
pub fn sweep_out_of_bounds(state: &mut RunState, config: &BalanceConfig) -> usize {
    let mut released = 0;

    let enemies: Vec<EnemyRef> = state
        .enemies
        .iter()
        .filter(|(_, e)| outside(e.pos, config))
        .map(|(r, _)| r)
        .collect();
    for r in enemies {
        if state.release_enemy(r).is_some() {
            released += 1;
        }
    }

    for pool in [
        &mut state.player_bullets,
        &mut state.enemy_bullets,
    ] {
        let gone: Vec<Handle> = pool
            .iter()
            .filter(|(_, b)| outside(b.pos, config))
            .map(|(h, _)| h)
            .collect();
        released += gone.into_iter().filter(|h| pool.release(*h).is_some()).count();
    }

    for pool in [&mut state.drops, &mut state.powerups] {
        let gone: Vec<Handle> = pool
            .iter()
            .filter(|(_, d)| outside(d.pos, config))
            .map(|(h, _)| h)
            .collect();
        released += gone.into_iter().filter(|h| pool.release(*h).is_some()).count();
    }

    released
}
