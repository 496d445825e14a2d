//! Circle overlap detection
//!
//! Hosts with a physics engine report overlaps themselves. Headless hosts and
//! tests use [`detect_overlaps`], which treats every entity as a circle and
//! reports pairs in a stable order: bullet hits first, then player contacts.

use glam::Vec2;

use super::encounter::Collision;
use super::state::RunState;
use crate::consts::{BULLET_RADIUS, DROP_RADIUS, ENEMY_RADIUS, PLAYER_RADIUS};

#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance_squared(b) <= (ra + rb) * (ra + rb)
}

/// All overlaps in the current state
///
/// A player bullet is reported against at most one enemy.
pub fn detect_overlaps(state: &RunState) -> Vec<Collision> {
    let mut hits = Vec::new();

    for (bullet, b) in state.player_bullets.iter() {
        let target = state
            .enemies
            .iter()
            .find(|(_, e)| circles_overlap(b.pos, BULLET_RADIUS, e.pos, ENEMY_RADIUS));
        if let Some((enemy, _)) = target {
            hits.push(Collision::BulletEnemy { bullet, enemy });
        }
    }

    let player = state.player.pos;
    for (enemy, e) in state.enemies.iter() {
        if circles_overlap(player, PLAYER_RADIUS, e.pos, ENEMY_RADIUS) {
            hits.push(Collision::PlayerEnemy { enemy });
        }
    }
    for (bullet, b) in state.enemy_bullets.iter() {
        if circles_overlap(player, PLAYER_RADIUS, b.pos, BULLET_RADIUS) {
            hits.push(Collision::PlayerEnemyBullet { bullet });
        }
    }
    for (drop, d) in state.drops.iter() {
        if circles_overlap(player, PLAYER_RADIUS, d.pos, DROP_RADIUS) {
            hits.push(Collision::PlayerDrop { drop });
        }
    }
    for (drop, d) in state.powerups.iter() {
        if circles_overlap(player, PLAYER_RADIUS, d.pos, DROP_RADIUS) {
            hits.push(Collision::PlayerPowerup { drop });
        }
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::progression::PlayerProfile;
    use crate::sim::state::{Bullet, Drop, DropKind, Enemy, EnemyVariant};
    use crate::tuning::BalanceConfig;

    fn enemy_at(pos: Vec2) -> Enemy {
        Enemy {
            variant: EnemyVariant::Red,
            hp: 1.0,
            pos,
            vel: Vec2::ZERO,
            flashing: false,
            flash_timer: None,
        }
    }

    #[test]
    fn test_circles_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 1.0, Vec2::new(2.0, 0.0), 1.0));
        assert!(!circles_overlap(Vec2::ZERO, 1.0, Vec2::new(2.1, 0.0), 1.0));
    }

    #[test]
    fn test_detects_each_pair_kind() {
        let config = BalanceConfig::default();
        let profile = PlayerProfile::new(&config);
        let mut state = RunState::new(&config, &profile, 5);
        let player = state.player.pos;

        let target = state.enemies.acquire(enemy_at(Vec2::new(100.0, 100.0))).unwrap();
        state.enemies.acquire(enemy_at(Vec2::new(300.0, 100.0))).unwrap();
        let bullet = state
            .player_bullets
            .acquire(Bullet {
                pos: Vec2::new(100.0, 110.0),
                vel: Vec2::ZERO,
            })
            .unwrap();
        let incoming = state
            .enemy_bullets
            .acquire(Bullet {
                pos: player + Vec2::new(5.0, 0.0),
                vel: Vec2::ZERO,
            })
            .unwrap();
        let orb = state
            .drops
            .acquire(Drop {
                kind: DropKind::Xp(1.0),
                pos: player,
                vel: Vec2::ZERO,
                magnetized: false,
            })
            .unwrap();

        let hits = detect_overlaps(&state);
        assert_eq!(
            hits,
            vec![
                Collision::BulletEnemy { bullet, enemy: target },
                Collision::PlayerEnemyBullet { bullet: incoming },
                Collision::PlayerDrop { drop: orb },
            ]
        );
    }
}
