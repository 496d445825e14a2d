//! Temporary powerup effects
//!
//! At most one powerup is active. Its effect is applied to the run's
//! [`LiveStats`], never to the persistent profile, and the pre-activation
//! value of the affected field is kept so expiry restores exactly what was
//! there before. Collecting a second powerup while one is active reverts
//! the first before applying the second.

use serde::{Deserialize, Serialize};

use super::progression::PlayerProfile;
use super::timer::{Scheduler, TimerId, TimerKind};
use crate::tuning::PowerupTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerupKind {
    SprayShot,
    DoubleDamage,
    RapidFire,
    DoubleXp,
    TripleScore,
    Shield,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 6] = [
        PowerupKind::SprayShot,
        PowerupKind::DoubleDamage,
        PowerupKind::RapidFire,
        PowerupKind::DoubleXp,
        PowerupKind::TripleScore,
        PowerupKind::Shield,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerupKind::SprayShot => "spray_shot",
            PowerupKind::DoubleDamage => "double_damage",
            PowerupKind::RapidFire => "rapid_fire",
            PowerupKind::DoubleXp => "double_xp",
            PowerupKind::TripleScore => "triple_score",
            PowerupKind::Shield => "shield",
        }
    }
}

/// Per-run combat stats: profile values plus any powerup effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveStats {
    pub damage_multiplier: f32,
    pub fire_rate_ms: f32,
    pub xp_multiplier: f32,
    pub score_multiplier: f32,
    pub spray_shot: bool,
    pub shielded: bool,
}

impl LiveStats {
    pub fn from_profile(profile: &PlayerProfile) -> Self {
        Self {
            damage_multiplier: profile.damage_multiplier,
            fire_rate_ms: profile.fire_rate_ms,
            xp_multiplier: profile.xp_multiplier,
            score_multiplier: 1.0,
            spray_shot: false,
            shielded: false,
        }
    }
}

/// Value of the affected field before the effect was applied
#[derive(Debug, Clone, Copy, PartialEq)]
enum Baseline {
    Flag(bool),
    Value(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Active {
    kind: PowerupKind,
    timer: TimerId,
    expires_at_ms: f64,
    baseline: Baseline,
}

fn apply(kind: PowerupKind, stats: &mut LiveStats, rapid_fire_floor_ms: f32) -> Baseline {
    match kind {
        PowerupKind::SprayShot => {
            let before = Baseline::Flag(stats.spray_shot);
            stats.spray_shot = true;
            before
        }
        PowerupKind::DoubleDamage => {
            let before = Baseline::Value(stats.damage_multiplier);
            stats.damage_multiplier *= 2.0;
            before
        }
        PowerupKind::RapidFire => {
            let before = Baseline::Value(stats.fire_rate_ms);
            stats.fire_rate_ms = (stats.fire_rate_ms / 2.0).floor().max(rapid_fire_floor_ms);
            before
        }
        PowerupKind::DoubleXp => {
            let before = Baseline::Value(stats.xp_multiplier);
            stats.xp_multiplier *= 2.0;
            before
        }
        PowerupKind::TripleScore => {
            let before = Baseline::Value(stats.score_multiplier);
            stats.score_multiplier = 3.0;
            before
        }
        PowerupKind::Shield => {
            let before = Baseline::Flag(stats.shielded);
            stats.shielded = true;
            before
        }
    }
}

fn revert(kind: PowerupKind, baseline: Baseline, stats: &mut LiveStats) {
    match (kind, baseline) {
        (PowerupKind::SprayShot, Baseline::Flag(v)) => stats.spray_shot = v,
        (PowerupKind::Shield, Baseline::Flag(v)) => stats.shielded = v,
        (PowerupKind::DoubleDamage, Baseline::Value(v)) => stats.damage_multiplier = v,
        (PowerupKind::RapidFire, Baseline::Value(v)) => stats.fire_rate_ms = v,
        (PowerupKind::DoubleXp, Baseline::Value(v)) => stats.xp_multiplier = v,
        (PowerupKind::TripleScore, Baseline::Value(v)) => stats.score_multiplier = v,
        (kind, baseline) => log::error!("Powerup {kind:?} has mismatched baseline {baseline:?}"),
    }
}

/// Activation state of the single powerup slot
#[derive(Debug, Clone, Default)]
pub struct PowerupMachine {
    active: Option<Active>,
}

impl PowerupMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<PowerupKind> {
        self.active.map(|a| a.kind)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn expires_at_ms(&self) -> Option<f64> {
        self.active.map(|a| a.expires_at_ms)
    }

    /// Start `kind`, preempting any active powerup
    ///
    /// Returns the preempted kind, whose effect has been reverted and whose
    /// expiry timer has been cancelled.
    pub fn activate(
        &mut self,
        kind: PowerupKind,
        stats: &mut LiveStats,
        timers: &mut Scheduler,
        now_ms: f64,
        tuning: &PowerupTuning,
    ) -> Option<PowerupKind> {
        let preempted = self.cancel(stats, timers);
        let baseline = apply(kind, stats, tuning.rapid_fire_floor_ms);
        let timer = timers.schedule(now_ms, tuning.duration_ms, TimerKind::PowerupExpiry);
        self.active = Some(Active {
            kind,
            timer,
            expires_at_ms: now_ms + tuning.duration_ms,
            baseline,
        });
        log::debug!("Powerup {} active until {:.0}ms", kind.as_str(), now_ms + tuning.duration_ms);
        preempted
    }

    /// Handle a fired expiry timer; stale timers are ignored
    pub fn on_expiry(&mut self, timer: TimerId, stats: &mut LiveStats) -> Option<PowerupKind> {
        let active = self.active.filter(|a| a.timer == timer)?;
        revert(active.kind, active.baseline, stats);
        self.active = None;
        Some(active.kind)
    }

    /// Revert the active effect now and cancel its timer
    pub fn cancel(&mut self, stats: &mut LiveStats, timers: &mut Scheduler) -> Option<PowerupKind> {
        let active = self.active.take()?;
        timers.cancel(active.timer);
        revert(active.kind, active.baseline, stats);
        Some(active.kind)
    }

    /// Rebuild live stats from a freshly leveled profile, keeping the effect
    ///
    /// The active effect is re-applied on top of the new values and its
    /// baseline captured again, so expiry lands on the leveled stats. The
    /// expiry timer keeps running.
    pub fn rebase(&mut self, stats: &mut LiveStats, fresh: LiveStats, tuning: &PowerupTuning) {
        *stats = fresh;
        if let Some(active) = self.active.as_mut() {
            active.baseline = apply(active.kind, stats, tuning.rapid_fire_floor_ms);
        }
    }
}
