//! Cancellable run timers
//!
//! Every delayed or repeating callback of a run is an entry in the
//! [`Scheduler`]. Entries are addressed by generation-checked [`TimerId`]s:
//! cancelling twice, or cancelling after the timer fired, does nothing.
//! Callbacks that target a pooled entity carry that entity's handle, and the
//! handler re-checks liveness when the timer fires.

use super::state::EnemyRef;

/// Generation-checked timer reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId {
    index: u32,
    generation: u32,
}

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Enemy spawn cadence (repeating)
    Spawn,
    /// Enemy fire decision cadence (repeating)
    FireDecision,
    /// Fuel/distance clock (repeating)
    FuelTick,
    /// Active powerup runs out
    PowerupExpiry,
    /// Restore an enemy's tint after a hit flash
    HitFlashRevert(EnemyRef),
    /// Post-revive invulnerability ends
    ReviveInvulnerabilityEnd,
}

#[derive(Debug, Clone)]
struct Entry {
    generation: u32,
    due_ms: f64,
    period_ms: Option<f64>,
    kind: Option<TimerKind>,
}

/// A timer that came due during [`Scheduler::advance`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fired {
    pub id: TimerId,
    pub kind: TimerKind,
    pub due_ms: f64,
}

/// All pending timers of one run
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    entries: Vec<Entry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-shot timer firing `delay_ms` after `now_ms`
    pub fn schedule(&mut self, now_ms: f64, delay_ms: f64, kind: TimerKind) -> TimerId {
        self.insert(now_ms + delay_ms, None, kind)
    }

    /// Timer firing every `period_ms`, first after one period
    pub fn schedule_repeating(&mut self, now_ms: f64, period_ms: f64, kind: TimerKind) -> TimerId {
        self.insert(now_ms + period_ms, Some(period_ms.max(f64::EPSILON)), kind)
    }

    fn insert(&mut self, due_ms: f64, period_ms: Option<f64>, kind: TimerKind) -> TimerId {
        let index = match self.entries.iter().position(|e| e.kind.is_none()) {
            Some(i) => i,
            None => {
                self.entries.push(Entry {
                    generation: 0,
                    due_ms: 0.0,
                    period_ms: None,
                    kind: None,
                });
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[index];
        entry.generation = entry.generation.wrapping_add(1);
        entry.due_ms = due_ms;
        entry.period_ms = period_ms;
        entry.kind = Some(kind);
        TimerId {
            index: index as u32,
            generation: entry.generation,
        }
    }

    /// Cancel a pending timer; returns whether anything was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.entries.get_mut(id.index as usize) {
            Some(entry) if entry.generation == id.generation && entry.kind.is_some() => {
                entry.kind = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for entry in &mut self.entries {
            entry.kind = None;
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries
            .get(id.index as usize)
            .is_some_and(|e| e.generation == id.generation && e.kind.is_some())
    }

    pub fn due_at(&self, id: TimerId) -> Option<f64> {
        self.entries
            .get(id.index as usize)
            .filter(|e| e.generation == id.generation && e.kind.is_some())
            .map(|e| e.due_ms)
    }

    pub fn pending(&self) -> usize {
        self.entries.iter().filter(|e| e.kind.is_some()).count()
    }

    /// Pop the earliest timer due at or before `now_ms`
    ///
    /// Repeating timers are rescheduled one period later, so a long frame
    /// yields every missed firing in order. Handlers may schedule or cancel
    /// timers between calls.
    pub fn next_due(&mut self, now_ms: f64) -> Option<Fired> {
        let (index, entry) = self
            .entries
            .iter_mut()
            .enumerate()
            .filter(|(_, e)| e.kind.is_some() && e.due_ms <= now_ms)
            .min_by(|(ia, a), (ib, b)| a.due_ms.total_cmp(&b.due_ms).then(ia.cmp(ib)))?;

        let kind = entry.kind?;
        let fired = Fired {
            id: TimerId {
                index: index as u32,
                generation: entry.generation,
            },
            kind,
            due_ms: entry.due_ms,
        };
        match entry.period_ms {
            Some(period) => entry.due_ms += period,
            None => entry.kind = None,
        }
        Some(fired)
    }
}
