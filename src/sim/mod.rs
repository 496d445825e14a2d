//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Host-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (by pool slot)
//! - No rendering, audio or platform dependencies beyond the `Storage` trait

pub mod collision;
pub mod encounter;
pub mod events;
pub mod pool;
pub mod powerup;
pub mod progression;
pub mod shop;
pub mod state;
pub mod tick;
pub mod timer;
pub mod wave;

pub use collision::detect_overlaps;
pub use encounter::{Collision, Outcome, resolve, sweep_out_of_bounds};
pub use events::{GameEvent, SoundEffect};
pub use pool::{Handle, Pool};
pub use powerup::{LiveStats, PowerupKind, PowerupMachine};
pub use progression::{OwnedUpgrades, PlayerProfile, add_xp, level_up, stats_for_level};
pub use shop::{PurchaseError, Receipt, ShopItem, purchase};
pub use state::{Bullet, Drop, DropKind, Enemy, EnemyRef, EnemyVariant, Player, RunState};
pub use tick::{RunController, TickInput};
pub use timer::{Fired, Scheduler, TimerId, TimerKind};
pub use wave::{Difficulty, difficulty, select_variant, wave_for_elapsed};
