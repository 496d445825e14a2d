//! Orbital Decay entry point
//!
//! Native builds run a headless autopilot session against the real profile
//! store, which is handy for balance iteration. The browser build is driven
//! from JS through `platform::web::WebGame`.
//!
//! Usage: `orbital-decay [preset | balance.json]`

#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use std::rc::Rc;

    use glam::Vec2;

    use orbital_decay::consts::SIM_DT_MS;
    use orbital_decay::persistence::ProfileStore;
    use orbital_decay::platform::FileStorage;
    use orbital_decay::sim::{GameEvent, RunController, RunState, ShopItem, TickInput, detect_overlaps};
    use orbital_decay::tuning::{BalanceConfig, BalancePreset};

    const SAVE_DIR: &str = ".orbital-decay";
    /// Ten simulated minutes
    const MAX_TICKS: u64 = 36_000;

    fn load_balance(arg: Option<String>) -> Result<BalanceConfig, Box<dyn std::error::Error>> {
        let Some(arg) = arg else {
            return Ok(BalanceConfig::default());
        };
        if let Some(preset) = BalancePreset::from_str(&arg) {
            log::info!("Using {} balance preset", preset.as_str());
            return Ok(preset.into());
        }
        let json = std::fs::read_to_string(&arg)?;
        let config = BalanceConfig::from_json(&json)?;
        log::info!("Loaded balance v{} from {arg}", config.version);
        Ok(config)
    }

    fn nearest(ship: Vec2, points: impl Iterator<Item = Vec2>) -> Option<Vec2> {
        points.min_by(|a, b| a.distance_squared(ship).total_cmp(&b.distance_squared(ship)))
    }

    /// Steer toward loot, away from bullets, under the nearest enemy otherwise
    fn steer(state: &RunState) -> Vec2 {
        let ship = state.player.pos;

        let threat = nearest(ship, state.enemy_bullets.iter().map(|(_, b)| b.pos))
            .filter(|p| p.distance(ship) < 120.0);
        if let Some(threat) = threat {
            let away = (ship.x - threat.x).signum();
            return Vec2::new(if away == 0.0 { 1.0 } else { away }, 0.0);
        }

        let loot = nearest(ship, state.drops.iter().chain(state.powerups.iter()).map(|(_, d)| d.pos));
        if let Some(loot) = loot {
            return (loot - ship).normalize_or_zero();
        }

        let target = nearest(ship, state.enemies.iter().map(|(_, e)| e.pos));
        match target {
            Some(t) if (t.x - ship.x).abs() > 4.0 => Vec2::new((t.x - ship.x).signum(), 0.0),
            _ => Vec2::ZERO,
        }
    }

    fn spend(controller: &mut RunController<FileStorage>) {
        let mut items: Vec<ShopItem> = ShopItem::ALL.to_vec();
        items.sort_by_key(|item| item.cost(controller.config()));
        for item in items {
            match controller.purchase(item) {
                Ok(receipt) => println!("  bought {item:?} ({} gold left)", receipt.gold_left),
                Err(e) => log::debug!("Skipped {item:?}: {e}"),
            }
        }
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let config = load_balance(std::env::args().nth(1))?;
        let storage = FileStorage::new(SAVE_DIR)?;
        let store = ProfileStore::new(storage, Rc::new(config));
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let mut controller = RunController::new(store, seed);
        println!(
            "Orbital Decay autopilot: level {}, gold {}, seed {seed}",
            controller.profile().level,
            controller.profile().gold
        );

        while !controller.is_game_over() && controller.state().time_ticks < MAX_TICKS {
            if controller.is_paused() {
                controller.resume();
            }
            let input = TickInput {
                direction: steer(controller.state()),
                active: true,
                collisions: detect_overlaps(controller.state()),
            };
            controller.tick(&input, SIM_DT_MS);

            for event in controller.drain_events() {
                match event {
                    GameEvent::ShowWaveAnnouncement { wave } => println!("  wave {wave}"),
                    GameEvent::ShowLevelUp { profile } => println!("  level up -> {}", profile.level),
                    GameEvent::FuelDepleted => println!("  out of fuel"),
                    GameEvent::Revived => println!("  revived"),
                    GameEvent::ShowGameOver {
                        score,
                        is_new_high_score,
                    } => {
                        let marker = if is_new_high_score { " (new high score)" } else { "" };
                        println!("Game over: score {score}{marker}");
                    }
                    _ => {}
                }
            }
        }

        let state = controller.state();
        println!(
            "Run ended after {:.1}s: score {}, distance {}, wave {}",
            state.elapsed_ms / 1000.0,
            state.score,
            state.distance,
            state.wave
        );
        if controller.is_game_over() {
            spend(&mut controller);
        }
        let store = controller.finish();
        println!(
            "Records: high score {}, best distance {}",
            store.load_high_score(),
            store.load_best_distance()
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Orbital Decay (native) starting...");
    if let Err(e) = autopilot::run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::wasm_main, this is just to satisfy the compiler
}
