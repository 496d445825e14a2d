//! Browser facade
//!
//! The JS host owns rendering, input, audio and the animation frame loop. It
//! feeds joystick state and frame time into [`WebGame::frame`] and receives
//! the queued game events as a JSON array.

use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::prelude::*;

use super::LocalStorage;
use crate::consts::{MAX_SUBSTEPS, SIM_DT_MS};
use crate::persistence::ProfileStore;
use crate::settings::Settings;
use crate::sim::{GameEvent, RunController, ShopItem, TickInput, detect_overlaps};
use crate::tuning::{BalanceConfig, BalancePreset};

#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Orbital Decay core loaded");
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_item(name: &str) -> Option<ShopItem> {
    ShopItem::ALL.into_iter().find(|item| {
        serde_json::to_value(item)
            .ok()
            .and_then(|v| v.as_str().map(|s| s == name))
            .unwrap_or(false)
    })
}

/// One game session bound to the page's LocalStorage
#[wasm_bindgen]
pub struct WebGame {
    controller: RunController<LocalStorage>,
    settings: Settings,
    accumulator: f64,
}

#[wasm_bindgen]
impl WebGame {
    /// `balance` is an optional preset name or balance JSON
    #[wasm_bindgen(constructor)]
    pub fn new(balance: Option<String>) -> Result<WebGame, JsValue> {
        let config = match balance.as_deref() {
            None | Some("") => BalanceConfig::default(),
            Some(text) => match BalancePreset::from_str(text) {
                Some(preset) => BalanceConfig::from(preset),
                None => BalanceConfig::from_json(text).map_err(js_error)?,
            },
        };
        let settings = Settings::load(&LocalStorage);
        let store = ProfileStore::new(LocalStorage, Rc::new(config));
        let seed = js_sys::Date::now() as u64;
        Ok(WebGame {
            controller: RunController::new(store, seed),
            settings,
            accumulator: 0.0,
        })
    }

    /// Advance by one rendered frame and return the events as JSON
    pub fn frame(&mut self, dx: f32, dy: f32, active: bool, frame_ms: f64) -> Result<String, JsValue> {
        self.accumulator += frame_ms.clamp(0.0, 100.0);
        let mut substeps = 0;
        while self.accumulator >= SIM_DT_MS && substeps < MAX_SUBSTEPS {
            let input = TickInput {
                direction: Vec2::new(dx, dy),
                active,
                collisions: detect_overlaps(self.controller.state()),
            };
            self.controller.tick(&input, SIM_DT_MS);
            self.accumulator -= SIM_DT_MS;
            substeps += 1;
        }
        self.drain()
    }

    /// Queued events not yet delivered, as JSON
    pub fn drain(&mut self) -> Result<String, JsValue> {
        let events: Vec<GameEvent> = self
            .controller
            .drain_events()
            .into_iter()
            .filter(|e| self.settings.shows(e))
            .collect();
        serde_json::to_string(&events).map_err(js_error)
    }

    /// Level-up modal closed
    pub fn resume(&mut self) {
        self.controller.resume();
    }

    pub fn restart(&mut self) {
        self.accumulator = 0.0;
        self.controller.restart(js_sys::Date::now() as u64);
    }

    pub fn reset_profile(&mut self) {
        self.accumulator = 0.0;
        self.controller.reset_profile(js_sys::Date::now() as u64);
    }

    /// Buy a shop item by its snake_case name; returns gold left
    pub fn purchase(&mut self, item: &str) -> Result<f64, JsValue> {
        let item = parse_item(item).ok_or_else(|| js_error(format!("unknown shop item `{item}`")))?;
        let receipt = self.controller.purchase(item).map_err(js_error)?;
        Ok(receipt.gold_left as f64)
    }

    pub fn profile_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.controller.profile()).map_err(js_error)
    }

    pub fn high_score(&self) -> f64 {
        self.controller.store().load_high_score() as f64
    }

    pub fn best_distance(&self) -> f64 {
        self.controller.store().load_best_distance() as f64
    }

    pub fn is_game_over(&self) -> bool {
        self.controller.is_game_over()
    }

    pub fn volume(&self, cue_volume: Option<f32>) -> f32 {
        self.settings.effective_volume(cue_volume)
    }

    pub fn settings_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.settings).map_err(js_error)
    }

    pub fn set_settings_json(&mut self, json: &str) -> Result<(), JsValue> {
        self.settings = serde_json::from_str(json).map_err(js_error)?;
        self.settings.save(&mut LocalStorage).map_err(js_error)
    }
}
