//! Named balance revisions

use serde::{Deserialize, Serialize};

use super::{BalanceConfig, FuelExhaustion, SpawnPolicy};

/// Shipped balance tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalancePreset {
    /// Current tuning: threshold unlocks, fuel exhaustion immobilizes
    #[default]
    Standard,
    /// Early arcade tuning: cyclic waves, fuel exhaustion ends the run
    Legacy,
}

impl BalancePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalancePreset::Standard => "standard",
            BalancePreset::Legacy => "legacy",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" | "default" => Some(BalancePreset::Standard),
            "legacy" | "classic" => Some(BalancePreset::Legacy),
            _ => None,
        }
    }
}

impl From<BalancePreset> for BalanceConfig {
    fn from(preset: BalancePreset) -> Self {
        match preset {
            BalancePreset::Standard => BalanceConfig::default(),
            BalancePreset::Legacy => legacy(),
        }
    }
}

fn legacy() -> BalanceConfig {
    let mut config = BalanceConfig {
        version: 1,
        ..BalanceConfig::default()
    };

    config.player.xp_to_next_level = 50.0;
    config.player.move_speed = 400.0;
    config.player.fire_rate_ms = 200.0;
    config.player.max_health = 100.0;

    config.waves.policy = SpawnPolicy::CyclicByWave;
    config.fuel.exhaustion = FuelExhaustion::EndsRun;
    config.fuel.depletion_per_movement = 0.0;

    // Every variant is reachable through the cycle, so no time gates
    for tier in [
        &mut config.variants.blue,
        &mut config.variants.green,
        &mut config.variants.yellow,
        &mut config.variants.purple,
    ] {
        tier.introduction_time_ms = 0.0;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_names() {
        assert_eq!(BalancePreset::from_str("LEGACY"), Some(BalancePreset::Legacy));
        assert_eq!(BalancePreset::from_str("default"), Some(BalancePreset::Standard));
        assert_eq!(BalancePreset::from_str("nope"), None);
        assert_eq!(BalancePreset::Legacy.as_str(), "legacy");
    }

    #[test]
    fn test_legacy_is_valid() {
        let config = BalanceConfig::from(BalancePreset::Legacy);
        assert!(config.validate().is_ok());
        assert_eq!(config.waves.policy, SpawnPolicy::CyclicByWave);
        assert_eq!(config.fuel.exhaustion, FuelExhaustion::EndsRun);
    }
}
