//! Between-run upgrade shop

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::progression::PlayerProfile;
use crate::tuning::BalanceConfig;

/// Items on sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopItem {
    GoldValue,
    Health,
    FireRate,
    Fuel,
    Magnetic,
    XpGain,
    Damage,
    ExtraShooter,
    Revive,
}

impl ShopItem {
    pub const ALL: [ShopItem; 9] = [
        ShopItem::GoldValue,
        ShopItem::Health,
        ShopItem::FireRate,
        ShopItem::Fuel,
        ShopItem::Magnetic,
        ShopItem::XpGain,
        ShopItem::Damage,
        ShopItem::ExtraShooter,
        ShopItem::Revive,
    ];

    pub fn cost(&self, config: &BalanceConfig) -> u64 {
        let shop = &config.shop;
        match self {
            ShopItem::GoldValue => shop.gold_value_cost,
            ShopItem::Health => shop.health_cost,
            ShopItem::FireRate => shop.fire_rate_cost,
            ShopItem::Fuel => shop.fuel_cost,
            ShopItem::Magnetic => shop.magnetic_cost,
            ShopItem::XpGain => shop.xp_gain_cost,
            ShopItem::Damage => shop.damage_cost,
            ShopItem::ExtraShooter => shop.extra_shooter_cost,
            ShopItem::Revive => shop.revive_cost,
        }
    }

    /// One-time upgrades cannot be bought twice
    pub fn is_one_time(&self) -> bool {
        matches!(self, ShopItem::ExtraShooter | ShopItem::Revive)
    }

    pub fn is_owned(&self, profile: &PlayerProfile) -> bool {
        match self {
            ShopItem::ExtraShooter => profile.upgrades.extra_shooter,
            ShopItem::Revive => profile.upgrades.revive,
            _ => false,
        }
    }
}

/// Why a purchase was refused; the profile is untouched in every case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("insufficient gold: need {cost}, have {gold}")]
    InsufficientGold { cost: u64, gold: u64 },
    #[error("already owned")]
    AlreadyOwned,
    #[error("fire rate already at minimum")]
    FireRateAtMinimum,
}

/// A completed purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub item: ShopItem,
    pub cost: u64,
    pub gold_left: u64,
}

/// Buy `item`, spending gold and applying its stat change
pub fn purchase(profile: &mut PlayerProfile, config: &BalanceConfig, item: ShopItem) -> Result<Receipt, PurchaseError> {
    if item.is_owned(profile) {
        return Err(PurchaseError::AlreadyOwned);
    }
    let cost = item.cost(config);
    if profile.gold < cost {
        return Err(PurchaseError::InsufficientGold {
            cost,
            gold: profile.gold,
        });
    }
    let floor = config.level_up.fire_rate_min;
    if item == ShopItem::FireRate && profile.fire_rate_ms <= floor {
        return Err(PurchaseError::FireRateAtMinimum);
    }

    let shop = &config.shop;
    profile.gold -= cost;
    match item {
        ShopItem::GoldValue => profile.gold_multiplier += 1,
        ShopItem::Health => profile.max_health += shop.health_amount,
        ShopItem::FireRate => {
            profile.fire_rate_ms = (profile.fire_rate_ms - shop.fire_rate_amount).max(floor);
        }
        ShopItem::Fuel => profile.max_fuel += shop.fuel_amount,
        ShopItem::Magnetic => profile.magnetic_radius += shop.magnetic_amount,
        ShopItem::XpGain => profile.xp_multiplier += shop.xp_gain_percent / 100.0,
        ShopItem::Damage => profile.damage_multiplier += shop.damage_amount,
        ShopItem::ExtraShooter => profile.upgrades.extra_shooter = true,
        ShopItem::Revive => profile.upgrades.revive = true,
    }

    Ok(Receipt {
        item,
        cost,
        gold_left: profile.gold,
    })
}
