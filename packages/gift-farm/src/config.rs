//! Engine configuration.

use gift_farm_types::TonAddress;
use serde::Deserialize;
use std::time::Duration;

use crate::ledger::FarmingRates;

const NANO_PER_TON: u64 = 1_000_000_000;
const MS_PER_HOUR: u64 = 3_600_000;
const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// Configuration for a farming session.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "defaults::store_path")]
    pub store_path: String,

    #[serde(default)]
    pub farming: FarmingConfig,

    #[serde(default)]
    pub subscription: SubscriptionConfig,

    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Collections whose NFTs may farm.
    #[serde(default = "defaults::collections")]
    pub collections: Vec<CollectionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FarmingConfig {
    #[serde(default = "defaults::base_rate_per_hour")]
    pub base_rate_per_hour: f64,

    #[serde(default = "defaults::cap_hours")]
    pub cap_hours: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionConfig {
    #[serde(default = "defaults::multiplier")]
    pub multiplier: f64,

    #[serde(default = "defaults::duration_days")]
    pub duration_days: u64,

    #[serde(default = "defaults::price_ton")]
    pub price_ton: u64,

    /// Address receiving subscription payments.
    #[serde(default = "defaults::recipient")]
    pub recipient: String,

    /// Seconds the wallet has to sign the transfer.
    #[serde(default = "defaults::payment_window_secs")]
    pub payment_window_secs: u64,

    #[serde(default = "defaults::payload")]
    pub payload: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "defaults::page_limit")]
    pub page_limit: u32,

    #[serde(default = "defaults::timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollectionEntry {
    pub address: String,
    pub name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: defaults::store_path(),
            farming: FarmingConfig::default(),
            subscription: SubscriptionConfig::default(),
            inventory: InventoryConfig::default(),
            collections: defaults::collections(),
        }
    }
}

impl Default for FarmingConfig {
    fn default() -> Self {
        Self {
            base_rate_per_hour: defaults::base_rate_per_hour(),
            cap_hours: defaults::cap_hours(),
        }
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            multiplier: defaults::multiplier(),
            duration_days: defaults::duration_days(),
            price_ton: defaults::price_ton(),
            recipient: defaults::recipient(),
            payment_window_secs: defaults::payment_window_secs(),
            payload: defaults::payload(),
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            api_key: None,
            page_limit: defaults::page_limit(),
            timeout_secs: defaults::timeout_secs(),
        }
    }
}

impl FarmingConfig {
    pub fn rates(&self) -> FarmingRates {
        FarmingRates {
            base_rate_per_hour: self.base_rate_per_hour,
            cap: Duration::from_millis(self.cap_hours.saturating_mul(MS_PER_HOUR)),
        }
    }
}

impl SubscriptionConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_days.saturating_mul(MS_PER_DAY))
    }

    pub fn price_nano(&self) -> u64 {
        self.price_ton.saturating_mul(NANO_PER_TON)
    }
}

impl Config {
    /// Reject values that would make accrual or checkout meaningless.
    pub fn validate(&self) -> Result<(), crate::Error> {
        let farming = &self.farming;
        if !(farming.base_rate_per_hour.is_finite() && farming.base_rate_per_hour > 0.0) {
            return Err(crate::Error::Config(format!(
                "farming.base_rate_per_hour must be positive, got {}",
                farming.base_rate_per_hour
            )));
        }
        if farming.cap_hours == 0 {
            return Err(crate::Error::Config("farming.cap_hours must be positive".into()));
        }
        // Accrual works in u64 milliseconds.
        if farming.cap_hours.checked_mul(MS_PER_HOUR).is_none() {
            return Err(crate::Error::Config(format!(
                "farming.cap_hours out of range, got {}",
                farming.cap_hours
            )));
        }

        let sub = &self.subscription;
        if !(sub.multiplier.is_finite() && sub.multiplier >= 1.0) {
            return Err(crate::Error::Config(format!(
                "subscription.multiplier must be at least 1, got {}",
                sub.multiplier
            )));
        }
        if sub.duration_days == 0 {
            return Err(crate::Error::Config(
                "subscription.duration_days must be positive".into(),
            ));
        }
        if sub.duration_days.checked_mul(MS_PER_DAY).is_none() {
            return Err(crate::Error::Config(format!(
                "subscription.duration_days out of range, got {}",
                sub.duration_days
            )));
        }
        TonAddress::parse(&sub.recipient).map_err(|e| {
            crate::Error::Config(format!("subscription.recipient {}: {e}", sub.recipient))
        })?;

        if self.collections.is_empty() {
            return Err(crate::Error::Config("collections must not be empty".into()));
        }
        for entry in &self.collections {
            TonAddress::parse(&entry.address).map_err(|e| {
                crate::Error::Config(format!("collection {} ({}): {e}", entry.name, entry.address))
            })?;
        }
        Ok(())
    }
}

mod defaults {
    use super::CollectionEntry;

    pub fn store_path() -> String {
        "./gift-farm-state.json".into()
    }

    pub fn base_rate_per_hour() -> f64 {
        1.0
    }

    pub fn cap_hours() -> u64 {
        12
    }

    pub fn multiplier() -> f64 {
        1.5
    }

    pub fn duration_days() -> u64 {
        30
    }

    pub fn price_ton() -> u64 {
        10
    }

    pub fn recipient() -> String {
        "EQDrjaLahLkMB-hMCmkzOyBuHJ139ZUYmPHu6RRBKnbdLIYI".into()
    }

    pub fn payment_window_secs() -> u64 {
        300
    }

    pub fn payload() -> String {
        "Subscription payment".into()
    }

    pub fn endpoint() -> String {
        "https://tonapi.io/v1".into()
    }

    pub fn page_limit() -> u32 {
        1000
    }

    pub fn timeout_secs() -> u64 {
        10
    }

    pub fn collections() -> Vec<CollectionEntry> {
        [
            "EQC6zjid8vJNEWqcXk10XjsdDLRKbcPZzbHusuEW6FokOWIm",
            "EQD6mH9bwbn6S3M_tCRWOvqAIW8M34kRwbI01niGLRPeDPsl",
            "EQBMcfMAZlMUr1W3X8kdEw3fJMUAaWH4-XcmE5R5RfFIY0E2",
            "EQDQ6DjRabTYSAxf2xrZsnsXtqcIm1bj9dF5x_h8lNjWPmH4",
            "EQCefrjhCD2_7HRIr2lmwt9ZaqeG_tdseBvADC66833kBS3y",
            "EQBD8aBKC4NsnYMqtkCfPQk2EVnieynJQp1UgZVyx1VmR5Ml",
            "EQCBK_JBASAA5XVz1D17Pn--kQaMWm0b9wReVtsEdRO4Tgy9",
            "EQAwzubeoJwnqmmBuTPpnUSurRzWPB8ERzcfzx55Z2YjE0jx",
            "EQCwEFfUbbR-22fn3VgxUpBil7bwBQqEHm7wgQYbWY9c08YJ",
            "EQAaTIR7oJyowDiumYLVN0oe61kGE3I6EPEn7WgHPGuWAeCy",
        ]
        .iter()
        .enumerate()
        .map(|(i, address)| CollectionEntry {
            address: (*address).into(),
            name: format!("TON NFT Collection {}", i + 1),
        })
        .collect()
    }
}
