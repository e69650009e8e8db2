//! Per-NFT farming ledger.
//!
//! Each NFT is either IDLE (no record, or `isStaking == false`) or STAKING
//! (`isStaking == true` with a start time). `start_farming` moves IDLE to
//! STAKING, `collect_reward` and its gated form `collect_if_ready` move
//! STAKING back to IDLE. Nothing else writes.
//!
//! The accrued amount is never stored: it is recomputed from the start time,
//! the clock and the current subscription multiplier, saturating at the cap.
//! Start times come from the local clock and are trusted as-is.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::locks::AddressLocks;
use crate::metrics::METRICS;
use crate::store::{clear_corrupt, farming_key, load_record, save_record, Store};
use crate::subscription::SubscriptionModule;
use crate::Error;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Accrual parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FarmingRates {
    /// Reward units per hour before the subscription multiplier.
    pub base_rate_per_hour: f64,
    /// Farming cycle length; accrual stops growing here and collection opens.
    pub cap: Duration,
}

impl Default for FarmingRates {
    fn default() -> Self {
        Self {
            base_rate_per_hour: 1.0,
            cap: Duration::from_secs(12 * 3_600),
        }
    }
}

impl FarmingRates {
    pub fn cap_ms(&self) -> u64 {
        self.cap.as_millis() as u64
    }

    /// `min(elapsed, cap) * rate`, in reward units.
    pub fn accrued(&self, elapsed_ms: u64, multiplier: f64) -> f64 {
        let hours = elapsed_ms.min(self.cap_ms()) as f64 / MS_PER_HOUR;
        hours * self.base_rate_per_hour * multiplier
    }

    /// Reward for a full cycle.
    pub fn max_reward(&self, multiplier: f64) -> f64 {
        self.accrued(self.cap_ms(), multiplier)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmingRecord {
    pub is_staking: bool,
    /// UNIX ms. Required while staking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
}

impl FarmingRecord {
    pub fn staking(start_time: u64) -> Self {
        Self {
            is_staking: true,
            start_time: Some(start_time),
        }
    }

    /// Time since the start; zero for a start time in the future.
    fn elapsed_ms(&self, now_ms: u64) -> u64 {
        self.start_time
            .map_or(0, |start| now_ms.saturating_sub(start))
    }
}

/// One consistent view of an NFT, derived from a single record read and a
/// single clock reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FarmingSnapshot {
    pub record: Option<FarmingRecord>,
    pub accumulated: f64,
    pub can_collect: bool,
}

/// Result of [`FarmingLedger::collect_if_ready`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollectOutcome {
    /// Nothing staking; nothing written.
    Idle,
    /// Still inside the cycle; nothing written.
    NotReady(Duration),
    /// Record removed; the accrued amount.
    Collected(f64),
}

pub struct FarmingLedger {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    subscription: Arc<SubscriptionModule>,
    rates: FarmingRates,
    partition: String,
    locks: AddressLocks,
}

impl FarmingLedger {
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        subscription: Arc<SubscriptionModule>,
        rates: FarmingRates,
        partition: &str,
    ) -> Self {
        Self {
            store,
            clock,
            subscription,
            rates,
            partition: partition.to_string(),
            locks: AddressLocks::default(),
        }
    }

    pub fn rates(&self) -> &FarmingRates {
        &self.rates
    }

    // --- Reads ---

    /// Stored record, if any. Malformed records read as absent.
    pub fn farming_state(&self, nft_address: &str) -> Result<Option<FarmingRecord>, Error> {
        let key = farming_key(&self.partition, nft_address);
        let record: Option<FarmingRecord> = load_record(self.store.as_ref(), &key)?;
        match record {
            Some(record) if record.is_staking && record.start_time.is_none() => {
                clear_corrupt(self.store.as_ref(), &key, "staking without startTime".into());
                Ok(None)
            }
            other => {
                debug!(nft = nft_address, record = ?other, "Farming state read");
                Ok(other)
            }
        }
    }

    pub fn is_staking(&self, nft_address: &str) -> Result<bool, Error> {
        Ok(self.staking_record(nft_address)?.is_some())
    }

    /// Reward accrued so far at the current multiplier. Zero when idle.
    pub fn accumulated(&self, nft_address: &str) -> Result<f64, Error> {
        let Some(record) = self.staking_record(nft_address)? else {
            return Ok(0.0);
        };
        let multiplier = self.subscription.multiplier()?;
        Ok(self
            .rates
            .accrued(record.elapsed_ms(self.clock.now_ms()), multiplier))
    }

    /// Staking for at least a full cycle.
    pub fn can_collect(&self, nft_address: &str) -> Result<bool, Error> {
        let now = self.clock.now_ms();
        Ok(self
            .staking_record(nft_address)?
            .is_some_and(|record| record.elapsed_ms(now) >= self.rates.cap_ms()))
    }

    /// Time left in the cycle; `None` when idle, zero once collectable.
    pub fn time_until_collectable(&self, nft_address: &str) -> Result<Option<Duration>, Error> {
        let now = self.clock.now_ms();
        Ok(self.staking_record(nft_address)?.map(|record| {
            let left = self.rates.cap_ms().saturating_sub(record.elapsed_ms(now));
            Duration::from_millis(left)
        }))
    }

    /// Record, accrual and collectability as of one instant.
    pub fn snapshot(&self, nft_address: &str) -> Result<FarmingSnapshot, Error> {
        let record = self.farming_state(nft_address)?;
        let Some(staking) = record.filter(|r| r.is_staking) else {
            return Ok(FarmingSnapshot {
                record,
                accumulated: 0.0,
                can_collect: false,
            });
        };
        let elapsed = staking.elapsed_ms(self.clock.now_ms());
        let multiplier = self.subscription.multiplier()?;
        Ok(FarmingSnapshot {
            record,
            accumulated: self.rates.accrued(elapsed, multiplier),
            can_collect: elapsed >= self.rates.cap_ms(),
        })
    }

    // --- Writes ---

    /// IDLE → STAKING. Returns `false` (and keeps the first start time)
    /// when the NFT is already staking.
    pub fn start_farming(&self, nft_address: &str) -> Result<bool, Error> {
        self.locks.with_lock(nft_address, || -> Result<_, Error> {
            if let Some(record) = self.staking_record(nft_address)? {
                debug!(nft = nft_address, start_time = ?record.start_time, "Already farming");
                return Ok(false);
            }

            let start_time = self.clock.now_ms();
            let key = farming_key(&self.partition, nft_address);
            save_record(self.store.as_ref(), &key, &FarmingRecord::staking(start_time))?;

            METRICS.record_start();
            info!(nft = nft_address, start_time, "Farming started");
            Ok(true)
        })
    }

    /// STAKING → IDLE, returning the accrued amount. Idle NFTs yield 0 and
    /// nothing is written. No cycle gate; see [`Self::collect_if_ready`].
    pub fn collect_reward(&self, nft_address: &str) -> Result<f64, Error> {
        self.locks.with_lock(nft_address, || -> Result<_, Error> {
            let Some(record) = self.staking_record(nft_address)? else {
                return Ok(0.0);
            };
            self.settle(nft_address, &record, self.clock.now_ms())
        })
    }

    /// Gated collect. The full-cycle check and the removal run under one
    /// per-NFT lock.
    pub fn collect_if_ready(&self, nft_address: &str) -> Result<CollectOutcome, Error> {
        self.locks.with_lock(nft_address, || -> Result<_, Error> {
            let Some(record) = self.staking_record(nft_address)? else {
                return Ok(CollectOutcome::Idle);
            };
            let now = self.clock.now_ms();
            let left = self.rates.cap_ms().saturating_sub(record.elapsed_ms(now));
            if left > 0 {
                return Ok(CollectOutcome::NotReady(Duration::from_millis(left)));
            }
            self.settle(nft_address, &record, now)
                .map(CollectOutcome::Collected)
        })
    }

    /// Caller holds the lock for `nft_address`.
    fn settle(&self, nft_address: &str, record: &FarmingRecord, now_ms: u64) -> Result<f64, Error> {
        let multiplier = self.subscription.multiplier()?;
        let amount = self.rates.accrued(record.elapsed_ms(now_ms), multiplier);

        let key = farming_key(&self.partition, nft_address);
        self.store.remove(&key)?;

        METRICS.record_collect(amount);
        info!(nft = nft_address, amount, multiplier, "Reward collected");
        Ok(amount)
    }

    fn staking_record(&self, nft_address: &str) -> Result<Option<FarmingRecord>, Error> {
        Ok(self
            .farming_state(nft_address)?
            .filter(|record| record.is_staking))
    }
}
