//! Prometheus metrics (lock-free atomics, zero allocation on hot path).

use std::sync::atomic::{AtomicU64, Ordering};

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    // --- Farming ---
    pub farming_started: AtomicU64,
    pub rewards_collected: AtomicU64,
    /// Collected reward units × 1000.
    pub reward_units_collected_milli: AtomicU64,

    // --- Persistence ---
    pub corrupt_records_cleared: AtomicU64,

    // --- Collaborators ---
    pub inventory_fetch_errors: AtomicU64,
    pub payments_failed: AtomicU64,
    pub subscriptions_activated: AtomicU64,
}

impl Metrics {
    const fn new() -> Self {
        Self {
            farming_started: AtomicU64::new(0),
            rewards_collected: AtomicU64::new(0),
            reward_units_collected_milli: AtomicU64::new(0),
            corrupt_records_cleared: AtomicU64::new(0),
            inventory_fetch_errors: AtomicU64::new(0),
            payments_failed: AtomicU64::new(0),
            subscriptions_activated: AtomicU64::new(0),
        }
    }

    pub fn record_start(&self) {
        self.farming_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_collect(&self, amount: f64) {
        self.rewards_collected.fetch_add(1, Ordering::Relaxed);
        let milli = (amount.max(0.0) * 1_000.0).round() as u64;
        self.reward_units_collected_milli
            .fetch_add(milli, Ordering::Relaxed);
    }

    pub fn record_corrupt_cleared(&self) {
        self.corrupt_records_cleared.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inventory_error(&self) {
        self.inventory_fetch_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_payment_failed(&self) {
        self.payments_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_subscription_activated(&self) {
        self.subscriptions_activated.fetch_add(1, Ordering::Relaxed);
    }

    /// Render in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let started = self.farming_started.load(Ordering::Relaxed);
        let collected = self.rewards_collected.load(Ordering::Relaxed);
        let units_milli = self.reward_units_collected_milli.load(Ordering::Relaxed);
        let corrupt = self.corrupt_records_cleared.load(Ordering::Relaxed);
        let inventory_errors = self.inventory_fetch_errors.load(Ordering::Relaxed);
        let payments_failed = self.payments_failed.load(Ordering::Relaxed);
        let activated = self.subscriptions_activated.load(Ordering::Relaxed);

        let units = units_milli as f64 / 1_000.0;

        format!(
            "\
# HELP gift_farm_farming_started_total NFTs moved from idle to staking.\n\
# TYPE gift_farm_farming_started_total counter\n\
gift_farm_farming_started_total {started}\n\
# HELP gift_farm_rewards_collected_total Successful reward collections.\n\
# TYPE gift_farm_rewards_collected_total counter\n\
gift_farm_rewards_collected_total {collected}\n\
# HELP gift_farm_reward_units_collected_total Reward units settled by collection.\n\
# TYPE gift_farm_reward_units_collected_total counter\n\
gift_farm_reward_units_collected_total {units:.3}\n\
# HELP gift_farm_corrupt_records_cleared_total Unparsable stored values cleared.\n\
# TYPE gift_farm_corrupt_records_cleared_total counter\n\
gift_farm_corrupt_records_cleared_total {corrupt}\n\
# HELP gift_farm_inventory_fetch_errors_total Failed inventory fetches.\n\
# TYPE gift_farm_inventory_fetch_errors_total counter\n\
gift_farm_inventory_fetch_errors_total {inventory_errors}\n\
# HELP gift_farm_payments_failed_total Subscription payments that failed or were rejected.\n\
# TYPE gift_farm_payments_failed_total counter\n\
gift_farm_payments_failed_total {payments_failed}\n\
# HELP gift_farm_subscriptions_activated_total Subscriptions activated after payment.\n\
# TYPE gift_farm_subscriptions_activated_total counter\n\
gift_farm_subscriptions_activated_total {activated}\n"
        )
    }
}
