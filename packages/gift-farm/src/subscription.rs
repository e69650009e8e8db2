//! Premium subscription: a time-boxed accrual multiplier.
//!
//! Expiry is lazy. An expired record stays in the store and simply reads as
//! inactive; only [`SubscriptionModule::cancel`] removes it.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

use crate::clock::Clock;
use crate::store::{load_record, save_record, subscription_key, Store};
use crate::Error;

const NO_MULTIPLIER: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub active: bool,
    /// UNIX ms.
    pub started_at: u64,
    /// UNIX ms.
    pub expires_at: u64,
}

impl SubscriptionRecord {
    pub fn is_active_at(&self, now_ms: u64) -> bool {
        self.active && now_ms < self.expires_at
    }
}

pub struct SubscriptionModule {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    key: String,
    multiplier: f64,
    /// Serializes activate/cancel.
    write_lock: Mutex<()>,
}

impl SubscriptionModule {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, partition: &str, multiplier: f64) -> Self {
        Self {
            store,
            clock,
            key: subscription_key(partition),
            multiplier,
            write_lock: Mutex::new(()),
        }
    }

    pub fn info(&self) -> Result<Option<SubscriptionRecord>, Error> {
        load_record(self.store.as_ref(), &self.key)
    }

    pub fn is_active(&self) -> Result<bool, Error> {
        let now = self.clock.now_ms();
        Ok(self.info()?.is_some_and(|record| record.is_active_at(now)))
    }

    /// Accrual multiplier in effect right now.
    pub fn multiplier(&self) -> Result<f64, Error> {
        Ok(if self.is_active()? {
            self.multiplier
        } else {
            NO_MULTIPLIER
        })
    }

    /// Time left on an active subscription.
    pub fn remaining(&self) -> Result<Option<Duration>, Error> {
        let now = self.clock.now_ms();
        Ok(self
            .info()?
            .filter(|record| record.is_active_at(now))
            .map(|record| Duration::from_millis(record.expires_at - now)))
    }

    /// Start (or restart) the subscription. The caller must already hold a
    /// confirmed payment.
    pub fn activate(&self, duration: Duration) -> Result<SubscriptionRecord, Error> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let now = self.clock.now_ms();
        let record = SubscriptionRecord {
            active: true,
            started_at: now,
            expires_at: now.saturating_add(duration.as_millis() as u64),
        };
        save_record(self.store.as_ref(), &self.key, &record)?;
        info!(expires_at = record.expires_at, "Subscription activated");
        Ok(record)
    }

    pub fn cancel(&self) -> Result<(), Error> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.store.remove(&self.key)?;
        info!("Subscription cancelled");
        Ok(())
    }
}
