//! Session facade shared by callers (CLI, UI bindings).
//!
//! Wires subscription → ledger → reconciler/bulk/checkout once per session
//! and owns the caller-side policies: bulk actions are a premium perk, and
//! single collects wait for the full cycle.

use gift_farm_types::{normalize_address, AddressError};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::bulk::{BulkCollectReport, BulkOperations, BulkStartReport};
use crate::clock::Clock;
use crate::config::Config;
use crate::inventory::{CollectionAllowList, FarmNft, FarmSummary, Inventory, InventoryReconciler};
use crate::ledger::{CollectOutcome, FarmingLedger};
use crate::payment::{Payment, SubscriptionCheckout};
use crate::store::{Store, LOCAL_PARTITION};
use crate::subscription::{SubscriptionModule, SubscriptionRecord};
use crate::Error;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub active: bool,
    pub multiplier: f64,
    pub expires_at: Option<u64>,
    pub remaining_secs: Option<u64>,
}

pub struct FarmEngine {
    config: Config,
    owner: Option<String>,
    partition: String,
    subscription: Arc<SubscriptionModule>,
    ledger: Arc<FarmingLedger>,
    reconciler: InventoryReconciler,
    bulk: BulkOperations,
    checkout: Option<SubscriptionCheckout>,
    clock: Arc<dyn Clock>,
}

impl FarmEngine {
    /// Build a session for `owner` (`None` when no wallet is connected).
    pub fn new(
        config: Config,
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        inventory: Arc<dyn Inventory>,
        owner: Option<&str>,
    ) -> Result<Self, Error> {
        config.validate()?;

        let owner = owner.map(normalize_address).transpose()?;
        let partition = owner.clone().unwrap_or_else(|| LOCAL_PARTITION.to_string());

        let subscription = Arc::new(SubscriptionModule::new(
            store.clone(),
            clock.clone(),
            &partition,
            config.subscription.multiplier,
        ));
        let ledger = Arc::new(FarmingLedger::new(
            store,
            clock.clone(),
            subscription.clone(),
            config.farming.rates(),
            &partition,
        ));
        let allow_list = CollectionAllowList::from_config(&config.collections)?;
        let reconciler = InventoryReconciler::new(inventory, ledger.clone(), allow_list);
        let bulk = BulkOperations::new(ledger.clone());

        info!(
            partition = %partition,
            collections = config.collections.len(),
            "Farm engine ready"
        );

        Ok(Self {
            config,
            owner,
            partition,
            subscription,
            ledger,
            reconciler,
            bulk,
            checkout: None,
            clock,
        })
    }

    /// Attach a wallet for subscription purchases.
    pub fn with_payment(mut self, payment: Arc<dyn Payment>) -> Result<Self, Error> {
        self.checkout = Some(SubscriptionCheckout::new(
            payment,
            self.subscription.clone(),
            self.clock.clone(),
            &self.config.subscription,
        )?);
        Ok(self)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Canonical owner address, if a wallet is connected.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn partition(&self) -> &str {
        &self.partition
    }

    pub fn ledger(&self) -> &FarmingLedger {
        &self.ledger
    }

    pub fn subscription(&self) -> &SubscriptionModule {
        &self.subscription
    }

    // --- Listing ---

    pub async fn list_farmable(&self) -> Result<Vec<FarmNft>, Error> {
        let owner = self
            .owner
            .as_deref()
            .ok_or(Error::InvalidAddress(AddressError::Empty))?;
        self.reconciler.list_farmable(owner).await
    }

    pub async fn summary(&self) -> Result<FarmSummary, Error> {
        Ok(FarmSummary::from_listing(&self.list_farmable().await?))
    }

    // --- Single NFT ---

    pub fn start_farming(&self, nft_address: &str) -> Result<bool, Error> {
        self.ledger.start_farming(&normalize_address(nft_address)?)
    }

    /// Collect a finished cycle. Idle NFTs yield 0; a running cycle is
    /// refused with the time left.
    pub fn collect_reward(&self, nft_address: &str) -> Result<f64, Error> {
        let address = normalize_address(nft_address)?;
        match self.ledger.collect_if_ready(&address)? {
            CollectOutcome::Collected(amount) => Ok(amount),
            CollectOutcome::Idle => Ok(0.0),
            CollectOutcome::NotReady(left) => Err(Error::CollectNotReady(left)),
        }
    }

    // --- Bulk (premium) ---

    pub async fn start_all_farming(&self) -> Result<BulkStartReport, Error> {
        self.require_premium()?;
        let addresses = self.listed_addresses().await?;
        Ok(self.bulk.start_all(&addresses))
    }

    pub async fn collect_all_rewards(&self) -> Result<BulkCollectReport, Error> {
        self.require_premium()?;
        let addresses = self.listed_addresses().await?;
        Ok(self.bulk.collect_all(&addresses))
    }

    // --- Subscription ---

    pub async fn purchase_subscription(&self) -> Result<SubscriptionRecord, Error> {
        let checkout = self
            .checkout
            .as_ref()
            .ok_or_else(|| Error::PaymentFailed("no wallet connected".into()))?;
        checkout.purchase().await
    }

    pub fn cancel_subscription(&self) -> Result<(), Error> {
        self.subscription.cancel()
    }

    pub fn subscription_info(&self) -> Result<SubscriptionStatus, Error> {
        let now = self.clock.now_ms();
        let record = self.subscription.info()?;
        let active = record.as_ref().is_some_and(|r| r.is_active_at(now));
        Ok(SubscriptionStatus {
            active,
            multiplier: self.subscription.multiplier()?,
            expires_at: record.as_ref().filter(|_| active).map(|r| r.expires_at),
            remaining_secs: self.subscription.remaining()?.map(|d| d.as_secs()),
        })
    }

    fn require_premium(&self) -> Result<(), Error> {
        if self.subscription.is_active()? {
            Ok(())
        } else {
            Err(Error::PremiumRequired)
        }
    }

    async fn listed_addresses(&self) -> Result<Vec<String>, Error> {
        Ok(self
            .list_farmable()
            .await?
            .into_iter()
            .map(|nft| nft.address)
            .collect())
    }
}
