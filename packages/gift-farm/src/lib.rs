//! # Gift Farm
//!
//! Time-based farming of virtual rewards for allow-listed TON NFTs. An NFT
//! accrues `rate × multiplier` units per hour for up to one cycle (12h by
//! default); collecting settles the amount and returns the NFT to idle. A
//! paid subscription raises the multiplier and unlocks bulk actions.
//!
//! All state is local: farming and subscription records live in a [`Store`]
//! partitioned per wallet, and accrual is recomputed from a [`Clock`].
//!
//! ## Quick Start
//! ```bash
//! cargo run -p gift-farm --features http -- --owner <address> status
//! ```

pub mod bulk;
pub mod clock;
pub mod config;
pub mod engine;
mod error;
pub mod inventory;
pub mod ledger;
mod locks;
pub mod metrics;
pub mod payment;
pub mod store;
pub mod subscription;
#[cfg(feature = "http")]
pub mod tonapi;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use engine::{FarmEngine, SubscriptionStatus};
pub use error::Error;
pub use inventory::{FarmNft, FarmSummary, Inventory, RawNft};
pub use ledger::{CollectOutcome, FarmingLedger, FarmingRates, FarmingRecord, FarmingSnapshot};
pub use payment::{Payment, TransferOutcome, TransferRequest};
pub use store::{FileStore, MemoryStore, Store};
pub use subscription::{SubscriptionModule, SubscriptionRecord};
