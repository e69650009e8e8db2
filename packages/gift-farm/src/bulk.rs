//! Start/collect across many NFTs.
//!
//! Each address goes through the ledger's own atomic operation; the batch is
//! a best-effort sequence. An error on one address is recorded and the batch
//! moves on, so rewards already settled are always reported.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::ledger::{CollectOutcome, FarmingLedger};
use crate::Error;

#[derive(Debug)]
pub struct BulkFailure {
    pub address: String,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct BulkStartReport {
    pub started: Vec<String>,
    pub already_staking: Vec<String>,
    pub failures: Vec<BulkFailure>,
}

#[derive(Debug, Default)]
pub struct BulkCollectReport {
    pub collected: Vec<(String, f64)>,
    pub total: f64,
    /// Idle or mid-cycle NFTs left untouched.
    pub skipped: Vec<String>,
    pub failures: Vec<BulkFailure>,
}

/// Serializable counts for CLI/JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkTotals {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub amount: f64,
}

impl BulkStartReport {
    pub fn totals(&self) -> BulkTotals {
        BulkTotals {
            succeeded: self.started.len(),
            skipped: self.already_staking.len(),
            failed: self.failures.len(),
            amount: 0.0,
        }
    }
}

impl BulkCollectReport {
    pub fn totals(&self) -> BulkTotals {
        BulkTotals {
            succeeded: self.collected.len(),
            skipped: self.skipped.len(),
            failed: self.failures.len(),
            amount: self.total,
        }
    }
}

pub struct BulkOperations {
    ledger: Arc<FarmingLedger>,
}

impl BulkOperations {
    pub fn new(ledger: Arc<FarmingLedger>) -> Self {
        Self { ledger }
    }

    /// Start every idle NFT; staking ones keep their start time.
    pub fn start_all<S: AsRef<str>>(&self, nfts: &[S]) -> BulkStartReport {
        let mut report = BulkStartReport::default();
        for nft in nfts {
            let address = nft.as_ref();
            match self.ledger.start_farming(address) {
                Ok(true) => report.started.push(address.to_string()),
                Ok(false) => report.already_staking.push(address.to_string()),
                Err(error) => {
                    warn!(nft = address, error = %error, "Bulk start failed for NFT");
                    report.failures.push(BulkFailure {
                        address: address.to_string(),
                        error,
                    });
                }
            }
        }
        info!(
            started = report.started.len(),
            already_staking = report.already_staking.len(),
            failed = report.failures.len(),
            "Bulk start finished"
        );
        report
    }

    /// Collect every NFT whose cycle is complete and sum the rewards.
    pub fn collect_all<S: AsRef<str>>(&self, nfts: &[S]) -> BulkCollectReport {
        let mut report = BulkCollectReport::default();
        for nft in nfts {
            let address = nft.as_ref();
            match self.ledger.collect_if_ready(address) {
                Ok(CollectOutcome::Collected(amount)) => {
                    report.total += amount;
                    report.collected.push((address.to_string(), amount));
                }
                Ok(CollectOutcome::Idle | CollectOutcome::NotReady(_)) => {
                    report.skipped.push(address.to_string())
                }
                Err(error) => {
                    warn!(nft = address, error = %error, "Bulk collect failed for NFT");
                    report.failures.push(BulkFailure {
                        address: address.to_string(),
                        error,
                    });
                }
            }
        }
        info!(
            collected = report.collected.len(),
            total = report.total,
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            "Bulk collect finished"
        );
        report
    }
}
