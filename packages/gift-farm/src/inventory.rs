//! Inventory reconciliation: raw NFT holdings → farmable view models.
//!
//! Collection addresses from the inventory provider and from configuration
//! can be encoded differently (raw, bounceable, url-safe...). Both sides are
//! normalized to the canonical raw form before comparison.

use async_trait::async_trait;
use gift_farm_types::{AddressError, TonAddress};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::CollectionEntry;
use crate::ledger::FarmingLedger;
use crate::metrics::METRICS;
use crate::Error;

const UNNAMED_NFT: &str = "Unnamed NFT";

/// One NFT as reported by the inventory provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNft {
    pub address: String,
    pub collection_address: Option<String>,
    /// Provider metadata, passed through loosely.
    pub metadata: Option<Value>,
}

/// External source of NFT holdings.
#[async_trait]
pub trait Inventory: Send + Sync {
    /// Every NFT held by `owner`. Failures map to [`Error::InventoryFetch`].
    async fn fetch_owned_nfts(&self, owner: &str) -> Result<Vec<RawNft>, Error>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NftAttribute {
    pub trait_type: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NftMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
    pub attributes: Vec<NftAttribute>,
}

impl Default for NftMetadata {
    fn default() -> Self {
        Self {
            name: UNNAMED_NFT.to_string(),
            description: String::new(),
            image: String::new(),
            attributes: Vec::new(),
        }
    }
}

impl NftMetadata {
    /// Lenient extraction: missing or mistyped fields fall back to defaults,
    /// malformed attributes are dropped.
    pub fn from_value(value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };
        let text = |field: &str| {
            value
                .get(field)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let attributes = value
            .get("attributes")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        Some(NftAttribute {
                            trait_type: item.get("trait_type")?.as_str()?.to_string(),
                            value: item.get("value")?.clone(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: text("name").unwrap_or_else(|| UNNAMED_NFT.to_string()),
            description: text("description").unwrap_or_default(),
            image: text("image").unwrap_or_default(),
            attributes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    /// Canonical (raw) address.
    pub address: String,
    pub name: String,
}

/// Fixed set of collections eligible for farming.
#[derive(Debug, Clone)]
pub struct CollectionAllowList {
    collections: Vec<Collection>,
}

impl CollectionAllowList {
    pub fn from_config(entries: &[CollectionEntry]) -> Result<Self, Error> {
        let collections = entries
            .iter()
            .map(|entry| {
                let address = TonAddress::parse(&entry.address).map_err(|e| {
                    Error::Config(format!("collection {} ({}): {e}", entry.name, entry.address))
                })?;
                Ok(Collection {
                    address: address.to_raw(),
                    name: entry.name.clone(),
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Self { collections })
    }

    /// Allow-list entry for `address` in any supported encoding.
    pub fn match_collection(&self, address: &str) -> Result<Option<&Collection>, AddressError> {
        let canonical = TonAddress::parse(address)?.to_raw();
        Ok(self.collections.iter().find(|c| c.address == canonical))
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

/// An allow-listed NFT merged with its farming state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmNft {
    /// Canonical (raw) NFT address; also the ledger key.
    pub address: String,
    pub collection_address: String,
    pub collection_name: String,
    pub metadata: NftMetadata,
    pub is_staking: bool,
    pub staking_start_time: Option<u64>,
    pub accumulated: f64,
    pub can_collect: bool,
}

/// Totals over one listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmSummary {
    pub total_nfts: usize,
    pub staking_nfts: usize,
    pub total_accumulated: f64,
}

impl FarmSummary {
    pub fn from_listing(nfts: &[FarmNft]) -> Self {
        nfts.iter().fold(Self::default(), |mut summary, nft| {
            summary.total_nfts += 1;
            if nft.is_staking {
                summary.staking_nfts += 1;
            }
            summary.total_accumulated += nft.accumulated;
            summary
        })
    }
}

pub struct InventoryReconciler {
    inventory: Arc<dyn Inventory>,
    ledger: Arc<FarmingLedger>,
    allow_list: CollectionAllowList,
}

impl InventoryReconciler {
    pub fn new(
        inventory: Arc<dyn Inventory>,
        ledger: Arc<FarmingLedger>,
        allow_list: CollectionAllowList,
    ) -> Self {
        Self {
            inventory,
            ledger,
            allow_list,
        }
    }

    pub fn allow_list(&self) -> &CollectionAllowList {
        &self.allow_list
    }

    /// Allow-listed NFTs owned by `owner`, in provider order.
    ///
    /// A provider failure is returned as-is; an empty result always means
    /// the owner holds nothing farmable. NFTs with unparsable addresses are
    /// skipped.
    pub async fn list_farmable(&self, owner: &str) -> Result<Vec<FarmNft>, Error> {
        let raw = match self.inventory.fetch_owned_nfts(owner).await {
            Ok(raw) => raw,
            Err(e) => {
                METRICS.record_inventory_error();
                warn!(owner, error = %e, "Inventory fetch failed");
                return Err(e);
            }
        };
        debug!(owner, count = raw.len(), "Inventory fetched");

        let mut farmable = Vec::new();
        for nft in raw {
            let Some(collection_address) = nft.collection_address.as_deref() else {
                continue;
            };
            let collection = match self.allow_list.match_collection(collection_address) {
                Ok(Some(collection)) => collection,
                Ok(None) => continue,
                Err(e) => {
                    warn!(nft = %nft.address, collection = collection_address, error = %e,
                        "Skipping NFT with invalid collection address");
                    continue;
                }
            };
            let address = match TonAddress::parse(&nft.address) {
                Ok(address) => address.to_raw(),
                Err(e) => {
                    warn!(nft = %nft.address, error = %e, "Skipping NFT with invalid address");
                    continue;
                }
            };

            let snapshot = self.ledger.snapshot(&address)?;
            let staking = snapshot.record.filter(|r| r.is_staking);
            farmable.push(FarmNft {
                accumulated: snapshot.accumulated,
                can_collect: snapshot.can_collect,
                address,
                collection_address: collection.address.clone(),
                collection_name: collection.name.clone(),
                metadata: NftMetadata::from_value(nft.metadata.as_ref()),
                is_staking: staking.is_some(),
                staking_start_time: staking.and_then(|r| r.start_time),
            });
        }
        Ok(farmable)
    }
}
