//! TonAPI-backed [`Inventory`].
//!
//! `GET {endpoint}/nft/searchItems?owner=..&limit=..&offset=0`. No retries
//! here; callers decide whether to retry an [`Error::InventoryFetch`].

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::InventoryConfig;
use crate::inventory::{Inventory, RawNft};
use crate::Error;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// --- TonAPI response types ---

#[derive(Deserialize)]
struct SearchItemsResponse {
    #[serde(default, alias = "nft_items")]
    items: Vec<NftItem>,
}

#[derive(Deserialize)]
struct NftItem {
    address: String,
    #[serde(default)]
    collection: Option<NftCollectionRef>,
    #[serde(default)]
    metadata: Option<Value>,
}

#[derive(Deserialize)]
struct NftCollectionRef {
    address: String,
}

impl From<NftItem> for RawNft {
    fn from(item: NftItem) -> Self {
        RawNft {
            address: item.address,
            collection_address: item.collection.map(|c| c.address),
            metadata: item.metadata,
        }
    }
}

fn parse_items(body: &str) -> Result<Vec<RawNft>, Error> {
    let response: SearchItemsResponse = serde_json::from_str(body)
        .map_err(|e| Error::InventoryFetch(format!("Invalid searchItems response: {e}")))?;
    Ok(response.items.into_iter().map(RawNft::from).collect())
}

pub struct TonApiInventory {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    page_limit: u32,
}

impl TonApiInventory {
    pub fn new(config: &InventoryConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            page_limit: config.page_limit,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/nft/searchItems", self.endpoint)
    }
}

#[async_trait]
impl Inventory for TonApiInventory {
    async fn fetch_owned_nfts(&self, owner: &str) -> Result<Vec<RawNft>, Error> {
        let limit = self.page_limit.to_string();
        let mut request = self
            .http
            .get(self.search_url())
            .query(&[("owner", owner), ("limit", limit.as_str()), ("offset", "0")])
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.header(reqwest::header::AUTHORIZATION, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::InventoryFetch(format!("searchItems request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(owner, status = %status, "searchItems returned an error");
            return Err(Error::InventoryFetch(format!("HTTP {status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::InventoryFetch(format!("Failed to read response: {e}")))?;
        let items = parse_items(&body)?;
        debug!(owner, count = items.len(), "searchItems ok");
        Ok(items)
    }
}
