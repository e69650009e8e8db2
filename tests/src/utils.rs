use anyhow::Result;
use async_trait::async_trait;
use gift_farm::payment::TransferOutcome;
use gift_farm::store::MemoryStore;
use gift_farm::{
    Config, Error, FarmEngine, Inventory, ManualClock, Payment, RawNft, Store, TransferRequest,
};
use gift_farm_types::TonAddress;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const HOUR: Duration = Duration::from_secs(3_600);
pub const T0: u64 = 1_717_000_000_000;

pub const OWNER_FRIENDLY: &str = "UQCBK_JBASAA5XVz1D17Pn--kQaMWm0b9wReVtsEdRO4TlF4";
pub const OWNER_RAW: &str = "0:812bf241012000e57573d43d7b3e7fbe91068c5a6d1bf7045e56db047513b84e";

/// "TON NFT Collection 1" in every encoding the provider might use.
pub const COLLECTION_1_BOUNCEABLE: &str = "EQC6zjid8vJNEWqcXk10XjsdDLRKbcPZzbHusuEW6FokOWIm";
pub const COLLECTION_1_NON_BOUNCEABLE: &str = "UQC6zjid8vJNEWqcXk10XjsdDLRKbcPZzbHusuEW6FokOT_j";
pub const COLLECTION_1_TESTNET: &str = "kQC6zjid8vJNEWqcXk10XjsdDLRKbcPZzbHusuEW6FokOdms";
pub const COLLECTION_1_RAW: &str =
    "0:bace389df2f24d116a9c5e4d745e3b1d0cb44a6dc3d9cdb1eeb2e116e85a2439";

/// "TON NFT Collection 2", standard base64 alphabet.
pub const COLLECTION_2_STANDARD: &str = "EQD6mH9bwbn6S3M/tCRWOvqAIW8M34kRwbI01niGLRPeDPsl";
pub const COLLECTION_2_RAW: &str =
    "0:fa987f5bc1b9fa4b733fb424563afa80216f0cdf8911c1b234d678862d13de0c";

/// Valid address that is not an allow-listed collection.
pub const FOREIGN_COLLECTION: &str =
    "0:eb8da2da84b90c07e84c0a69333b206e1c9d77f5951898f1eee914412a76dd2c";

/// Canonical address of a test NFT.
pub fn nft(byte: u8) -> String {
    TonAddress::new(0, [byte; 32]).to_raw()
}

pub fn raw_nft(byte: u8, collection: &str) -> RawNft {
    RawNft {
        address: nft(byte),
        collection_address: Some(collection.to_string()),
        metadata: Some(json!({ "name": format!("Gift #{byte}") })),
    }
}

// --- Collaborator fakes ---

#[derive(Default)]
pub struct FakeInventory {
    items: Mutex<Vec<RawNft>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FakeInventory {
    pub fn new(items: Vec<RawNft>) -> Arc<Self> {
        Arc::new(Self {
            items: Mutex::new(items),
            ..Self::default()
        })
    }

    pub fn set_items(&self, items: Vec<RawNft>) {
        *self.items.lock().unwrap() = items;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Inventory for FakeInventory {
    async fn fetch_owned_nfts(&self, _owner: &str) -> Result<Vec<RawNft>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::InventoryFetch("HTTP 503 Service Unavailable".into()));
        }
        Ok(self.items.lock().unwrap().clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletBehavior {
    Approve,
    Reject,
    Offline,
}

pub struct FakeWallet {
    behavior: Mutex<WalletBehavior>,
    pub requests: Mutex<Vec<TransferRequest>>,
}

impl FakeWallet {
    pub fn new(behavior: WalletBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(behavior),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn set_behavior(&self, behavior: WalletBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }
}

#[async_trait]
impl Payment for FakeWallet {
    async fn send_transfer(&self, request: &TransferRequest) -> Result<TransferOutcome, Error> {
        self.requests.lock().unwrap().push(request.clone());
        match *self.behavior.lock().unwrap() {
            WalletBehavior::Approve => Ok(TransferOutcome {
                success: true,
                reference: Some("te6cckEBAQEA".into()),
            }),
            WalletBehavior::Reject => Ok(TransferOutcome {
                success: false,
                reference: None,
            }),
            WalletBehavior::Offline => Err(Error::PaymentFailed("bridge disconnected".into())),
        }
    }
}

// --- Session setup ---

pub struct Session {
    pub engine: FarmEngine,
    pub clock: ManualClock,
    pub inventory: Arc<FakeInventory>,
    pub wallet: Arc<FakeWallet>,
}

pub fn session_on(store: Arc<dyn Store>, clock: ManualClock, items: Vec<RawNft>) -> Result<Session> {
    let inventory = FakeInventory::new(items);
    let wallet = FakeWallet::new(WalletBehavior::Approve);
    let engine = FarmEngine::new(
        Config::default(),
        store,
        Arc::new(clock.clone()),
        inventory.clone(),
        Some(OWNER_FRIENDLY),
    )?
    .with_payment(wallet.clone())?;
    Ok(Session {
        engine,
        clock,
        inventory,
        wallet,
    })
}

/// Owner session over a fresh memory store at `T0`.
pub fn session(items: Vec<RawNft>) -> Result<Session> {
    session_on(Arc::new(MemoryStore::new()), ManualClock::new(T0), items)
}
