//! Durable key-value persistence for farming and subscription records.
//!
//! Values are JSON strings. A value that fails to parse is treated as absent:
//! it is logged, counted, and the key is cleared.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::{debug, info, warn};

use crate::metrics::METRICS;
use crate::Error;

const KEY_ROOT: &str = "gift_farm";

/// Partition used when no wallet is connected.
pub const LOCAL_PARTITION: &str = "local";

/// Key for one NFT's farming record.
pub fn farming_key(partition: &str, nft_address: &str) -> String {
    format!("{KEY_ROOT}/farming/{partition}/{nft_address}")
}

/// Key for the session's subscription record.
pub fn subscription_key(partition: &str) -> String {
    format!("{KEY_ROOT}/subscription/{partition}")
}

/// Durable string store. Missing keys are `Ok(None)`.
pub trait Store: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;
    fn remove(&self, key: &str) -> Result<(), Error>;
}

/// Read and decode a record; corrupt values are cleared and read as absent.
pub fn load_record<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Result<Option<T>, Error> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            clear_corrupt(store, key, e.to_string());
            Ok(None)
        }
    }
}

pub fn save_record<T: Serialize>(store: &dyn Store, key: &str, record: &T) -> Result<(), Error> {
    let json = serde_json::to_string(record)
        .map_err(|e| Error::Persistence(format!("Failed to serialize {key}: {e}")))?;
    store.set(key, &json)
}

/// Log, count and remove a corrupt value. Never fails the read that found it.
pub(crate) fn clear_corrupt(store: &dyn Store, key: &str, reason: String) {
    let err = Error::PersistenceCorrupt {
        key: key.to_string(),
        reason,
    };
    warn!(error = %err, "Clearing corrupt record");
    METRICS.record_corrupt_cleared();
    if let Err(e) = store.remove(key) {
        warn!(key, error = %e, "Failed to clear corrupt record");
    }
}

/// In-process store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// Single JSON file holding every key. Each mutation rewrites the file
/// atomically (tmp + rename); the in-memory view only changes once the
/// write succeeded.
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let entries = Self::load(&path)?;
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn load(path: &std::path::Path) -> Result<BTreeMap<String, String>, Error> {
        if !path.exists() {
            info!(path = %path.display(), "No state file found, starting fresh");
            return Ok(BTreeMap::new());
        }

        let data = std::fs::read(path)
            .map_err(|e| Error::Persistence(format!("Failed to read state file: {e}")))?;

        match serde_json::from_slice::<BTreeMap<String, String>>(&data) {
            Ok(entries) => {
                info!(path = %path.display(), count = entries.len(), "State file loaded");
                Ok(entries)
            }
            Err(e) => {
                // Keep the unreadable file for inspection and start empty.
                let aside = path.with_extension("corrupt");
                warn!(
                    path = %path.display(),
                    moved_to = %aside.display(),
                    error = %e,
                    "State file is corrupt, starting fresh"
                );
                METRICS.record_corrupt_cleared();
                std::fs::rename(path, &aside).map_err(|e| {
                    Error::Persistence(format!("Failed to move corrupt state file: {e}"))
                })?;
                Ok(BTreeMap::new())
            }
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), Error> {
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| Error::Persistence(format!("Failed to serialize state: {e}")))?;

        let tmp = self.path.with_extension("tmp");
        if let Some(parent) = tmp.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Persistence(format!("Failed to create state directory: {e}"))
                })?;
            }
        }
        std::fs::write(&tmp, &json)
            .map_err(|e| Error::Persistence(format!("Failed to write state file: {e}")))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| Error::Persistence(format!("Failed to rename state file: {e}")))?;

        debug!(path = %self.path.display(), count = entries.len(), "State file saved");
        Ok(())
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let previous = entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&entries) {
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.persist(&entries) {
            entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }
}
