//! Error types for the farming engine.

use gift_farm_types::AddressError;
use std::fmt;
use std::time::Duration;

/// Engine error type.
#[derive(Debug)]
pub enum Error {
    /// Configuration error.
    Config(String),
    /// Persistence store I/O failure. Fatal to the single operation.
    Persistence(String),
    /// Malformed stored record. Recovered locally by clearing the key.
    PersistenceCorrupt { key: String, reason: String },
    /// The NFT inventory collaborator failed. Retryable by the caller.
    InventoryFetch(String),
    /// The payment collaborator failed to submit the transfer.
    PaymentFailed(String),
    /// The user (or wallet) declined the transfer.
    PaymentRejected,
    /// Address normalization failed.
    InvalidAddress(AddressError),
    /// Bulk actions need an active subscription.
    PremiumRequired,
    /// The farming cycle has not completed; carries the time left.
    CollectNotReady(Duration),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::Persistence(msg) => write!(f, "persistence error: {msg}"),
            Error::PersistenceCorrupt { key, reason } => {
                write!(f, "corrupt record at {key}: {reason}")
            }
            Error::InventoryFetch(msg) => write!(f, "inventory fetch failed: {msg}"),
            Error::PaymentFailed(msg) => write!(f, "payment failed: {msg}"),
            Error::PaymentRejected => write!(f, "payment rejected"),
            Error::InvalidAddress(e) => write!(f, "invalid address: {e}"),
            Error::PremiumRequired => write!(f, "an active subscription is required"),
            Error::CollectNotReady(left) => {
                write!(f, "reward not collectable yet, {}s remaining", left.as_secs())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidAddress(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AddressError> for Error {
    fn from(e: AddressError) -> Self {
        Error::InvalidAddress(e)
    }
}

impl Error {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::InventoryFetch(_) | Error::PaymentFailed(_) | Error::Persistence(_)
        )
    }
}
