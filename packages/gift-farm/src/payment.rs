//! Subscription checkout through an external wallet.
//!
//! The subscription is only activated after the wallet confirms the
//! transfer. Any failure leaves subscription state untouched.

use async_trait::async_trait;
use gift_farm_types::{FriendlyFormat, TonAddress};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::SubscriptionConfig;
use crate::metrics::METRICS;
use crate::subscription::{SubscriptionModule, SubscriptionRecord};
use crate::Error;

/// A single transfer for the wallet to sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Bounceable, url-safe.
    pub recipient: String,
    pub amount_nano: u64,
    pub payload: String,
    /// UNIX seconds.
    pub valid_until: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransferOutcome {
    pub success: bool,
    /// Wallet-side reference (e.g. signed message BOC), when provided.
    pub reference: Option<String>,
}

/// Wallet collaborator.
#[async_trait]
pub trait Payment: Send + Sync {
    /// Submit `request`. `Ok` with `success == false` means the user declined.
    async fn send_transfer(&self, request: &TransferRequest) -> Result<TransferOutcome, Error>;
}

pub struct SubscriptionCheckout {
    payment: Arc<dyn Payment>,
    subscription: Arc<SubscriptionModule>,
    clock: Arc<dyn Clock>,
    recipient: String,
    amount_nano: u64,
    payload: String,
    payment_window: Duration,
    duration: Duration,
}

impl SubscriptionCheckout {
    pub fn new(
        payment: Arc<dyn Payment>,
        subscription: Arc<SubscriptionModule>,
        clock: Arc<dyn Clock>,
        config: &SubscriptionConfig,
    ) -> Result<Self, Error> {
        let recipient = TonAddress::parse(&config.recipient)
            .map_err(|e| Error::Config(format!("subscription.recipient: {e}")))?
            .to_friendly(FriendlyFormat::default());
        Ok(Self {
            payment,
            subscription,
            clock,
            recipient,
            amount_nano: config.price_nano(),
            payload: config.payload.clone(),
            payment_window: Duration::from_secs(config.payment_window_secs),
            duration: config.duration(),
        })
    }

    pub fn build_request(&self) -> TransferRequest {
        TransferRequest {
            recipient: self.recipient.clone(),
            amount_nano: self.amount_nano,
            payload: self.payload.clone(),
            valid_until: self.clock.now_secs().saturating_add(self.payment_window.as_secs()),
        }
    }

    /// Pay, then activate.
    pub async fn purchase(&self) -> Result<SubscriptionRecord, Error> {
        let request = self.build_request();
        let outcome = match self.payment.send_transfer(&request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                METRICS.record_payment_failed();
                warn!(error = %e, "Subscription payment failed");
                return Err(match e {
                    e @ (Error::PaymentFailed(_) | Error::PaymentRejected) => e,
                    other => Error::PaymentFailed(other.to_string()),
                });
            }
        };

        if !outcome.success {
            METRICS.record_payment_failed();
            warn!("Subscription payment rejected");
            return Err(Error::PaymentRejected);
        }

        let record = self.subscription.activate(self.duration)?;
        METRICS.record_subscription_activated();
        info!(
            reference = outcome.reference.as_deref().unwrap_or("-"),
            amount_nano = request.amount_nano,
            expires_at = record.expires_at,
            "Subscription purchased"
        );
        Ok(record)
    }
}
