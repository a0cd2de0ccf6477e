use crate::models::PaymentDestination;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Persistence-boundary rows the orchestrator resolves by id at initiation.
// The storage technology behind them is not this service's concern; the
// in-memory store ships the same shapes the production database holds.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletRecord {
    pub id: String,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationRecord {
    pub id: String,
    pub currency: String,
    pub holder_name: String,
    pub destination: PaymentDestination,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWallet {
    pub id: String,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDestination {
    pub id: String,
    pub currency: String,
    pub holder_name: String,
    pub destination: PaymentDestination,
}

impl WalletRecord {
    pub fn new(wallet: NewWallet) -> Self {
        Self {
            id: wallet.id,
            currency: wallet.currency,
            created_at: Utc::now(),
        }
    }
}

impl DestinationRecord {
    pub fn new(destination: NewDestination) -> Self {
        Self {
            id: destination.id,
            currency: destination.currency,
            holder_name: destination.holder_name,
            destination: destination.destination,
            created_at: Utc::now(),
        }
    }
}
