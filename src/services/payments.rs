use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::error::OrchestratorError;
use crate::models::{DestinationRecord, PaymentRecord, WalletRecord};

// In-memory system of record for wallets, destinations and payment
// lifecycles. Each payment sits behind its own Mutex: transitions for one
// payment are serialized, while unrelated payments never contend.
pub struct PaymentStore {
    wallets: RwLock<HashMap<String, WalletRecord>>,
    destinations: RwLock<HashMap<String, DestinationRecord>>,
    payments: RwLock<HashMap<String, Arc<Mutex<PaymentRecord>>>>,
}

impl PaymentStore {
    pub fn new() -> Self {
        Self {
            wallets: RwLock::new(HashMap::new()),
            destinations: RwLock::new(HashMap::new()),
            payments: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert_wallet(&self, wallet: WalletRecord) -> WalletRecord {
        self.wallets
            .write()
            .await
            .insert(wallet.id.clone(), wallet.clone());
        wallet
    }

    pub async fn wallet(&self, id: &str) -> Result<WalletRecord, OrchestratorError> {
        self.wallets
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| OrchestratorError::WalletNotFound(id.to_string()))
    }

    pub async fn insert_destination(&self, destination: DestinationRecord) -> DestinationRecord {
        self.destinations
            .write()
            .await
            .insert(destination.id.clone(), destination.clone());
        destination
    }

    pub async fn destination(&self, id: &str) -> Result<DestinationRecord, OrchestratorError> {
        self.destinations
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| OrchestratorError::DestinationNotFound(id.to_string()))
    }

    pub async fn insert_payment(&self, record: PaymentRecord) -> Arc<Mutex<PaymentRecord>> {
        let id = record.id.clone();
        let handle = Arc::new(Mutex::new(record));
        self.payments.write().await.insert(id, handle.clone());
        handle
    }

    // Exclusive handle to one payment. The map lock is dropped before the
    // payment lock is awaited, so holding one payment never blocks lookups
    // or transitions on any other.
    pub async fn lock_payment(
        &self,
        id: &str,
    ) -> Result<OwnedMutexGuard<PaymentRecord>, OrchestratorError> {
        let handle = self
            .payments
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| OrchestratorError::PaymentNotFound(id.to_string()))?;
        Ok(handle.lock_owned().await)
    }

    pub async fn payment(&self, id: &str) -> Result<PaymentRecord, OrchestratorError> {
        let handle = self
            .payments
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| OrchestratorError::PaymentNotFound(id.to_string()))?;
        let guard = handle.lock().await;
        Ok(guard.clone())
    }

    pub async fn payment_count(&self) -> usize {
        self.payments.read().await.len()
    }
}

impl Default for PaymentStore {
    fn default() -> Self {
        Self::new()
    }
}
