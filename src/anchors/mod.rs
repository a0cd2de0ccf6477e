use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;
use crate::models::{AnchorQuote, AnchorRate, PaymentDestination, PaymentRail, QuoteRequest};

pub mod coins_ph;
pub mod mock;
pub mod registry;
pub mod stellar;

pub use coins_ph::CoinsPhAnchor;
pub use registry::AnchorRegistry;
pub use stellar::StellarAnchor;

// On-chain account the sender pays to hand funds over to an anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationAddress {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashoutParams {
    pub internal_order_id: String,
    pub target_amount: Decimal,
    pub source_currency: String,
    pub target_currency: String,
    pub recipient_name: String,
    pub destination: PaymentDestination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashoutReceipt {
    pub external_order_id: String,
    pub internal_order_id: String,
}

// One settlement venue. Anchors are stateless and cheap to share; every
// implementation must be safe to call from concurrent request handlers.
#[async_trait]
pub trait Anchor: Send + Sync {
    fn name(&self) -> &str;

    fn supported_rails(&self) -> &[PaymentRail];

    fn supported_currencies(&self) -> &[String];

    // An anchor only ever claims same-currency transfers. Cross-currency
    // conversion happens inside quote and cashout flows, never here.
    fn supports_transfer(
        &self,
        source_currency: &str,
        target_currency: &str,
        rail: PaymentRail,
    ) -> bool {
        let supports = |c: &str| self.supported_currencies().iter().any(|s| s == c);
        supports(source_currency)
            && supports(target_currency)
            && self.supported_rails().contains(&rail)
            && source_currency == target_currency
    }

    fn ensure_currency(&self, currency: &str) -> Result<(), OrchestratorError> {
        if self.supported_currencies().iter().any(|c| c == currency) {
            Ok(())
        } else {
            Err(OrchestratorError::UnsupportedCurrency {
                anchor: self.name().to_string(),
                currency: currency.to_string(),
            })
        }
    }

    // Binding, fee-inclusive quote for one transfer.
    async fn request_quote(&self, request: &QuoteRequest) -> Result<AnchorQuote, OrchestratorError>;

    // Indicative rate for a trading pair, no fee attached.
    async fn get_rate(
        &self,
        source_currency: &str,
        target_currency: &str,
    ) -> Result<AnchorRate, OrchestratorError>;

    async fn get_liquidation_address(
        &self,
        destination: &PaymentDestination,
    ) -> Result<LiquidationAddress, OrchestratorError> {
        let _ = destination;
        Err(OrchestratorError::NotImplemented {
            anchor: self.name().to_string(),
            operation: "get_liquidation_address".to_string(),
        })
    }

    async fn request_cashout(
        &self,
        params: &CashoutParams,
    ) -> Result<CashoutReceipt, OrchestratorError> {
        let _ = params;
        Err(OrchestratorError::NotImplemented {
            anchor: self.name().to_string(),
            operation: "request_cashout".to_string(),
        })
    }

    // Executes a conversion on the anchor's books, returning the target
    // amount actually achieved.
    async fn convert_currency(
        &self,
        source_currency: &str,
        target_currency: &str,
        source_amount: Decimal,
        expected_target_amount: Decimal,
    ) -> Result<Decimal, OrchestratorError> {
        let _ = (source_currency, target_currency, source_amount, expected_target_amount);
        Err(OrchestratorError::NotImplemented {
            anchor: self.name().to_string(),
            operation: "convert_currency".to_string(),
        })
    }
}
