use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::anchors::{Anchor, LiquidationAddress};
use crate::error::OrchestratorError;
use crate::models::{AnchorQuote, AnchorRate, PaymentDestination, PaymentRail, QuoteRequest};

const STELLAR_QUOTE_TTL: u64 = 100_000;

// Native USDC rail. Quotes are always 1:1 with zero fee since the funds
// move as-is on-ledger; the liquidation address is the recipient's own
// account rather than an anchor-held deposit address.
pub struct StellarAnchor {
    rails: Vec<PaymentRail>,
    currencies: Vec<String>,
}

impl StellarAnchor {
    pub fn new() -> Self {
        Self {
            rails: vec![PaymentRail::Crypto],
            currencies: vec!["USDC".to_string()],
        }
    }
}

impl Default for StellarAnchor {
    fn default() -> Self {
        Self::new()
    }
}

// Stellar account ids are 56-character uppercase base32 strings starting
// with G. A destination that fails this check cannot receive on-ledger
// funds, so it gets no liquidation address.
fn is_account_id(address: &str) -> bool {
    address.len() == 56
        && address.starts_with('G')
        && address
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

#[async_trait]
impl Anchor for StellarAnchor {
    fn name(&self) -> &str {
        "Stellar"
    }

    fn supported_rails(&self) -> &[PaymentRail] {
        &self.rails
    }

    fn supported_currencies(&self) -> &[String] {
        &self.currencies
    }

    async fn request_quote(&self, request: &QuoteRequest) -> Result<AnchorQuote, OrchestratorError> {
        self.ensure_currency(&request.source_currency)?;
        self.ensure_currency(&request.target_currency)?;

        let amount = request.amount.value();
        Ok(AnchorQuote {
            quote_id: Uuid::new_v4().to_string(),
            exchange_rate: Decimal::ONE,
            expires_in: STELLAR_QUOTE_TTL,
            source_currency: request.source_currency.clone(),
            target_currency: request.target_currency.clone(),
            source_amount: amount,
            target_amount: amount,
            fee: Decimal::ZERO,
            total: amount,
        })
    }

    async fn get_rate(
        &self,
        _source_currency: &str,
        _target_currency: &str,
    ) -> Result<AnchorRate, OrchestratorError> {
        Ok(AnchorRate {
            exchange_rate: Decimal::ONE,
            expires_in: STELLAR_QUOTE_TTL,
        })
    }

    async fn get_liquidation_address(
        &self,
        destination: &PaymentDestination,
    ) -> Result<LiquidationAddress, OrchestratorError> {
        let missing = || OrchestratorError::NoLiquidationAddress {
            anchor: self.name().to_string(),
        };

        match destination {
            PaymentDestination::Crypto { address, memo } => {
                if is_account_id(address) {
                    Ok(LiquidationAddress {
                        address: address.clone(),
                        memo: memo.clone(),
                    })
                } else {
                    Err(missing())
                }
            }
            PaymentDestination::Wire { .. }
            | PaymentDestination::Ach { .. }
            | PaymentDestination::Sepa { .. }
            | PaymentDestination::Ewallet { .. } => Err(missing()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn quotes_are_one_to_one_with_zero_fee() {
        let anchor = StellarAnchor::new();
        let request = QuoteRequest::for_source("USDC", "USDC", dec!(50.00));

        let quote = anchor.request_quote(&request).await.unwrap();

        assert_eq!(quote.exchange_rate, Decimal::ONE);
        assert_eq!(quote.source_amount, dec!(50.00));
        assert_eq!(quote.target_amount, dec!(50.00));
        assert_eq!(quote.fee, Decimal::ZERO);
        assert_eq!(quote.total, dec!(50.00));
        assert_eq!(quote.expires_in, 100_000);
    }

    #[tokio::test]
    async fn quotes_reject_unsupported_currencies() {
        let anchor = StellarAnchor::new();
        let request = QuoteRequest::for_source("USDC", "PHP", dec!(100));

        let err = anchor.request_quote(&request).await.unwrap_err();
        match err {
            OrchestratorError::UnsupportedCurrency { currency, .. } => {
                assert_eq!(currency, "PHP");
            }
            other => panic!("expected UnsupportedCurrency, got {:?}", other),
        }
    }

    #[test]
    fn transfer_support_is_same_currency_crypto_only() {
        let anchor = StellarAnchor::new();

        assert!(anchor.supports_transfer("USDC", "USDC", PaymentRail::Crypto));
        assert!(!anchor.supports_transfer("USDC", "PHP", PaymentRail::Crypto));
        assert!(!anchor.supports_transfer("PHP", "PHP", PaymentRail::Crypto));
        assert!(!anchor.supports_transfer("USDC", "USDC", PaymentRail::Wire));
    }

    #[tokio::test]
    async fn liquidation_address_comes_from_the_destination() {
        let anchor = StellarAnchor::new();
        let destination = PaymentDestination::Crypto {
            address: "GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ".to_string(),
            memo: Some("inv-42".to_string()),
        };

        let resolved = anchor.get_liquidation_address(&destination).await.unwrap();
        assert_eq!(
            resolved.address,
            "GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ"
        );
        assert_eq!(resolved.memo.as_deref(), Some("inv-42"));
    }

    #[tokio::test]
    async fn malformed_account_ids_are_rejected() {
        let anchor = StellarAnchor::new();
        let destination = PaymentDestination::Crypto {
            address: "not-a-stellar-account".to_string(),
            memo: None,
        };

        let err = anchor
            .get_liquidation_address(&destination)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::NoLiquidationAddress { .. }
        ));
    }

    #[tokio::test]
    async fn non_crypto_destination_has_no_liquidation_address() {
        let anchor = StellarAnchor::new();
        let destination = PaymentDestination::Ewallet {
            mobile_number: "+639171234567".to_string(),
            provider: "gcash".to_string(),
        };

        let err = anchor
            .get_liquidation_address(&destination)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::NoLiquidationAddress { .. }
        ));
    }

    #[tokio::test]
    async fn cashout_is_not_supported() {
        let anchor = StellarAnchor::new();
        let params = crate::anchors::CashoutParams {
            internal_order_id: "p-1".to_string(),
            target_amount: dec!(10),
            source_currency: "USDC".to_string(),
            target_currency: "USDC".to_string(),
            recipient_name: "Ada".to_string(),
            destination: PaymentDestination::Crypto {
                address: "GABC".to_string(),
                memo: None,
            },
        };

        let err = anchor.request_cashout(&params).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::NotImplemented { .. }));
    }
}
