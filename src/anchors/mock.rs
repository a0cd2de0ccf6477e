use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::anchors::{Anchor, CashoutParams, CashoutReceipt, LiquidationAddress};
use crate::error::OrchestratorError;
use crate::models::{AnchorQuote, AnchorRate, PaymentDestination, PaymentRail, QuoteAmount, QuoteRequest};

// Deterministic in-memory anchor for tests. Rates and failure modes are
// fixed at construction; call counters expose how often the registry and
// orchestrator actually hit it.
pub struct MockAnchor {
    name: String,
    rails: Vec<PaymentRail>,
    currencies: Vec<String>,
    exchange_rate: Decimal,
    fee: Decimal,
    expires_in: u64,
    fail_quotes: bool,
    fail_cashouts: bool,
    fail_liquidation: bool,
    liquidation_address: Option<String>,
    quote_calls: AtomicU64,
    cashout_calls: AtomicU64,
}

impl MockAnchor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rails: vec![PaymentRail::Crypto],
            currencies: vec!["USDC".to_string()],
            exchange_rate: Decimal::ONE,
            fee: Decimal::ZERO,
            expires_in: 300,
            fail_quotes: false,
            fail_cashouts: false,
            fail_liquidation: false,
            liquidation_address: Some("GMOCKDEPOSITADDRESS".to_string()),
            quote_calls: AtomicU64::new(0),
            cashout_calls: AtomicU64::new(0),
        }
    }

    pub fn with_rate(mut self, exchange_rate: Decimal) -> Self {
        self.exchange_rate = exchange_rate;
        self
    }

    pub fn with_fee(mut self, fee: Decimal) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_rails(mut self, rails: Vec<PaymentRail>) -> Self {
        self.rails = rails;
        self
    }

    pub fn with_currencies(mut self, currencies: &[&str]) -> Self {
        self.currencies = currencies.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_liquidation_address(mut self, address: &str) -> Self {
        self.liquidation_address = Some(address.to_string());
        self
    }

    pub fn without_liquidation_address(mut self) -> Self {
        self.liquidation_address = None;
        self
    }

    pub fn failing_quotes(mut self) -> Self {
        self.fail_quotes = true;
        self
    }

    pub fn failing_cashouts(mut self) -> Self {
        self.fail_cashouts = true;
        self
    }

    pub fn failing_liquidation_lookups(mut self) -> Self {
        self.fail_liquidation = true;
        self
    }

    pub fn quote_calls(&self) -> u64 {
        self.quote_calls.load(Ordering::Relaxed)
    }

    pub fn cashout_calls(&self) -> u64 {
        self.cashout_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Anchor for MockAnchor {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_rails(&self) -> &[PaymentRail] {
        &self.rails
    }

    fn supported_currencies(&self) -> &[String] {
        &self.currencies
    }

    async fn request_quote(&self, request: &QuoteRequest) -> Result<AnchorQuote, OrchestratorError> {
        self.quote_calls.fetch_add(1, Ordering::Relaxed);
        self.ensure_currency(&request.source_currency)?;
        self.ensure_currency(&request.target_currency)?;

        if self.fail_quotes {
            return Err(OrchestratorError::AnchorError {
                anchor: self.name.clone(),
                message: "mock quote failure".to_string(),
            });
        }

        let (source_amount, target_amount) = match request.amount {
            QuoteAmount::Source(amount) => (amount, amount * self.exchange_rate),
            QuoteAmount::Target(amount) => (amount / self.exchange_rate, amount),
        };

        Ok(AnchorQuote {
            quote_id: format!("{}-quote-{}", self.name, self.quote_calls()),
            exchange_rate: self.exchange_rate,
            expires_in: self.expires_in,
            source_currency: request.source_currency.clone(),
            target_currency: request.target_currency.clone(),
            source_amount,
            target_amount,
            fee: self.fee,
            total: source_amount + self.fee,
        })
    }

    async fn get_rate(
        &self,
        _source_currency: &str,
        _target_currency: &str,
    ) -> Result<AnchorRate, OrchestratorError> {
        if self.fail_quotes {
            return Err(OrchestratorError::AnchorError {
                anchor: self.name.clone(),
                message: "mock rate failure".to_string(),
            });
        }

        Ok(AnchorRate {
            exchange_rate: self.exchange_rate,
            expires_in: self.expires_in,
        })
    }

    async fn get_liquidation_address(
        &self,
        _destination: &PaymentDestination,
    ) -> Result<LiquidationAddress, OrchestratorError> {
        if self.fail_liquidation {
            return Err(OrchestratorError::AnchorError {
                anchor: self.name.clone(),
                message: "mock liquidation lookup failure".to_string(),
            });
        }

        match &self.liquidation_address {
            Some(address) => Ok(LiquidationAddress {
                address: address.clone(),
                memo: None,
            }),
            None => Err(OrchestratorError::NoLiquidationAddress {
                anchor: self.name.clone(),
            }),
        }
    }

    async fn request_cashout(
        &self,
        params: &CashoutParams,
    ) -> Result<CashoutReceipt, OrchestratorError> {
        self.cashout_calls.fetch_add(1, Ordering::Relaxed);

        if self.fail_cashouts {
            return Err(OrchestratorError::AnchorError {
                anchor: self.name.clone(),
                message: "mock cashout failure".to_string(),
            });
        }

        Ok(CashoutReceipt {
            external_order_id: format!("ext-{}", params.internal_order_id),
            internal_order_id: params.internal_order_id.clone(),
        })
    }

    async fn convert_currency(
        &self,
        _source_currency: &str,
        _target_currency: &str,
        _source_amount: Decimal,
        expected_target_amount: Decimal,
    ) -> Result<Decimal, OrchestratorError> {
        Ok(expected_target_amount)
    }
}
