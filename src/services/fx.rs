use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use crate::anchors::Anchor;
use crate::error::OrchestratorError;
use crate::models::{AnchorQuote, QuoteRequest};

/// Currency-conversion quoting against a single configured anchor.
///
/// Payment routing compares every registered anchor, but FX quoting is
/// pinned to one liquidity source so that quoted and executed rates come
/// from the same venue.
pub struct FxService {
    anchor: Arc<dyn Anchor>,
}

impl FxService {
    pub fn new(anchor: Arc<dyn Anchor>) -> Self {
        Self { anchor }
    }

    pub fn anchor_name(&self) -> &str {
        self.anchor.name()
    }

    /// Quote how much `target_currency` a fixed `source_amount` buys.
    pub async fn quote_for_source(
        &self,
        source_currency: &str,
        target_currency: &str,
        source_amount: Decimal,
    ) -> Result<AnchorQuote, OrchestratorError> {
        if source_amount <= Decimal::ZERO {
            return Err(OrchestratorError::MissingAmount);
        }

        let request = QuoteRequest::for_source(source_currency, target_currency, source_amount);
        let quote = self.anchor.request_quote(&request).await?;
        debug!(
            anchor = self.anchor.name(),
            source = %quote.source_amount,
            target = %quote.target_amount,
            "fx quote (fixed source)"
        );
        Ok(quote)
    }

    /// Quote how much `source_currency` is needed to deliver a fixed
    /// `target_amount`.
    pub async fn quote_for_target(
        &self,
        source_currency: &str,
        target_currency: &str,
        target_amount: Decimal,
    ) -> Result<AnchorQuote, OrchestratorError> {
        if target_amount <= Decimal::ZERO {
            return Err(OrchestratorError::MissingAmount);
        }

        let request = QuoteRequest::for_target(source_currency, target_currency, target_amount);
        let quote = self.anchor.request_quote(&request).await?;
        debug!(
            anchor = self.anchor.name(),
            source = %quote.source_amount,
            target = %quote.target_amount,
            "fx quote (fixed target)"
        );
        Ok(quote)
    }
}
