use futures::future::join_all;
use std::sync::Arc;

use crate::anchors::Anchor;
use crate::error::OrchestratorError;
use crate::models::{AnchorQuote, PaymentRail, QuoteRequest};

// Ordered anchor directory. Registration order is part of the contract:
// ranking ties resolve in favor of the earlier-registered anchor, so
// selection is deterministic for identical inputs.
pub struct AnchorRegistry {
    anchors: Vec<Arc<dyn Anchor>>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self {
            anchors: Vec::new(),
        }
    }

    pub fn register(&mut self, anchor: Arc<dyn Anchor>) {
        tracing::info!(anchor = anchor.name(), "Registered anchor");
        self.anchors.push(anchor);
    }

    // Lookup is case-insensitive so config values like "coinsph" resolve
    // the anchor regardless of how it capitalizes its own name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Anchor>, OrchestratorError> {
        self.anchors
            .iter()
            .find(|anchor| anchor.name().eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| {
                OrchestratorError::InternalError(format!("anchor {} not registered", name))
            })
    }

    pub fn names(&self) -> Vec<String> {
        self.anchors
            .iter()
            .map(|anchor| anchor.name().to_string())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    // Live quotes from every anchor claiming this transfer, in
    // registration order. A failing anchor is skipped with a warning so
    // one outage cannot sink the whole request.
    pub async fn candidates(
        &self,
        request: &QuoteRequest,
        rail: PaymentRail,
    ) -> Vec<(Arc<dyn Anchor>, AnchorQuote)> {
        let eligible: Vec<Arc<dyn Anchor>> = self
            .anchors
            .iter()
            .filter(|anchor| {
                anchor.supports_transfer(&request.source_currency, &request.target_currency, rail)
            })
            .cloned()
            .collect();

        let quotes = join_all(eligible.iter().map(|anchor| anchor.request_quote(request))).await;

        eligible
            .into_iter()
            .zip(quotes)
            .filter_map(|(anchor, quote)| match quote {
                Ok(quote) => Some((anchor, quote)),
                Err(e) => {
                    tracing::warn!(
                        anchor = anchor.name(),
                        error = %e,
                        "Anchor quote failed, skipping"
                    );
                    None
                }
            })
            .collect()
    }

    // Candidates ordered best-first by fee-adjusted rate. The sort is
    // stable, which is what keeps ties deterministic.
    pub async fn ranked(
        &self,
        request: &QuoteRequest,
        rail: PaymentRail,
    ) -> Result<Vec<(Arc<dyn Anchor>, AnchorQuote)>, OrchestratorError> {
        let mut candidates = self.candidates(request, rail).await;

        if candidates.is_empty() {
            return Err(OrchestratorError::NoEligibleAnchor {
                source_currency: request.source_currency.clone(),
                target_currency: request.target_currency.clone(),
                rail,
            });
        }

        candidates.sort_by(|a, b| b.1.effective_rate().cmp(&a.1.effective_rate()));
        Ok(candidates)
    }

    pub async fn select(
        &self,
        request: &QuoteRequest,
        rail: PaymentRail,
    ) -> Result<(Arc<dyn Anchor>, AnchorQuote), OrchestratorError> {
        let mut ranked = self.ranked(request, rail).await?;
        let (anchor, quote) = ranked.remove(0);

        tracing::info!(
            anchor = anchor.name(),
            effective_rate = %quote.effective_rate(),
            "Selected anchor"
        );

        Ok((anchor, quote))
    }
}

impl Default for AnchorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchors::mock::MockAnchor;
    use rust_decimal_macros::dec;

    fn usdc_request() -> QuoteRequest {
        QuoteRequest::for_source("USDC", "USDC", dec!(100))
    }

    #[tokio::test]
    async fn best_effective_rate_wins_over_nominal_rate() {
        let mut registry = AnchorRegistry::new();
        // 100 -> 5750 but 102.5 paid: effective 56.09
        registry.register(Arc::new(
            MockAnchor::new("Flashy").with_rate(dec!(57.5)).with_fee(dec!(2.5)),
        ));
        // 100 -> 5700 with nothing on top: effective 57
        registry.register(Arc::new(MockAnchor::new("Steady").with_rate(dec!(57.0))));

        let (anchor, quote) = registry
            .select(&usdc_request(), PaymentRail::Crypto)
            .await
            .unwrap();

        assert_eq!(anchor.name(), "Steady");
        assert_eq!(quote.effective_rate(), dec!(57));
    }

    #[tokio::test]
    async fn ties_resolve_to_the_first_registered_anchor() {
        let mut registry = AnchorRegistry::new();
        registry.register(Arc::new(MockAnchor::new("First").with_rate(dec!(57.5))));
        registry.register(Arc::new(MockAnchor::new("Second").with_rate(dec!(57.5))));

        for _ in 0..3 {
            let (anchor, _) = registry
                .select(&usdc_request(), PaymentRail::Crypto)
                .await
                .unwrap();
            assert_eq!(anchor.name(), "First");
        }
    }

    #[tokio::test]
    async fn failing_anchors_are_skipped_not_fatal() {
        let broken = Arc::new(MockAnchor::new("Broken").failing_quotes());
        let mut registry = AnchorRegistry::new();
        registry.register(broken.clone());
        registry.register(Arc::new(MockAnchor::new("Healthy")));

        let (anchor, _) = registry
            .select(&usdc_request(), PaymentRail::Crypto)
            .await
            .unwrap();

        assert_eq!(anchor.name(), "Healthy");
        assert_eq!(broken.quote_calls(), 1);
    }

    #[tokio::test]
    async fn no_eligible_anchor_when_nothing_claims_the_rail() {
        let mut registry = AnchorRegistry::new();
        registry.register(Arc::new(MockAnchor::new("CryptoOnly")));

        let err = registry
            .select(&usdc_request(), PaymentRail::Wire)
            .await
            .unwrap_err();

        match err {
            OrchestratorError::NoEligibleAnchor { rail, .. } => {
                assert_eq!(rail, PaymentRail::Wire);
            }
            other => panic!("expected NoEligibleAnchor, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn cross_currency_transfers_are_never_claimed() {
        let mut registry = AnchorRegistry::new();
        registry.register(Arc::new(
            MockAnchor::new("Both").with_currencies(&["USDC", "PHP"]),
        ));

        let request = QuoteRequest::for_source("USDC", "PHP", dec!(100));
        let err = registry
            .select(&request, PaymentRail::Crypto)
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::NoEligibleAnchor { .. }));
    }

    #[test]
    fn lookup_by_unknown_name_is_an_internal_error() {
        let registry = AnchorRegistry::new();
        let err = registry.get("Missing").unwrap_err();
        assert!(matches!(err, OrchestratorError::InternalError(_)));
    }

    #[test]
    fn lookup_ignores_name_casing() {
        let mut registry = AnchorRegistry::new();
        registry.register(Arc::new(MockAnchor::new("CoinsPH")));

        assert_eq!(registry.get("coinsph").unwrap().name(), "CoinsPH");
    }
}
