use crate::error::OrchestratorError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentRail {
    Crypto,
    Wire,
    Ach,
    Sepa,
    Ewallet,
}

impl std::fmt::Display for PaymentRail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PaymentRail::Crypto => "crypto",
            PaymentRail::Wire => "wire",
            PaymentRail::Ach => "ach",
            PaymentRail::Sepa => "sepa",
            PaymentRail::Ewallet => "ewallet",
        };
        write!(f, "{}", name)
    }
}

// Exactly one side of the conversion is fixed by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum QuoteAmount {
    Source(Decimal),
    Target(Decimal),
}

impl QuoteAmount {
    pub fn value(&self) -> Decimal {
        match self {
            QuoteAmount::Source(amount) | QuoteAmount::Target(amount) => *amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub source_currency: String,
    pub target_currency: String,
    pub amount: QuoteAmount,
}

impl QuoteRequest {
    pub fn for_source(
        source_currency: impl Into<String>,
        target_currency: impl Into<String>,
        source_amount: Decimal,
    ) -> Self {
        Self {
            source_currency: source_currency.into(),
            target_currency: target_currency.into(),
            amount: QuoteAmount::Source(source_amount),
        }
    }

    pub fn for_target(
        source_currency: impl Into<String>,
        target_currency: impl Into<String>,
        target_amount: Decimal,
    ) -> Self {
        Self {
            source_currency: source_currency.into(),
            target_currency: target_currency.into(),
            amount: QuoteAmount::Target(target_amount),
        }
    }
}

// Inbound rate lookup: both amount fields optional on the wire, validated
// into a QuoteRequest before any anchor is consulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateRequest {
    pub source_currency: String,
    pub target_currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_amount: Option<Decimal>,
}

impl RateRequest {
    pub fn quote_request(&self) -> Result<QuoteRequest, OrchestratorError> {
        let amount = match (self.source_amount, self.target_amount) {
            (Some(source), None) if source > Decimal::ZERO => QuoteAmount::Source(source),
            (None, Some(target)) if target > Decimal::ZERO => QuoteAmount::Target(target),
            _ => return Err(OrchestratorError::MissingAmount),
        };

        Ok(QuoteRequest {
            source_currency: self.source_currency.clone(),
            target_currency: self.target_currency.clone(),
            amount,
        })
    }
}

// A bindable, time-boxed price commitment from one anchor. All amounts are
// decimal strings on the wire; total = source_amount + fee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorQuote {
    pub quote_id: String,
    pub exchange_rate: Decimal,
    pub expires_in: u64,
    pub source_currency: String,
    pub target_currency: String,
    pub source_amount: Decimal,
    pub target_amount: Decimal,
    pub fee: Decimal,
    pub total: Decimal,
}

impl AnchorQuote {
    // Target units received per source unit actually paid, fee included.
    // This is the registry's ranking criterion.
    pub fn effective_rate(&self) -> Decimal {
        self.target_amount
            .checked_div(self.total)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn rate(&self) -> AnchorRate {
        AnchorRate {
            exchange_rate: self.exchange_rate,
            expires_in: self.expires_in,
        }
    }
}

// Non-binding indicative rate, no fee attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorRate {
    pub exchange_rate: Decimal,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedRate {
    pub anchor: String,
    pub rate: AnchorRate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rate_request(source: Option<Decimal>, target: Option<Decimal>) -> RateRequest {
        RateRequest {
            source_currency: "USD".to_string(),
            target_currency: "PHP".to_string(),
            source_amount: source,
            target_amount: target,
        }
    }

    #[test]
    fn rate_request_requires_exactly_one_amount() {
        assert!(matches!(
            rate_request(None, None).quote_request(),
            Err(OrchestratorError::MissingAmount)
        ));
        assert!(matches!(
            rate_request(Some(dec!(100)), Some(dec!(5750))).quote_request(),
            Err(OrchestratorError::MissingAmount)
        ));
    }

    #[test]
    fn rate_request_rejects_non_positive_amounts() {
        assert!(matches!(
            rate_request(Some(dec!(0)), None).quote_request(),
            Err(OrchestratorError::MissingAmount)
        ));
        assert!(matches!(
            rate_request(None, Some(dec!(-3))).quote_request(),
            Err(OrchestratorError::MissingAmount)
        ));
    }

    #[test]
    fn rate_request_accepts_either_direction() {
        let source = rate_request(Some(dec!(100)), None).quote_request().unwrap();
        assert_eq!(source.amount, QuoteAmount::Source(dec!(100)));

        let target = rate_request(None, Some(dec!(5750))).quote_request().unwrap();
        assert_eq!(target.amount, QuoteAmount::Target(dec!(5750)));
    }

    #[test]
    fn effective_rate_is_fee_adjusted() {
        let quote = AnchorQuote {
            quote_id: "q-1".to_string(),
            exchange_rate: dec!(57.5),
            expires_in: 300,
            source_currency: "USD".to_string(),
            target_currency: "PHP".to_string(),
            source_amount: dec!(100),
            target_amount: dec!(5750),
            fee: dec!(2.50),
            total: dec!(102.50),
        };

        // 5750 / 102.50: the fee drags the effective rate below the quoted rate.
        assert!(quote.effective_rate() < quote.exchange_rate);
        assert_eq!(quote.effective_rate().round_dp(4), dec!(56.0976));
    }
}
