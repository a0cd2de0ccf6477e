use crate::models::PaymentRail;
use serde::{Deserialize, Serialize};

// Where a payment lands. The payment_rail tag decides which fields exist;
// every consumer matches exhaustively so a new rail cannot be half-handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "payment_rail", rename_all = "lowercase")]
pub enum PaymentDestination {
    Crypto {
        address: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        memo: Option<String>,
    },
    Wire {
        external_account_id: String,
        currency: String,
    },
    Ach {
        external_account_id: String,
        currency: String,
    },
    Sepa {
        external_account_id: String,
        currency: String,
    },
    Ewallet {
        mobile_number: String,
        provider: String,
    },
}

impl PaymentDestination {
    pub fn rail(&self) -> PaymentRail {
        match self {
            PaymentDestination::Crypto { .. } => PaymentRail::Crypto,
            PaymentDestination::Wire { .. } => PaymentRail::Wire,
            PaymentDestination::Ach { .. } => PaymentRail::Ach,
            PaymentDestination::Sepa { .. } => PaymentRail::Sepa,
            PaymentDestination::Ewallet { .. } => PaymentRail::Ewallet,
        }
    }

    // Rails where the anchor pays the recipient off-ledger. Crypto
    // destinations receive funds directly at their own address.
    pub fn requires_cashout(&self) -> bool {
        !matches!(self, PaymentDestination::Crypto { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rail_tag_discriminates_variants() {
        let crypto: PaymentDestination = serde_json::from_value(json!({
            "payment_rail": "crypto",
            "address": "GA7QYNF7SOWQ3GLR2BGMZEHXAVIRZA4KVWLTJJFC7MGXUA74P7UJVSGZ",
            "memo": "inv-42"
        }))
        .unwrap();
        assert_eq!(crypto.rail(), PaymentRail::Crypto);
        assert!(!crypto.requires_cashout());

        let ewallet: PaymentDestination = serde_json::from_value(json!({
            "payment_rail": "ewallet",
            "mobile_number": "+639171234567",
            "provider": "gcash"
        }))
        .unwrap();
        assert_eq!(ewallet.rail(), PaymentRail::Ewallet);
        assert!(ewallet.requires_cashout());
    }

    #[test]
    fn bank_rails_share_shape_but_not_tag() {
        let wire: PaymentDestination = serde_json::from_value(json!({
            "payment_rail": "wire",
            "external_account_id": "ext-77",
            "currency": "USD"
        }))
        .unwrap();
        let sepa: PaymentDestination = serde_json::from_value(json!({
            "payment_rail": "sepa",
            "external_account_id": "ext-77",
            "currency": "EUR"
        }))
        .unwrap();

        assert_eq!(wire.rail(), PaymentRail::Wire);
        assert_eq!(sepa.rail(), PaymentRail::Sepa);
        assert_ne!(wire, sepa);
    }
}
