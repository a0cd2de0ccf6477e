use crate::error::OrchestratorError;
use crate::models::AnchorQuote;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Created,
    AnchorAccepted,
    AwaitingConfirmation,
    Confirmed,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Confirmed | PaymentStatus::Failed)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PaymentStatus::Created => "CREATED",
            PaymentStatus::AnchorAccepted => "ANCHOR_ACCEPTED",
            PaymentStatus::AwaitingConfirmation => "AWAITING_CONFIRMATION",
            PaymentStatus::Confirmed => "CONFIRMED",
            PaymentStatus::Failed => "FAILED",
        };
        write!(f, "{}", name)
    }
}

// The immutable input to initiating a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub source_amount: Decimal,
    pub recipient_id: i64,
    pub destination_id: String,
    pub sender_id: i64,
    pub wallet_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmRequest {
    pub tx_id: String,
    pub tx_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInstructions {
    pub payment_id: String,
    pub currency: String,
    pub amount: Decimal,
    pub fee: Decimal,
    pub total: Decimal,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookStatus {
    Pending,
    Completed,
    Failed,
}

// The sole external signal that moves a payment past submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookData,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookData {
    pub payment_id: String,
    pub status: WebhookStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Applied,
    Absorbed,
}

// One payment's lifecycle row. State moves strictly
// CREATED -> ANCHOR_ACCEPTED -> AWAITING_CONFIRMATION -> CONFIRMED,
// with FAILED reachable from any non-terminal state. Terminal states
// absorb replayed webhooks instead of erroring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: String,
    pub status: PaymentStatus,
    pub source_currency: String,
    pub target_currency: String,
    pub source_amount: Decimal,
    pub target_amount: Decimal,
    pub exchange_rate: Decimal,
    pub fee: Decimal,
    pub anchor: String,
    pub recipient_id: i64,
    pub sender_id: i64,
    pub wallet_id: String,
    pub destination_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidation_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidation_memo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
}

impl PaymentRecord {
    pub fn new(request: &PaymentRequest, anchor: &str, quote: &AnchorQuote) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            status: PaymentStatus::Created,
            source_currency: quote.source_currency.clone(),
            target_currency: quote.target_currency.clone(),
            source_amount: quote.source_amount,
            target_amount: quote.target_amount,
            exchange_rate: quote.exchange_rate,
            fee: quote.fee,
            anchor: anchor.to_string(),
            recipient_id: request.recipient_id,
            sender_id: request.sender_id,
            wallet_id: request.wallet_id.clone(),
            destination_id: request.destination_id.clone(),
            liquidation_address: None,
            liquidation_memo: None,
            external_order_id: None,
            tx_id: None,
            tx_hash: None,
            failed_reason: None,
            created_at: Utc::now(),
            accepted_at: None,
            sent_at: None,
            completed_at: None,
            failed_at: None,
        }
    }

    fn transition_error(&self, to: PaymentStatus) -> OrchestratorError {
        OrchestratorError::InvalidTransition {
            payment_id: self.id.clone(),
            from: self.status,
            to,
        }
    }

    pub fn accept(
        &mut self,
        anchor: &str,
        address: String,
        memo: Option<String>,
        external_order_id: Option<String>,
    ) -> Result<(), OrchestratorError> {
        if self.status != PaymentStatus::Created {
            return Err(self.transition_error(PaymentStatus::AnchorAccepted));
        }
        self.status = PaymentStatus::AnchorAccepted;
        self.anchor = anchor.to_string();
        self.liquidation_address = Some(address);
        self.liquidation_memo = memo;
        self.external_order_id = external_order_id;
        self.accepted_at = Some(Utc::now());
        Ok(())
    }

    pub fn record_submission(
        &mut self,
        tx_id: String,
        tx_hash: String,
    ) -> Result<(), OrchestratorError> {
        if self.status != PaymentStatus::AnchorAccepted {
            return Err(self.transition_error(PaymentStatus::AwaitingConfirmation));
        }
        self.status = PaymentStatus::AwaitingConfirmation;
        self.tx_id = Some(tx_id);
        self.tx_hash = Some(tx_hash);
        self.sent_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), OrchestratorError> {
        if self.status.is_terminal() {
            return Err(self.transition_error(PaymentStatus::Failed));
        }
        self.status = PaymentStatus::Failed;
        self.failed_reason = Some(reason.into());
        self.failed_at = Some(Utc::now());
        Ok(())
    }

    // At most one transition per event; terminal states swallow replays.
    pub fn apply_webhook(
        &mut self,
        status: WebhookStatus,
        failed_reason: Option<String>,
    ) -> Result<WebhookOutcome, OrchestratorError> {
        if self.status.is_terminal() {
            return Ok(WebhookOutcome::Absorbed);
        }

        match status {
            WebhookStatus::Pending => Ok(WebhookOutcome::Absorbed),
            WebhookStatus::Completed => {
                if self.status != PaymentStatus::AwaitingConfirmation {
                    return Err(self.transition_error(PaymentStatus::Confirmed));
                }
                self.status = PaymentStatus::Confirmed;
                self.completed_at = Some(Utc::now());
                Ok(WebhookOutcome::Applied)
            }
            WebhookStatus::Failed => {
                self.fail(failed_reason.unwrap_or_else(|| "anchor reported failure".to_string()))?;
                Ok(WebhookOutcome::Applied)
            }
        }
    }
}
