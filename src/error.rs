use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{PaymentRail, PaymentStatus};

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Either source_amount or target_amount is required")]
    MissingAmount,

    #[error("Anchor {anchor} does not support {currency}")]
    UnsupportedCurrency { anchor: String, currency: String },

    #[error("No anchor can serve {source_currency} -> {target_currency} via {rail}")]
    NoEligibleAnchor {
        source_currency: String,
        target_currency: String,
        rail: PaymentRail,
    },

    #[error("Anchor {anchor} returned no liquidation address")]
    NoLiquidationAddress { anchor: String },

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    #[error("Destination not found: {0}")]
    DestinationNotFound(String),

    #[error("Invalid transition for payment {payment_id}: {from} -> {to}")]
    InvalidTransition {
        payment_id: String,
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("Webhook references unknown payment: {0}")]
    WebhookMismatch(String),

    #[error("Webhook signature verification failed")]
    InvalidSignature,

    #[error("Anchor {anchor} error: {message}")]
    AnchorError { anchor: String, message: String },

    #[error("{anchor} does not support {operation}")]
    NotImplemented { anchor: String, operation: String },

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Anyhow error: {0}")]
    AnyhowError(#[from] anyhow::Error),
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub request_id: String,
}

impl IntoResponse for OrchestratorError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();

        let (status, error_code) = match &self {
            OrchestratorError::MissingAmount => (StatusCode::BAD_REQUEST, "MISSING_AMOUNT"),
            OrchestratorError::UnsupportedCurrency { .. } => {
                (StatusCode::BAD_REQUEST, "UNSUPPORTED_CURRENCY")
            }
            OrchestratorError::NoEligibleAnchor { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "NO_ELIGIBLE_ANCHOR")
            }
            OrchestratorError::NoLiquidationAddress { .. } => {
                (StatusCode::BAD_GATEWAY, "NO_LIQUIDATION_ADDRESS")
            }
            OrchestratorError::PaymentNotFound(_) => (StatusCode::NOT_FOUND, "PAYMENT_NOT_FOUND"),
            OrchestratorError::WalletNotFound(_) => (StatusCode::NOT_FOUND, "WALLET_NOT_FOUND"),
            OrchestratorError::DestinationNotFound(_) => {
                (StatusCode::NOT_FOUND, "DESTINATION_NOT_FOUND")
            }
            OrchestratorError::InvalidTransition { .. } => {
                (StatusCode::CONFLICT, "INVALID_TRANSITION")
            }
            OrchestratorError::WebhookMismatch(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "WEBHOOK_MISMATCH")
            }
            OrchestratorError::InvalidSignature => (StatusCode::UNAUTHORIZED, "INVALID_SIGNATURE"),
            OrchestratorError::AnchorError { .. } => (StatusCode::BAD_GATEWAY, "ANCHOR_ERROR"),
            OrchestratorError::NotImplemented { .. } => {
                (StatusCode::NOT_IMPLEMENTED, "NOT_IMPLEMENTED")
            }
            OrchestratorError::HttpError(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            error_code: error_code.to_string(),
            timestamp: Utc::now(),
            request_id,
        };

        tracing::error!(
            error = ?self,
            error_code = error_code,
            "Request failed"
        );

        (status, Json(body)).into_response()
    }
}
