use crate::{
    error::OrchestratorError,
    models::{ApiResponse, PaymentStatus, WebhookEvent, WebhookOutcome},
};
use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::payments::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub payment_id: String,
    pub status: PaymentStatus,
    pub applied: bool,
}

// Signature verification happens in middleware before the body reaches
// this handler; anything that arrives here is authenticated.
pub async fn receive_webhook(
    State(state): State<AppState>,
    Json(event): Json<WebhookEvent>,
) -> Result<Json<ApiResponse<WebhookAck>>, OrchestratorError> {
    let (record, outcome) = state.orchestrator.process_webhook(&event).await?;

    let data_source = record.anchor.clone();
    Ok(Json(ApiResponse {
        success: true,
        data: WebhookAck {
            payment_id: record.id,
            status: record.status,
            applied: outcome == WebhookOutcome::Applied,
        },
        timestamp: Utc::now(),
        cache_hit: false,
        data_source,
        request_id: Uuid::new_v4().to_string(),
    }))
}
