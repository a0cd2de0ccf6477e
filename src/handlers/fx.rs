use crate::{
    error::OrchestratorError,
    models::{AnchorQuote, ApiResponse},
    services::{FxService, Metrics},
};
use axum::{extract::State, Json};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

#[derive(Clone)]
pub struct FxState {
    pub fx: Arc<FxService>,
    pub metrics: Arc<Metrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxQuoteRequest {
    pub source_currency: String,
    pub target_currency: String,
    pub amount: Decimal,
}

pub async fn quote_fixed_source(
    State(state): State<FxState>,
    Json(request): Json<FxQuoteRequest>,
) -> Result<Json<ApiResponse<AnchorQuote>>, OrchestratorError> {
    let started = Instant::now();
    let quote = state
        .fx
        .quote_for_source(
            &request.source_currency,
            &request.target_currency,
            request.amount,
        )
        .await?;
    state.metrics.record_rate_served(false, started.elapsed()).await;

    Ok(Json(ApiResponse {
        success: true,
        data: quote,
        timestamp: Utc::now(),
        cache_hit: false,
        data_source: state.fx.anchor_name().to_string(),
        request_id: Uuid::new_v4().to_string(),
    }))
}

pub async fn quote_fixed_target(
    State(state): State<FxState>,
    Json(request): Json<FxQuoteRequest>,
) -> Result<Json<ApiResponse<AnchorQuote>>, OrchestratorError> {
    let started = Instant::now();
    let quote = state
        .fx
        .quote_for_target(
            &request.source_currency,
            &request.target_currency,
            request.amount,
        )
        .await?;
    state.metrics.record_rate_served(false, started.elapsed()).await;

    Ok(Json(ApiResponse {
        success: true,
        data: quote,
        timestamp: Utc::now(),
        cache_hit: false,
        data_source: state.fx.anchor_name().to_string(),
        request_id: Uuid::new_v4().to_string(),
    }))
}
