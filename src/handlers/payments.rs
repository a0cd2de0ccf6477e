use crate::{
    error::OrchestratorError,
    models::{ApiResponse, ConfirmRequest, PaymentInstructions, PaymentRecord, PaymentRequest},
    services::{Metrics, OrchestratorService},
};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<OrchestratorService>,
    pub metrics: Arc<Metrics>,
}

pub async fn create_payment(
    State(state): State<AppState>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<ApiResponse<PaymentRecord>>, OrchestratorError> {
    let record = state.orchestrator.initiate_payment(&request).await?;

    let data_source = record.anchor.clone();
    Ok(Json(ApiResponse {
        success: true,
        data: record,
        timestamp: Utc::now(),
        cache_hit: false,
        data_source,
        request_id: Uuid::new_v4().to_string(),
    }))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<Json<ApiResponse<PaymentRecord>>, OrchestratorError> {
    let record = state.orchestrator.payment_state(&payment_id).await?;

    let data_source = record.anchor.clone();
    Ok(Json(ApiResponse {
        success: true,
        data: record,
        timestamp: Utc::now(),
        cache_hit: false,
        data_source,
        request_id: Uuid::new_v4().to_string(),
    }))
}

pub async fn get_payment_instructions(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<Json<ApiResponse<PaymentInstructions>>, OrchestratorError> {
    let record = state.orchestrator.payment_state(&payment_id).await?;
    let instructions = state.orchestrator.payment_instructions(&payment_id).await?;

    Ok(Json(ApiResponse {
        success: true,
        data: instructions,
        timestamp: Utc::now(),
        cache_hit: false,
        data_source: record.anchor,
        request_id: Uuid::new_v4().to_string(),
    }))
}

pub async fn settle_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<Json<ApiResponse<PaymentRecord>>, OrchestratorError> {
    let record = state.orchestrator.settle_payment(&payment_id).await?;

    let data_source = record.anchor.clone();
    Ok(Json(ApiResponse {
        success: true,
        data: record,
        timestamp: Utc::now(),
        cache_hit: false,
        data_source,
        request_id: Uuid::new_v4().to_string(),
    }))
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
    Json(request): Json<ConfirmRequest>,
) -> Result<Json<ApiResponse<PaymentRecord>>, OrchestratorError> {
    let record = state.orchestrator.confirm_payment(&payment_id, &request).await?;

    let data_source = record.anchor.clone();
    Ok(Json(ApiResponse {
        success: true,
        data: record,
        timestamp: Utc::now(),
        cache_hit: false,
        data_source,
        request_id: Uuid::new_v4().to_string(),
    }))
}
