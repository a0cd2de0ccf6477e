use crate::{
    models::{ApiResponse, DestinationRecord, NewDestination, NewWallet, WalletRecord},
    services::PaymentStore,
};
use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub async fn create_wallet(
    State(store): State<Arc<PaymentStore>>,
    Json(request): Json<NewWallet>,
) -> Json<ApiResponse<WalletRecord>> {
    let record = store.insert_wallet(WalletRecord::new(request)).await;

    Json(ApiResponse {
        success: true,
        data: record,
        timestamp: Utc::now(),
        cache_hit: false,
        data_source: "orchestrator".to_string(),
        request_id: Uuid::new_v4().to_string(),
    })
}

pub async fn create_destination(
    State(store): State<Arc<PaymentStore>>,
    Json(request): Json<NewDestination>,
) -> Json<ApiResponse<DestinationRecord>> {
    let record = store.insert_destination(DestinationRecord::new(request)).await;

    Json(ApiResponse {
        success: true,
        data: record,
        timestamp: Utc::now(),
        cache_hit: false,
        data_source: "orchestrator".to_string(),
        request_id: Uuid::new_v4().to_string(),
    })
}
