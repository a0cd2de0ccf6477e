use crate::{
    error::OrchestratorError,
    models::{ApiResponse, RateRequest, SelectedRate},
};
use axum::{extract::State, Json};
use chrono::Utc;
use std::time::Instant;
use uuid::Uuid;

use super::payments::AppState;

pub async fn get_rate(
    State(state): State<AppState>,
    Json(request): Json<RateRequest>,
) -> Result<Json<ApiResponse<SelectedRate>>, OrchestratorError> {
    let started = Instant::now();
    let selected = state.orchestrator.get_rate(&request).await?;
    state.metrics.record_rate_served(false, started.elapsed()).await;

    let data_source = selected.anchor.clone();
    Ok(Json(ApiResponse {
        success: true,
        data: selected,
        timestamp: Utc::now(),
        cache_hit: false,
        data_source,
        request_id: Uuid::new_v4().to_string(),
    }))
}
