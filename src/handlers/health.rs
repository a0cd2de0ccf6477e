use crate::{
    anchors::AnchorRegistry,
    models::HealthStatus,
    services::{CacheService, Metrics},
};
use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

#[derive(Clone)]
pub struct HealthState {
    pub cache: Arc<CacheService>,
    pub registry: Arc<AnchorRegistry>,
    pub metrics: Arc<Metrics>,
}

pub async fn health_check(State(state): State<HealthState>) -> Json<HealthStatus> {
    let redis_ok = state.cache.ping().await.unwrap_or(false);
    let anchors = state.registry.names();

    let status = if redis_ok && !anchors.is_empty() {
        "healthy"
    } else if !anchors.is_empty() {
        "degraded"
    } else {
        "unhealthy"
    };

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        redis: redis_ok,
        anchors,
        uptime_seconds: state.metrics.uptime_seconds(),
        timestamp: Utc::now(),
    })
}
