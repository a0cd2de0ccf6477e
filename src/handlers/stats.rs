use crate::{models::Stats, services::Metrics};
use axum::{extract::State, Json};
use std::sync::Arc;

pub async fn get_stats(State(metrics): State<Arc<Metrics>>) -> Json<Stats> {
    Json(metrics.get_stats())
}
