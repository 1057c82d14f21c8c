use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::response::{ok, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub database_time: DateTime<Utc>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> Result<Json<ApiResponse<HealthResponse>>, AppError> {
    let database_time = state.probe.ping().await?;
    Ok(ok(HealthResponse { database_time }))
}
