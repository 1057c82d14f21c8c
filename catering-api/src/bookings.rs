use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use catering_core::{Booking, BookingStatus};
use catering_lifecycle::{ExtraCharge, SweepReport, TransitionResult};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::response::{ok, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub rejection_reason: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", get(list_bookings))
        .route("/v1/bookings/expired/check", post(check_expired_bookings))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/{id}/status", post(update_booking_status))
        .route("/v1/bookings/{id}/payment", post(mark_payment_paid))
        .route("/v1/bookings/{id}/charges", post(add_extra_charge))
        .route("/v1/bookings/{id}/payment-deadline", post(set_payment_deadline))
}

async fn list_bookings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Booking>>>, AppError> {
    let bookings = state.lifecycle.list_bookings().await?;
    tracing::debug!(count = bookings.len(), "Listed bookings");
    Ok(ok(bookings))
}

async fn get_booking(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    Ok(ok(state.lifecycle.get_booking(id).await?))
}

async fn update_booking_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<TransitionResult>>, AppError> {
    let status: BookingStatus = req
        .status
        .parse()
        .map_err(|e: catering_core::ParseStatusError| AppError::Validation(e.to_string()))?;

    let result = state
        .lifecycle
        .update_booking_status(id, status, req.rejection_reason.as_deref())
        .await?;
    Ok(ok(result))
}

async fn mark_payment_paid(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<TransitionResult>>, AppError> {
    Ok(ok(state.lifecycle.mark_payment_paid(id).await?))
}

async fn add_extra_charge(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(charge): AppJson<ExtraCharge>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    Ok(ok(state.lifecycle.add_extra_charge(id, &charge).await?))
}

async fn set_payment_deadline(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    Ok(ok(state.lifecycle.set_payment_deadline(id).await?))
}

async fn check_expired_bookings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SweepReport>>, AppError> {
    Ok(ok(state.sweeper.sweep().await?))
}
