use axum::{extract::State, routing::get, Json, Router};
use catering_lifecycle::{BookingStats, DashboardAnalytics, UserStats};

use crate::error::AppError;
use crate::response::{ok, ApiResponse};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/stats/bookings", get(booking_stats))
        .route("/v1/stats/users", get(user_stats))
        .route("/v1/analytics/dashboard", get(dashboard_analytics))
}

async fn booking_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BookingStats>>, AppError> {
    let counts = state.bookings.status_counts().await?;
    Ok(ok(BookingStats::from_counts(&counts)))
}

async fn user_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserStats>>, AppError> {
    let counts = state.users.user_status_counts().await?;
    Ok(ok(UserStats::from_counts(&counts)))
}

async fn dashboard_analytics(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardAnalytics>>, AppError> {
    let bookings = state.bookings.list().await?;
    Ok(ok(DashboardAnalytics::compute(&bookings, state.clock.now())))
}
