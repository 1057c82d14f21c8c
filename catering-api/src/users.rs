use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use catering_core::{User, UserCredentials, UserStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::response::{ok, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct EmailLookupRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct UserStatusResponse {
    pub status: UserStatus,
    pub is_blocked: bool,
}

#[derive(Debug, Serialize)]
pub struct BookingCountResponse {
    pub user_id: Uuid,
    pub count: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/users", get(list_users))
        .route("/v1/users/lookup", post(users_by_ids))
        .route("/v1/users/by-email", post(user_by_email))
        .route("/v1/users/{id}/status", get(user_status).post(update_user_status))
        .route("/v1/users/{id}/bookings/count", get(booking_count))
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

async fn list_users(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    Ok(ok(state.users.list_users().await?))
}

async fn users_by_ids(
    State(state): State<AppState>,
    AppJson(req): AppJson<LookupRequest>,
) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    Ok(ok(state.users.users_by_ids(&req.ids).await?))
}

/// Credential lookup for the login flow. Internal only: the response carries
/// the password hash, so this route must not be exposed to browsers.
async fn user_by_email(
    State(state): State<AppState>,
    AppJson(req): AppJson<EmailLookupRequest>,
) -> Result<Json<ApiResponse<UserCredentials>>, AppError> {
    let credentials = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(ok(credentials))
}

async fn user_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<UserStatusResponse>>, AppError> {
    let user = state.users.find_user(id).await?.ok_or_else(user_not_found)?;
    Ok(ok(UserStatusResponse {
        status: user.status,
        is_blocked: user.is_blocked(),
    }))
}

async fn update_user_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateUserStatusRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let status: UserStatus = req
        .status
        .parse()
        .map_err(|e: catering_core::ParseStatusError| AppError::Validation(e.to_string()))?;

    let user = state
        .users
        .update_user_status(id, status, state.clock.now())
        .await?
        .ok_or_else(user_not_found)?;
    tracing::info!(user_id = %id, status = %status, "User status updated");
    Ok(ok(user))
}

async fn booking_count(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<BookingCountResponse>>, AppError> {
    let count = state.bookings.count_for_user(id).await?;
    Ok(ok(BookingCountResponse { user_id: id, count }))
}
