use axum::Json;
use serde::Serialize;

/// Success envelope shared by every endpoint. Failures go through
/// `AppError`, which renders `{"success": false, "error": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}
