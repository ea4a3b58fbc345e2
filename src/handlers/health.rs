use axum::{http::StatusCode, response::IntoResponse};

/// Health check endpoint
/// Returns 200 OK if the service is running
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
