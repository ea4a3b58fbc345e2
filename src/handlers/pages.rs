use axum::{
    http::StatusCode,
    response::{Html, IntoResponse},
};

use crate::error::NOT_FOUND_PAGE;

/// Handle GET /
pub async fn home() -> Html<&'static str> {
    Html("<h1>Distant Reading Archive</h1><p>This is a prototype API</p>")
}

/// Global fallback for unmatched routes
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE))
}
