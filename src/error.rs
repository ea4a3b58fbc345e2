use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::metrics;

/// Body served for unmatched routes and for filter queries with no
/// recognized parameters.
pub const NOT_FOUND_PAGE: &str = "<h1>404</h1><p>The resource could not be found</p>";

/// Plaintext body served when a write payload is missing or not JSON.
const NOT_JSON_BODY: &str = "<p>The content isn't of type JSON</p>";

/// Application error types
///
/// Every handler catches failures at its own boundary by returning one of
/// these; nothing propagates past the handler.
#[derive(Debug)]
pub enum AppError {
    /// Write payload was missing or not JSON
    NotJson,
    /// No record matched the request
    NotFound(String),
    /// Filter query carried no recognized constraint
    EmptyFilter,
    /// Backing store failure
    Store(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotJson => write!(f, "Request body is not JSON"),
            Self::NotFound(msg) => write!(f, "{}", msg),
            Self::EmptyFilter => write!(f, "No filter parameters supplied"),
            Self::Store(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::NotJson => (StatusCode::BAD_REQUEST, NOT_JSON_BODY).into_response(),
            Self::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            // The legacy filter route answers an empty query with the static
            // not-found page, not a JSON error.
            Self::EmptyFilter => (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)).into_response(),
            Self::Store(message) => {
                tracing::error!(error = %message, "store failure while handling request");
                metrics::record_exception();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": message })),
                )
                    .into_response()
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(format!("Database error: {}", err))
    }
}

impl From<crate::filter::EmptyFilter> for AppError {
    fn from(_: crate::filter::EmptyFilter) -> Self {
        Self::EmptyFilter
    }
}
