use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, path::Path, sync::Arc, time::Instant};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{config::Config, handlers, metrics, store::BookStore};

/// Shared state for the book endpoints
#[derive(Clone)]
pub struct AppState {
    pub store: BookStore,
    pub config: Arc<Config>,
}

/// Start the Books API server
///
/// This function:
/// 1. Initializes metrics
/// 2. Prepares the database file and applies migrations
/// 3. Creates the Axum application
/// 4. Binds to the configured address
/// 5. Serves requests with graceful shutdown support
pub async fn start_server(config: Config) -> Result<()> {
    info!("Initializing Prometheus metrics...");
    let metrics_handle = Arc::new(metrics::init_metrics());

    // The store path is relative by default; its directory must exist before
    // SQLite can create the file.
    if let Some(parent) = Path::new(&config.database.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }
    }

    let store = BookStore::new(&config.database.path);
    store.migrate().await?;

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    info!("Starting Books API on {}", addr);
    info!(
        "Database: {}, first-book fallback: {}",
        config.database.path, config.compat.first_book_fallback
    );

    let state = AppState {
        store,
        config: Arc::new(config),
    };
    let app = create_router(state, metrics_handle);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState, metrics_handle: Arc<PrometheusHandle>) -> Router {
    let api_routes = Router::new()
        .route(
            "/books",
            get(handlers::books::list_books).post(handlers::books::create_book),
        )
        .route("/books/:id", get(handlers::books::get_book))
        // Legacy API kept for backward compatibility
        .route(
            "/api/v2/resources/books/all",
            get(handlers::books::list_books),
        )
        .route(
            "/api/v2/resources/books",
            get(handlers::books::filter_books).post(handlers::books::create_book_legacy),
        )
        .with_state(state);

    Router::new()
        .route("/", get(handlers::pages::home))
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics_handler::metrics))
        .with_state(metrics_handle)
        .merge(api_routes)
        .fallback(handlers::pages::not_found)
        .layer(middleware::from_fn(track_metrics))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http())
}

/// Request instrumentation applied around every route
///
/// Maintains the in-progress gauge, the latency histogram, and the request
/// counter labeled by (method, endpoint, status).
async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    // Label with the route template, not the raw URI, to bound cardinality.
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    metrics::request_started();
    let response = next.run(req).await;
    metrics::request_completed();

    metrics::record_duration(start.elapsed());
    metrics::record_request(&method, &endpoint, response.status().as_u16());

    response
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to setup Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to setup SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, initiating graceful shutdown"),
        _ = terminate => info!("SIGTERM received, initiating graceful shutdown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_router() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = BookStore::new(dir.path().join("books.db"));
        store.migrate().await.unwrap();

        let state = AppState {
            store,
            config: Arc::new(Config::default()),
        };

        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let metrics_handle = Arc::new(recorder.handle());

        let _app = create_router(state, metrics_handle);
        // Router created successfully - no panic
    }
}
