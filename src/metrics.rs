use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics exporter
///
/// Installs the process-wide recorder; call once at server start. Tests build
/// a local recorder instead of installing the global one.
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();

    let handle = builder
        .install_recorder()
        .expect("Failed to install Prometheus recorder");

    init_metric_descriptions();

    handle
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    describe_counter!(
        "books_api_requests_total",
        "Total number of requests to the Books API"
    );
    describe_gauge!(
        "books_api_requests_in_progress",
        "Number of requests in progress"
    );
    describe_histogram!(
        "books_api_request_duration_seconds",
        "Time spent processing request"
    );
    describe_counter!(
        "books_api_exceptions_total",
        "Exceptions caught during request processing"
    );
    describe_counter!(
        "books_api_db_operations_total",
        "Total database operations"
    );
    describe_gauge!(
        "books_api_books_count",
        "Number of books in the database"
    );
}

/// Record a completed request
pub fn record_request(method: &str, endpoint: &str, status: u16) {
    counter!(
        "books_api_requests_total",
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
}

/// Mark a request as in progress
pub fn request_started() {
    gauge!("books_api_requests_in_progress").increment(1.0);
}

/// Mark an in-progress request as finished
pub fn request_completed() {
    gauge!("books_api_requests_in_progress").decrement(1.0);
}

/// Record request duration
pub fn record_duration(duration: Duration) {
    histogram!("books_api_request_duration_seconds").record(duration.as_secs_f64());
}

/// Record an exception caught at a handler boundary
pub fn record_exception() {
    counter!("books_api_exceptions_total").increment(1);
}

/// Record a database operation by kind (`read_all`, `read_one`, `create`)
pub fn record_db_operation(operation: &str) {
    counter!(
        "books_api_db_operations_total",
        "operation" => operation.to_string(),
    )
    .increment(1);
}

/// Set the last-observed record count gauge
pub fn set_books_count(count: i64) {
    gauge!("books_api_books_count").set(count as f64);
}
