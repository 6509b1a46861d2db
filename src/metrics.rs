// =============================================================================
// METRICS MODULE
// =============================================================================
// This module sets up Prometheus metrics for observability.
//
// METRIC TYPES USED:
// - Counter: requests, rent/return attempts, revenue. Resets on restart.
// - Gauge: movies per status, active rentals.
// - Histogram: request latency.
// =============================================================================

use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::analytics;
use crate::models::MovieStatus;
use crate::store::RentalStore;

// =============================================================================
// METRIC NAMES
// =============================================================================

/// HTTP request counter
/// Labels: method, endpoint, status
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";

/// HTTP request duration histogram
/// Labels: method, endpoint
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

/// Rent/return attempts
/// Labels: operation (rent/return), outcome (success or an error code)
pub const RENTAL_OPERATIONS_TOTAL: &str = "rental_operations_total";

/// Sum of payment amounts taken since start
pub const RENTAL_REVENUE_TOTAL: &str = "rental_revenue_total";

/// Movies per availability status
/// Labels: status (Available/Rented)
pub const CATALOG_MOVIES: &str = "catalog_movies";

/// Rentals currently active
pub const RENTALS_ACTIVE: &str = "rentals_active";

// =============================================================================
// SETUP FUNCTION
// =============================================================================
/// Initialize the Prometheus recorder and install it globally.
///
/// Must be called at most once per process.
pub fn setup_metrics() -> Result<PrometheusHandle> {
    // Requests are served from memory, so the buckets sit lower than a
    // database-backed service would need
    let latency_buckets = &[
        0.0005, // 0.5ms
        0.001,  // 1ms
        0.0025, // 2.5ms
        0.005,  // 5ms
        0.01,   // 10ms
        0.025,  // 25ms
        0.05,   // 50ms
        0.1,    // 100ms
        0.25,   // 250ms
        1.0,    // 1 second
    ];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(HTTP_REQUEST_DURATION_SECONDS.to_string()),
            latency_buckets,
        )?
        .install_recorder()?;

    describe_counter!(HTTP_REQUESTS_TOTAL, "Total number of HTTP requests received");
    describe_histogram!(HTTP_REQUEST_DURATION_SECONDS, "HTTP request latency in seconds");
    describe_counter!(RENTAL_OPERATIONS_TOTAL, "Rent and return attempts by outcome");
    describe_counter!(RENTAL_REVENUE_TOTAL, "Total payment amount taken for rentals");
    describe_gauge!(CATALOG_MOVIES, "Number of movies in each availability status");
    describe_gauge!(RENTALS_ACTIVE, "Number of rentals not yet returned");

    Ok(handle)
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Record an HTTP request
pub fn record_http_request(method: &str, endpoint: &str, status: u16, duration_secs: f64) {
    counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .record(duration_secs);
}

/// Record a rent or return attempt
///
/// # Arguments
/// * `operation` - "rent" or "return"
/// * `outcome` - "success", or the store error code on failure
pub fn record_rental_operation(operation: &str, outcome: &str) {
    counter!(
        RENTAL_OPERATIONS_TOTAL,
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Add a payment amount to the revenue counter
pub fn record_revenue(amount: u64) {
    counter!(RENTAL_REVENUE_TOTAL).increment(amount);
}

/// Refresh the catalog and active-rental gauges from the store
pub fn update_store_gauges(store: &RentalStore) {
    for row in analytics::status_distribution(store.movies()) {
        let status = match row.status {
            MovieStatus::Available => "Available",
            MovieStatus::Rented => "Rented",
        };
        gauge!(CATALOG_MOVIES, "status" => status).set(row.count as f64);
    }

    let active = store.rentals().iter().filter(|r| r.is_active()).count();
    gauge!(RENTALS_ACTIVE).set(active as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::Seed;

    #[test]
    fn helpers_render_through_prometheus() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let store = RentalStore::new(Seed::builtin().unwrap()).unwrap();

        ::metrics::with_local_recorder(&recorder, || {
            record_http_request("GET", "/api/v1/movies", 200, 0.001);
            record_http_request("GET", "/api/v1/movies", 200, 0.002);
            record_rental_operation("rent", "MOVIE_NOT_AVAILABLE");
            record_revenue(180);
            update_store_gauges(&store);
        });

        let text = handle.render();
        assert!(text.contains(r#"http_requests_total{method="GET",endpoint="/api/v1/movies",status="200"} 2"#));
        assert!(text.contains("http_request_duration_seconds"));
        assert!(text.contains(r#"rental_operations_total{operation="rent",outcome="MOVIE_NOT_AVAILABLE"} 1"#));
        assert!(text.contains("rental_revenue_total 180"));
        assert!(text.contains(r#"catalog_movies{status="Available"} 16"#));
        assert!(text.contains(r#"catalog_movies{status="Rented"} 2"#));
        assert!(text.contains("rentals_active 2"));
    }
}
