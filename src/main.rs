// =============================================================================
// RENTAL SERVICE - Main Entry Point
// =============================================================================
// WHAT THIS SERVICE DOES:
// - Holds a movie catalog, its users, rentals and payments in memory
// - Lets clients rent and return movies
// - Serves the aggregates the dashboards chart (revenue, genres, payment modes)
// - Exposes Prometheus metrics for observability
//
// State is seeded from a built-in dataset on every start; nothing is
// persisted.
// =============================================================================

// -----------------------------------------------------------------------------
// MODULE DECLARATIONS
// -----------------------------------------------------------------------------
mod analytics; // Catalog search and dashboard aggregates (analytics.rs)
mod config;    // Configuration loading (config.rs)
mod error;     // Error types (error.rs)
mod extract;   // Request extractors with JSON rejections (extract.rs)
mod handlers;  // HTTP request handlers (handlers.rs)
mod metrics;   // Prometheus metrics setup (metrics.rs)
mod models;    // Data structures (models.rs)
mod seed;      // Built-in dataset (seed.rs)
mod store;     // Catalog/rental store (store.rs)

use axum::{
    routing::{get, post},
    Router,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::metrics::setup_metrics;
use crate::models::UserId;
use crate::seed::Seed;
use crate::store::RentalStore;

// -----------------------------------------------------------------------------
// APPLICATION STATE
// -----------------------------------------------------------------------------
// Shared by every request handler through Arc<AppState>.
//
// LEARNING NOTE:
// The store is mutated by rent/return, so it needs interior mutability.
// RwLock lets any number of readers in at once while writers get exclusive
// access. parking_lot's lock never poisons, so there is no unwrap on lock().
pub struct AppState {
    /// The one store instance for this process
    pub store: RwLock<RentalStore>,

    /// Renter used when a rent request omits user_id
    pub default_user_id: UserId,

    /// Prometheus metrics handle
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

// -----------------------------------------------------------------------------
// ROUTES
// -----------------------------------------------------------------------------
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // ----- Health & Readiness Endpoints -----
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        // ----- Metrics Endpoint -----
        .route("/metrics", get(handlers::metrics_handler))
        // ----- Store reads -----
        .route("/api/v1/snapshot", get(handlers::get_snapshot))
        .route("/api/v1/users", get(handlers::list_users))
        .route("/api/v1/movies", get(handlers::list_movies))
        .route("/api/v1/movies/:id", get(handlers::get_movie))
        .route("/api/v1/genres", get(handlers::list_genres))
        .route("/api/v1/payments", get(handlers::list_payments))
        // ----- Rent / return -----
        .route(
            "/api/v1/rentals",
            get(handlers::list_rentals).post(handlers::rent_movie),
        )
        .route("/api/v1/rentals/:id/return", post(handlers::return_movie))
        // ----- Aggregates -----
        .route("/api/v1/stats/catalog", get(handlers::catalog_stats))
        .route("/api/v1/stats/dashboard", get(handlers::dashboard_stats))
        .route("/api/v1/stats/payments", get(handlers::payment_stats))
        // ----- Middleware Layers -----
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// -----------------------------------------------------------------------------
// MAIN FUNCTION
// -----------------------------------------------------------------------------
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -------------------------------------------------------------------------
    // STEP 1: Load environment variables
    // -------------------------------------------------------------------------
    dotenvy::dotenv().ok(); // .env is optional

    // -------------------------------------------------------------------------
    // STEP 2: Initialize logging/tracing
    // -------------------------------------------------------------------------
    // JSON output; RUST_LOG overrides the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rental_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting Rental Service...");

    // -------------------------------------------------------------------------
    // STEP 3: Load configuration
    // -------------------------------------------------------------------------
    let config = Config::from_env()?;
    info!(
        port = config.port,
        default_user_id = config.default_user_id,
        "Configuration loaded"
    );

    // -------------------------------------------------------------------------
    // STEP 4: Set up Prometheus metrics
    // -------------------------------------------------------------------------
    let metrics_handle = setup_metrics()?;
    info!("Prometheus metrics initialized");

    // -------------------------------------------------------------------------
    // STEP 5: Build the store from the seed
    // -------------------------------------------------------------------------
    // A seed that breaks the store's invariants aborts startup
    let store = RentalStore::new(Seed::builtin()?)?;
    if store.user(config.default_user_id).is_none() {
        tracing::warn!(
            default_user_id = config.default_user_id,
            "Default renter does not exist; rent requests without user_id will fail"
        );
    }
    metrics::update_store_gauges(&store);
    info!(
        users = store.users().len(),
        movies = store.movies().len(),
        rentals = store.rentals().len(),
        payments = store.payments().len(),
        "Store seeded"
    );

    // -------------------------------------------------------------------------
    // STEP 6: Create application state and routes
    // -------------------------------------------------------------------------
    let state = Arc::new(AppState {
        store: RwLock::new(store),
        default_user_id: config.default_user_id,
        metrics_handle,
    });
    let app = router(state);

    // -------------------------------------------------------------------------
    // STEP 7: Start the HTTP server
    // -------------------------------------------------------------------------
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(address = %addr, "Rental Service is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
