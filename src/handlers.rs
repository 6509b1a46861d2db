// =============================================================================
// HANDLERS MODULE
// =============================================================================
// This module contains all HTTP request handlers (controller layer).
//
// LEARNING NOTES:
// - Handlers are async functions that receive requests and return responses
// - Axum uses "extractors" to parse request data (path params, JSON body, etc.)
// - State is shared via the State<T> extractor
// - Body, query and path extractors come from crate::extract so a malformed
//   request is answered with the standard JSON error body
//
// LOCKING:
// The store sits behind a parking_lot RwLock. Reads take the read lock just
// long enough to copy out what they need; rent/return take the write lock for
// the whole read-modify-write. No guard is ever held across an .await.
// =============================================================================

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

use crate::analytics::{self, MovieQuery, MovieSort, PaymentSort, RentalFilter};
use crate::error::{AppError, AppResult};
use crate::extract::{self, Path, Query};
use crate::metrics;
use crate::models::*;
use crate::store::Snapshot;
use crate::AppState;

/// Status code recorded for a handler result
fn status_of<T>(result: &AppResult<T>, ok: StatusCode) -> u16 {
    match result {
        Ok(_) => ok.as_u16(),
        Err(e) => e.status_code().as_u16(),
    }
}

// =============================================================================
// HEALTH CHECK ENDPOINTS
// =============================================================================

/// Liveness check - Is the service running?
///
/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "rental-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check - Is the store consistent?
///
/// Returns 503 if movie statuses and active rentals disagree.
///
/// GET /ready
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReadinessResponse>, StatusCode> {
    let store_healthy = match state.store.read().check_invariants() {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Store invariant check failed");
            false
        }
    };

    if store_healthy {
        Ok(Json(ReadinessResponse {
            status: "ready".to_string(),
            checks: ReadinessChecks {
                store: store_healthy,
            },
        }))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

// =============================================================================
// METRICS ENDPOINT
// =============================================================================
/// Prometheus metrics endpoint
///
/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}

// =============================================================================
// SNAPSHOT
// =============================================================================
/// Full copy of users, movies, rentals and payments with the store version.
///
/// Clients can compare `version` to detect that something changed.
///
/// GET /api/v1/snapshot
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    let start = Instant::now();
    let snapshot = state.store.read().snapshot();

    metrics::record_http_request(
        "GET",
        "/api/v1/snapshot",
        200,
        start.elapsed().as_secs_f64(),
    );
    Json(snapshot)
}

/// GET /api/v1/users
pub async fn list_users(State(state): State<Arc<AppState>>) -> Json<Vec<User>> {
    let start = Instant::now();
    let users = state.store.read().users().to_vec();

    metrics::record_http_request("GET", "/api/v1/users", 200, start.elapsed().as_secs_f64());
    Json(users)
}

// =============================================================================
// CATALOG
// =============================================================================

// -----------------------------------------------------------------------------
// QUERY PARAMETERS
// -----------------------------------------------------------------------------
/// Query parameters for the catalog endpoint
///
/// # Example
/// GET /api/v1/movies?search=nolan&genre=Sci-Fi&sort=rating
#[derive(Debug, Deserialize)]
pub struct MovieListParams {
    pub search: Option<String>,

    /// Genre name, or "All"
    pub genre: Option<String>,

    /// title (default), rating, year or price
    #[serde(default)]
    pub sort: MovieSort,

    /// Hide rented titles (default: true)
    #[serde(default = "default_available_only")]
    pub available_only: bool,
}

fn default_available_only() -> bool {
    true
}

/// Search, filter and sort the catalog
///
/// GET /api/v1/movies
pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MovieListParams>,
) -> Json<Vec<Movie>> {
    let start = Instant::now();

    let query = MovieQuery {
        search: params.search,
        genre: params.genre,
        sort: params.sort,
        available_only: params.available_only,
    };
    let movies = analytics::search_movies(state.store.read().movies(), &query);

    metrics::record_http_request("GET", "/api/v1/movies", 200, start.elapsed().as_secs_f64());
    Json(movies)
}

/// GET /api/v1/movies/:id
///
/// # Response
/// - 200 OK: the movie
/// - 404 Not Found: no movie with that id
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MovieId>,
) -> AppResult<Json<Movie>> {
    let start = Instant::now();

    let result = state
        .store
        .read()
        .movie(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Movie not found: {}", id)));

    metrics::record_http_request(
        "GET",
        "/api/v1/movies/:id",
        status_of(&result, StatusCode::OK),
        start.elapsed().as_secs_f64(),
    );

    Ok(Json(result?))
}

/// Genre filter options, "All" first
///
/// GET /api/v1/genres
pub async fn list_genres(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    let start = Instant::now();
    let genres = analytics::genres(state.store.read().movies());

    metrics::record_http_request("GET", "/api/v1/genres", 200, start.elapsed().as_secs_f64());
    Json(genres)
}

// =============================================================================
// RENTALS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RentalListParams {
    /// all (default), active or returned
    #[serde(default)]
    pub status: RentalFilter,
}

/// GET /api/v1/rentals?status=active
pub async fn list_rentals(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RentalListParams>,
) -> Json<Vec<Rental>> {
    let start = Instant::now();
    let rentals = analytics::filter_rentals(state.store.read().rentals(), params.status);

    metrics::record_http_request("GET", "/api/v1/rentals", 200, start.elapsed().as_secs_f64());
    Json(rentals)
}

// -----------------------------------------------------------------------------
// RENT A MOVIE
// -----------------------------------------------------------------------------
/// Rent a movie
///
/// POST /api/v1/rentals
///
/// # Request Body
/// ```json
/// { "movie_id": 103, "user_id": 1 }
/// ```
///
/// # Response
/// - 201 Created: rental and payment records
/// - 400 Bad Request: body missing or malformed
/// - 404 Not Found: unknown movie or user
/// - 409 Conflict: movie already rented
pub async fn rent_movie(
    State(state): State<Arc<AppState>>,
    extract::Json(request): extract::Json<RentMovieRequest>,
) -> AppResult<(StatusCode, Json<Receipt>)> {
    let start = Instant::now();
    let user_id = request.user_id.unwrap_or(state.default_user_id);

    tracing::info!(
        movie_id = request.movie_id,
        user_id = user_id,
        "Attempting to rent movie"
    );

    let result = {
        let mut store = state.store.write();
        let result = store.rent_movie(request.movie_id, user_id);
        if result.is_ok() {
            metrics::update_store_gauges(&store);
        }
        result
    };

    let duration = start.elapsed().as_secs_f64();

    match result {
        Ok(receipt) => {
            metrics::record_http_request("POST", "/api/v1/rentals", 201, duration);
            metrics::record_rental_operation("rent", "success");
            metrics::record_revenue(receipt.payment.amount);

            tracing::info!(
                rental_id = receipt.rental.id,
                payment_id = receipt.payment.id,
                amount = receipt.payment.amount,
                "Movie rented"
            );

            Ok((StatusCode::CREATED, Json(receipt)))
        }
        Err(e) => {
            metrics::record_rental_operation("rent", e.code());
            let error = AppError::from(e);
            metrics::record_http_request(
                "POST",
                "/api/v1/rentals",
                error.status_code().as_u16(),
                duration,
            );

            tracing::warn!(
                movie_id = request.movie_id,
                user_id = user_id,
                error = %error,
                "Failed to rent movie"
            );

            Err(error)
        }
    }
}

// -----------------------------------------------------------------------------
// RETURN A MOVIE
// -----------------------------------------------------------------------------
/// Return a rented movie
///
/// POST /api/v1/rentals/:id/return
///
/// # Response
/// - 200 OK: the rental, now Returned
/// - 404 Not Found: unknown rental
/// - 409 Conflict: rental was already returned
pub async fn return_movie(
    State(state): State<Arc<AppState>>,
    Path(rental_id): Path<RentalId>,
) -> AppResult<Json<Rental>> {
    let start = Instant::now();

    tracing::info!(rental_id = rental_id, "Returning movie");

    let result = {
        let mut store = state.store.write();
        let result = store.return_movie(rental_id);
        if result.is_ok() {
            metrics::update_store_gauges(&store);
        }
        result
    };

    let duration = start.elapsed().as_secs_f64();

    match result {
        Ok(rental) => {
            metrics::record_http_request("POST", "/api/v1/rentals/:id/return", 200, duration);
            metrics::record_rental_operation("return", "success");

            tracing::info!(
                rental_id = rental.id,
                movie_id = rental.movie_id,
                "Movie returned"
            );

            Ok(Json(rental))
        }
        Err(e) => {
            metrics::record_rental_operation("return", e.code());
            let error = AppError::from(e);
            metrics::record_http_request(
                "POST",
                "/api/v1/rentals/:id/return",
                error.status_code().as_u16(),
                duration,
            );

            tracing::warn!(rental_id = rental_id, error = %error, "Failed to return movie");

            Err(error)
        }
    }
}

// =============================================================================
// PAYMENTS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct PaymentListParams {
    /// "all" (default) or a payment mode name such as "UPI"
    pub method: Option<String>,

    /// date (default), amount or method
    #[serde(default)]
    pub sort: PaymentSort,
}

/// "all" or blank means no filter
fn parse_method(raw: Option<&str>) -> AppResult<Option<PaymentMode>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(m) if m.eq_ignore_ascii_case("all") => Ok(None),
        Some(m) => m
            .parse::<PaymentMode>()
            .map(Some)
            .map_err(|e| AppError::BadRequest(e.to_string())),
    }
}

/// GET /api/v1/payments?method=UPI&sort=amount
///
/// # Response
/// - 200 OK: matching payments
/// - 400 Bad Request: unknown payment method
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaymentListParams>,
) -> AppResult<Json<Vec<Payment>>> {
    let start = Instant::now();

    let result = parse_method(params.method.as_deref()).map(|method| {
        analytics::filter_payments(state.store.read().payments(), method, params.sort)
    });

    metrics::record_http_request(
        "GET",
        "/api/v1/payments",
        status_of(&result, StatusCode::OK),
        start.elapsed().as_secs_f64(),
    );

    Ok(Json(result?))
}

// =============================================================================
// STATISTICS
// =============================================================================

/// GET /api/v1/stats/catalog
pub async fn catalog_stats(State(state): State<Arc<AppState>>) -> Json<CatalogStats> {
    let start = Instant::now();
    let stats = analytics::catalog_stats(state.store.read().movies());

    metrics::record_http_request(
        "GET",
        "/api/v1/stats/catalog",
        200,
        start.elapsed().as_secs_f64(),
    );
    Json(stats)
}

/// GET /api/v1/stats/dashboard
pub async fn dashboard_stats(State(state): State<Arc<AppState>>) -> Json<DashboardStats> {
    let start = Instant::now();

    // Aggregate outside the lock
    let snapshot = state.store.read().snapshot();
    let stats = analytics::dashboard(&snapshot);

    metrics::record_http_request(
        "GET",
        "/api/v1/stats/dashboard",
        200,
        start.elapsed().as_secs_f64(),
    );
    Json(stats)
}

/// GET /api/v1/stats/payments
pub async fn payment_stats(State(state): State<Arc<AppState>>) -> Json<PaymentSummary> {
    let start = Instant::now();
    let summary = analytics::payment_summary(state.store.read().payments());

    metrics::record_http_request(
        "GET",
        "/api/v1/stats/payments",
        200,
        start.elapsed().as_secs_f64(),
    );
    Json(summary)
}
