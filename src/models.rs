// =============================================================================
// MODELS MODULE
// =============================================================================
// This module defines the data structures used throughout the service:
// the four catalog entities, API request/response bodies, and the
// aggregate rows the dashboards are built from.
//
// LEARNING NOTES:
// - Enums with unit variants model closed sets (role, status, payment mode)
// - Serde's rename attributes keep the JSON spelling independent of Rust names
// - chrono::NaiveDate serializes as "YYYY-MM-DD"
// =============================================================================

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// IDENTIFIERS
// -----------------------------------------------------------------------------
pub type UserId = u64;
pub type MovieId = u64;
pub type RentalId = u64;
pub type PaymentId = u64;

// =============================================================================
// USER
// =============================================================================

/// Account role. Only `Customer` accounts count towards the customer total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Customer,
    Admin,
}

/// A registered account. Users never change after the seed is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

// =============================================================================
// MOVIE
// =============================================================================

/// Availability of a catalog title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovieStatus {
    Available,
    Rented,
}

/// A catalog entry.
///
/// `status` is the only field that changes at runtime, and only the store's
/// rent/return operations write it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,

    pub title: String,

    /// Free-form genre label, e.g. "Sci-Fi"
    pub genre: String,

    pub status: MovieStatus,

    /// Rental price in whole currency units
    pub price: u64,

    pub description: String,

    /// Single glyph shown in place of artwork
    pub poster: String,

    /// Running time in minutes
    pub duration_minutes: u32,

    pub director: String,

    /// Release year
    pub year: u16,

    /// Critic rating on a 0-10 scale
    pub rating: f64,
}

impl Movie {
    pub fn is_available(&self) -> bool {
        self.status == MovieStatus::Available
    }
}

// =============================================================================
// RENTAL
// =============================================================================

/// Rental lifecycle. `Returned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RentalStatus {
    Active,
    Returned,
}

/// One rental of one movie by one user.
///
/// Title and user name are copied from the movie and user when the rental is
/// created and are not kept in sync afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rental {
    pub id: RentalId,
    pub movie_id: MovieId,
    pub user_id: UserId,
    pub movie_title: String,
    pub user_name: String,

    /// Day the rental was created
    pub date: NaiveDate,

    pub status: RentalStatus,

    /// `date` plus the rental period
    pub due_date: NaiveDate,
}

impl Rental {
    pub fn is_active(&self) -> bool {
        self.status == RentalStatus::Active
    }
}

// =============================================================================
// PAYMENT
// =============================================================================

/// How a payment was settled.
///
/// Rentals created by the service always pay with `Upi`; other modes only
/// appear in seeded history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PaymentMode {
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "UPI")]
    Upi,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::CreditCard => "Credit Card",
            PaymentMode::Upi => "UPI",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known payment mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown payment mode: {0}")]
pub struct UnknownPaymentMode(pub String);

impl FromStr for PaymentMode {
    type Err = UnknownPaymentMode;

    /// Case-insensitive; accepts the display names ("UPI", "Credit Card").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        [PaymentMode::Upi, PaymentMode::CreditCard]
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownPaymentMode(trimmed.to_string()))
    }
}

/// Money received for a rental.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub user_name: String,

    /// Movie price at the moment of rental
    pub amount: u64,

    pub date: NaiveDate,
    pub mode: PaymentMode,
    pub movie_title: String,
}

// =============================================================================
// API REQUEST/RESPONSE STRUCTURES
// =============================================================================

// -----------------------------------------------------------------------------
// RENT REQUEST
// -----------------------------------------------------------------------------
/// Request body for renting a movie
///
/// # Example JSON
/// ```json
/// { "movie_id": 103, "user_id": 1 }
/// ```
///
/// `user_id` may be omitted; the configured default renter is used then.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RentMovieRequest {
    pub movie_id: MovieId,

    #[serde(default)]
    pub user_id: Option<UserId>,
}

// -----------------------------------------------------------------------------
// RENTAL RECEIPT
// -----------------------------------------------------------------------------
/// The two records a successful rent appends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub rental: Rental,
    pub payment: Payment,
}

// =============================================================================
// AGGREGATES
// =============================================================================
// Rows computed by the analytics module. All grouped rows keep the order in
// which each group first appears in the source collection.

/// Headline numbers for the catalog page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total: usize,
    pub available: usize,
    pub rented: usize,

    /// Mean rating rounded to one decimal place; 0.0 for an empty catalog
    pub average_rating: f64,
}

/// Titles and summed list price per genre
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreSlice {
    pub genre: String,
    pub count: usize,
    pub revenue: u64,
}

/// Payments received on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: u64,
    pub transactions: usize,
}

/// Number of movies in one status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: MovieStatus,
    pub count: usize,
}

/// Payments settled with one mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodBreakdown {
    pub method: PaymentMode,
    pub count: usize,
    pub amount: u64,
}

/// Everything the admin dashboard shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_revenue: u64,
    pub active_rentals: usize,
    pub total_customers: usize,
    pub total_movies: usize,
    pub genres: Vec<GenreSlice>,
    pub revenue_by_date: Vec<DailyRevenue>,
    pub status: Vec<StatusCount>,
    pub payment_methods: Vec<MethodBreakdown>,

    /// Newest first
    pub recent_rentals: Vec<Rental>,
}

/// Everything the payments page shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub total_revenue: u64,
    pub count: usize,

    /// 0.0 when there are no payments
    pub average_payment: f64,

    pub by_method: Vec<MethodBreakdown>,

    /// Newest first
    pub recent: Vec<Payment>,
}

// =============================================================================
// HEALTH CHECK RESPONSES
// =============================================================================

/// Simple health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Detailed readiness check response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

/// Individual readiness checks
#[derive(Debug, Serialize)]
pub struct ReadinessChecks {
    /// Movie statuses agree with the active rentals
    pub store: bool,
}

// =============================================================================
// ERROR RESPONSES
// =============================================================================

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type/code
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Create an error response with details
    pub fn with_details(
        error: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_mode_uses_display_names_on_the_wire() {
        let json = serde_json::to_string(&PaymentMode::CreditCard).unwrap();
        assert_eq!(json, "\"Credit Card\"");

        let mode: PaymentMode = serde_json::from_str("\"UPI\"").unwrap();
        assert_eq!(mode, PaymentMode::Upi);
    }

    #[test]
    fn payment_mode_parses_case_insensitively() {
        assert_eq!("upi".parse::<PaymentMode>(), Ok(PaymentMode::Upi));
        assert_eq!(" credit card ".parse::<PaymentMode>(), Ok(PaymentMode::CreditCard));
        assert_eq!(
            "cash".parse::<PaymentMode>(),
            Err(UnknownPaymentMode("cash".to_string()))
        );
    }

    #[test]
    fn rent_request_user_is_optional() {
        let req: RentMovieRequest = serde_json::from_str(r#"{"movie_id": 103}"#).unwrap();
        assert_eq!(req.movie_id, 103);
        assert_eq!(req.user_id, None);
    }

    #[test]
    fn rental_dates_serialize_as_calendar_days() {
        let rental = Rental {
            id: 1,
            movie_id: 2,
            user_id: 3,
            movie_title: "Titanic".to_string(),
            user_name: "Priya".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            status: RentalStatus::Active,
            due_date: NaiveDate::from_ymd_opt(2024, 1, 22).unwrap(),
        };
        let value = serde_json::to_value(&rental).unwrap();
        assert_eq!(value["date"], "2024-01-15");
        assert_eq!(value["due_date"], "2024-01-22");
        assert_eq!(value["status"], "Active");
    }
}
