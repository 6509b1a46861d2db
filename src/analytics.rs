// =============================================================================
// ANALYTICS MODULE
// =============================================================================
// Read-only aggregates over store data: catalog search, dashboard charts and
// payment summaries. Nothing here mutates state; every function takes slices
// so it works on a live store or on a snapshot alike.
//
// Grouped results keep the order in which each group first appears, which is
// the order charts render them in.
// =============================================================================

use std::cmp::Ordering;

use serde::Deserialize;

use crate::models::{
    CatalogStats, DailyRevenue, DashboardStats, GenreSlice, MethodBreakdown, Movie, MovieStatus,
    Payment, PaymentMode, PaymentSummary, Rental, RentalStatus, Role, StatusCount,
};
use crate::store::Snapshot;

/// Genre filter value that matches every movie
pub const ALL_GENRES: &str = "All";

/// How many entries the "recent activity" lists hold
pub const RECENT_LIMIT: usize = 5;

// =============================================================================
// CATALOG
// =============================================================================

/// Catalog ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovieSort {
    /// Alphabetical
    #[default]
    Title,
    /// Highest rated first
    Rating,
    /// Newest first
    Year,
    /// Cheapest first
    Price,
}

/// Catalog search criteria
#[derive(Debug, Clone, Default)]
pub struct MovieQuery {
    /// Case-insensitive substring of title, director or description
    pub search: Option<String>,
    /// Exact genre, or `None`/"All" for every genre
    pub genre: Option<String>,
    pub sort: MovieSort,
    /// Hide rented titles
    pub available_only: bool,
}

/// Filter and sort the catalog
pub fn search_movies(movies: &[Movie], query: &MovieQuery) -> Vec<Movie> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);
    let genre = query
        .genre
        .as_deref()
        .filter(|g| !g.is_empty() && *g != ALL_GENRES);

    let mut found: Vec<Movie> = movies
        .iter()
        .filter(|m| !query.available_only || m.is_available())
        .filter(|m| genre.map_or(true, |g| m.genre == g))
        .filter(|m| {
            needle.as_deref().map_or(true, |n| {
                m.title.to_lowercase().contains(n)
                    || m.director.to_lowercase().contains(n)
                    || m.description.to_lowercase().contains(n)
            })
        })
        .cloned()
        .collect();

    found.sort_by(|a, b| compare_movies(a, b, query.sort));
    found
}

fn compare_movies(a: &Movie, b: &Movie, sort: MovieSort) -> Ordering {
    match sort {
        MovieSort::Rating => b.rating.total_cmp(&a.rating),
        MovieSort::Year => b.year.cmp(&a.year),
        MovieSort::Price => a.price.cmp(&b.price),
        MovieSort::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
    }
}

/// Genre filter options: "All" followed by each distinct genre
pub fn genres(movies: &[Movie]) -> Vec<String> {
    let mut list = vec![ALL_GENRES.to_string()];
    for movie in movies {
        if !list.iter().any(|g| *g == movie.genre) {
            list.push(movie.genre.clone());
        }
    }
    list
}

pub fn catalog_stats(movies: &[Movie]) -> CatalogStats {
    let total = movies.len();
    let available = movies.iter().filter(|m| m.is_available()).count();
    let average_rating = if total == 0 {
        0.0
    } else {
        let sum: f64 = movies.iter().map(|m| m.rating).sum();
        round_one_decimal(sum / total as f64)
    };

    CatalogStats {
        total,
        available,
        rented: total - available,
        average_rating,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// =============================================================================
// CHART DATA
// =============================================================================

/// Title count and summed price per genre
pub fn genre_distribution(movies: &[Movie]) -> Vec<GenreSlice> {
    let mut slices: Vec<GenreSlice> = Vec::new();
    for movie in movies {
        match slices.iter_mut().find(|s| s.genre == movie.genre) {
            Some(slice) => {
                slice.count += 1;
                slice.revenue += movie.price;
            }
            None => slices.push(GenreSlice {
                genre: movie.genre.clone(),
                count: 1,
                revenue: movie.price,
            }),
        }
    }
    slices
}

/// Payment totals per calendar day
pub fn revenue_by_date(payments: &[Payment]) -> Vec<DailyRevenue> {
    let mut days: Vec<DailyRevenue> = Vec::new();
    for payment in payments {
        match days.iter_mut().find(|d| d.date == payment.date) {
            Some(day) => {
                day.revenue += payment.amount;
                day.transactions += 1;
            }
            None => days.push(DailyRevenue {
                date: payment.date,
                revenue: payment.amount,
                transactions: 1,
            }),
        }
    }
    days
}

/// Always two rows: Available then Rented
pub fn status_distribution(movies: &[Movie]) -> Vec<StatusCount> {
    [MovieStatus::Available, MovieStatus::Rented]
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: movies.iter().filter(|m| m.status == status).count(),
        })
        .collect()
}

/// Count and amount per payment mode
pub fn payment_methods(payments: &[Payment]) -> Vec<MethodBreakdown> {
    let mut methods: Vec<MethodBreakdown> = Vec::new();
    for payment in payments {
        match methods.iter_mut().find(|m| m.method == payment.mode) {
            Some(method) => {
                method.count += 1;
                method.amount += payment.amount;
            }
            None => methods.push(MethodBreakdown {
                method: payment.mode,
                count: 1,
                amount: payment.amount,
            }),
        }
    }
    methods
}

pub fn total_revenue(payments: &[Payment]) -> u64 {
    payments.iter().map(|p| p.amount).sum()
}

/// The last `limit` items, newest first
pub fn recent<T: Clone>(items: &[T], limit: usize) -> Vec<T> {
    items.iter().rev().take(limit).cloned().collect()
}

pub fn dashboard(snapshot: &Snapshot) -> DashboardStats {
    DashboardStats {
        total_revenue: total_revenue(&snapshot.payments),
        active_rentals: snapshot.rentals.iter().filter(|r| r.is_active()).count(),
        total_customers: snapshot
            .users
            .iter()
            .filter(|u| u.role == Role::Customer)
            .count(),
        total_movies: snapshot.movies.len(),
        genres: genre_distribution(&snapshot.movies),
        revenue_by_date: revenue_by_date(&snapshot.payments),
        status: status_distribution(&snapshot.movies),
        payment_methods: payment_methods(&snapshot.payments),
        recent_rentals: recent(&snapshot.rentals, RECENT_LIMIT),
    }
}

// =============================================================================
// RENTAL AND PAYMENT LISTS
// =============================================================================

/// Which rentals to list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalFilter {
    #[default]
    All,
    Active,
    Returned,
}

pub fn filter_rentals(rentals: &[Rental], filter: RentalFilter) -> Vec<Rental> {
    rentals
        .iter()
        .filter(|r| match filter {
            RentalFilter::All => true,
            RentalFilter::Active => r.status == RentalStatus::Active,
            RentalFilter::Returned => r.status == RentalStatus::Returned,
        })
        .cloned()
        .collect()
}

/// Payment list ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentSort {
    /// Newest day first
    #[default]
    Date,
    /// Largest first
    Amount,
    /// Alphabetical by mode name
    Method,
}

/// Optionally restrict to one mode, then sort. Ties keep ledger order.
pub fn filter_payments(
    payments: &[Payment],
    method: Option<PaymentMode>,
    sort: PaymentSort,
) -> Vec<Payment> {
    let mut list: Vec<Payment> = payments
        .iter()
        .filter(|p| method.map_or(true, |m| p.mode == m))
        .cloned()
        .collect();

    match sort {
        PaymentSort::Date => list.sort_by(|a, b| b.date.cmp(&a.date)),
        PaymentSort::Amount => list.sort_by(|a, b| b.amount.cmp(&a.amount)),
        PaymentSort::Method => list.sort_by(|a, b| a.mode.as_str().cmp(b.mode.as_str())),
    }
    list
}

pub fn payment_summary(payments: &[Payment]) -> PaymentSummary {
    let total = total_revenue(payments);
    let count = payments.len();
    let average_payment = if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    };

    PaymentSummary {
        total_revenue: total,
        count,
        average_payment,
        by_method: payment_methods(payments),
        recent: recent(payments, RECENT_LIMIT),
    }
}
