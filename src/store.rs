// =============================================================================
// STORE MODULE
// =============================================================================
// The catalog/rental store: owns users, movies, rentals and payments and
// provides the only two operations that write to them.
//
// LEARNING NOTES:
// - Mutators take `&mut self`; the borrow checker guarantees nobody reads a
//   half-applied rent or return
// - Every precondition is checked before the first write, so a failed call
//   leaves the store untouched
// - Failures are typed (StoreError) instead of silently ignored
// =============================================================================

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::{
    Movie, MovieId, MovieStatus, Payment, PaymentMode, Receipt, Rental, RentalId, RentalStatus,
    User, UserId,
};
use crate::seed::Seed;

/// Days between a rental's date and its due date
pub const RENTAL_PERIOD_DAYS: i64 = 7;

/// Mode recorded for every payment the store creates
pub const RENTAL_PAYMENT_MODE: PaymentMode = PaymentMode::Upi;

// =============================================================================
// ERRORS
// =============================================================================

/// Broad class of a store failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced user, movie or rental does not exist
    NotFound,
    /// The record exists but is in the wrong state for the operation
    InvalidState,
    /// The collections contradict each other
    Inconsistent,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Movie not found: {0}")]
    MovieNotFound(MovieId),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Rental not found: {0}")]
    RentalNotFound(RentalId),

    #[error("Movie {0} is already rented")]
    MovieNotAvailable(MovieId),

    #[error("Rental {0} has already been returned")]
    RentalAlreadyReturned(RentalId),

    #[error("Inconsistent store data: {0}")]
    Inconsistent(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::MovieNotFound(_)
            | StoreError::UserNotFound(_)
            | StoreError::RentalNotFound(_) => ErrorKind::NotFound,
            StoreError::MovieNotAvailable(_) | StoreError::RentalAlreadyReturned(_) => {
                ErrorKind::InvalidState
            }
            StoreError::Inconsistent(_) => ErrorKind::Inconsistent,
        }
    }

    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::MovieNotFound(_) => "MOVIE_NOT_FOUND",
            StoreError::UserNotFound(_) => "USER_NOT_FOUND",
            StoreError::RentalNotFound(_) => "RENTAL_NOT_FOUND",
            StoreError::MovieNotAvailable(_) => "MOVIE_NOT_AVAILABLE",
            StoreError::RentalAlreadyReturned(_) => "RENTAL_ALREADY_RETURNED",
            StoreError::Inconsistent(_) => "INCONSISTENT_STORE",
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// ID GENERATION
// =============================================================================
// Rental and payment ids are millisecond timestamps. Two ids requested in the
// same millisecond, or after the clock stepped backwards, would collide, so
// the generator never hands out a value at or below the last one.
#[derive(Debug, Default)]
struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    /// Start above every id already in use
    fn starting_after(last: u64) -> Self {
        Self { last }
    }

    fn next(&mut self, now_ms: u64) -> u64 {
        let id = now_ms.max(self.last.saturating_add(1));
        self.last = id;
        id
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Owned copy of the whole store at one version
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Bumped by every successful mutation
    pub version: u64,
    pub users: Vec<User>,
    pub movies: Vec<Movie>,
    pub rentals: Vec<Rental>,
    pub payments: Vec<Payment>,
}

// =============================================================================
// STORE
// =============================================================================

/// In-memory catalog and rental ledger.
///
/// Rentals and payments are append-only; a rental's status only ever moves
/// from `Active` to `Returned`. A movie is `Rented` exactly when an active
/// rental references it.
#[derive(Debug)]
pub struct RentalStore {
    users: Vec<User>,
    movies: Vec<Movie>,
    rentals: Vec<Rental>,
    payments: Vec<Payment>,
    ids: IdGenerator,
    version: u64,
}

impl RentalStore {
    /// Build a store from a seed, rejecting data that breaks the store's
    /// invariants (duplicate ids, dangling references, movie status that
    /// disagrees with the active rentals).
    pub fn new(seed: Seed) -> StoreResult<Self> {
        let last_id = seed
            .rentals
            .iter()
            .map(|r| r.id)
            .chain(seed.payments.iter().map(|p| p.id))
            .max()
            .unwrap_or(0);

        let store = Self {
            users: seed.users,
            movies: seed.movies,
            rentals: seed.rentals,
            payments: seed.payments,
            ids: IdGenerator::starting_after(last_id),
            version: 0,
        };
        store.check_invariants()?;
        Ok(store)
    }

    // -------------------------------------------------------------------------
    // READ OPERATIONS
    // -------------------------------------------------------------------------

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: self.version,
            users: self.users.clone(),
            movies: self.movies.clone(),
            rentals: self.rentals.clone(),
            payments: self.payments.clone(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn rentals(&self) -> &[Rental] {
        &self.rentals
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.iter().find(|m| m.id == id)
    }

    pub fn rental(&self, id: RentalId) -> Option<&Rental> {
        self.rentals.iter().find(|r| r.id == id)
    }

    // -------------------------------------------------------------------------
    // WRITE OPERATIONS
    // -------------------------------------------------------------------------

    /// Rent a movie to a user, dated now. See [`RentalStore::rent_movie_at`].
    pub fn rent_movie(&mut self, movie_id: MovieId, user_id: UserId) -> StoreResult<Receipt> {
        self.rent_movie_at(movie_id, user_id, Utc::now())
    }

    /// Rent a movie to a user as of `now`.
    ///
    /// Marks the movie `Rented` and appends an `Active` rental due
    /// [`RENTAL_PERIOD_DAYS`] later plus a UPI payment for the movie's price.
    ///
    /// # Errors
    /// - `MovieNotFound` / `UserNotFound` when either id is unknown
    /// - `MovieNotAvailable` when the movie is already rented
    ///
    /// Nothing is written when an error is returned.
    pub fn rent_movie_at(
        &mut self,
        movie_id: MovieId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> StoreResult<Receipt> {
        let movie = self
            .movie(movie_id)
            .ok_or(StoreError::MovieNotFound(movie_id))?;
        if !movie.is_available() {
            return Err(StoreError::MovieNotAvailable(movie_id));
        }
        let movie_title = movie.title.clone();
        let price = movie.price;

        let user_name = self
            .user(user_id)
            .map(|u| u.name.clone())
            .ok_or(StoreError::UserNotFound(user_id))?;

        let date = now.date_naive();
        let now_ms = u64::try_from(now.timestamp_millis()).unwrap_or(0);

        let rental = Rental {
            id: self.ids.next(now_ms),
            movie_id,
            user_id,
            movie_title: movie_title.clone(),
            user_name: user_name.clone(),
            date,
            status: RentalStatus::Active,
            due_date: date + Duration::days(RENTAL_PERIOD_DAYS),
        };
        let payment = Payment {
            id: self.ids.next(now_ms),
            user_id,
            user_name,
            amount: price,
            date,
            mode: RENTAL_PAYMENT_MODE,
            movie_title,
        };

        // All checks passed; apply the three writes together
        if let Some(movie) = self.movies.iter_mut().find(|m| m.id == movie_id) {
            movie.status = MovieStatus::Rented;
        }
        self.rentals.push(rental.clone());
        self.payments.push(payment.clone());
        self.version += 1;

        Ok(Receipt { rental, payment })
    }

    /// Return a rented movie.
    ///
    /// Marks the rental `Returned` and its movie `Available`. Payments are
    /// never touched.
    ///
    /// # Errors
    /// - `RentalNotFound` when the id is unknown
    /// - `RentalAlreadyReturned` when the rental was returned before; the
    ///   movie may have been rented again since, so its status is left alone
    pub fn return_movie(&mut self, rental_id: RentalId) -> StoreResult<Rental> {
        let rental = self
            .rentals
            .iter_mut()
            .find(|r| r.id == rental_id)
            .ok_or(StoreError::RentalNotFound(rental_id))?;
        if !rental.is_active() {
            return Err(StoreError::RentalAlreadyReturned(rental_id));
        }

        rental.status = RentalStatus::Returned;
        let returned = rental.clone();

        if let Some(movie) = self.movies.iter_mut().find(|m| m.id == returned.movie_id) {
            movie.status = MovieStatus::Available;
        }
        self.version += 1;

        Ok(returned)
    }

    // -------------------------------------------------------------------------
    // CONSISTENCY
    // -------------------------------------------------------------------------

    /// Verify the relationships between the four collections.
    pub fn check_invariants(&self) -> StoreResult<()> {
        ensure_unique("user", self.users.iter().map(|u| u.id))?;
        ensure_unique("movie", self.movies.iter().map(|m| m.id))?;
        ensure_unique("rental", self.rentals.iter().map(|r| r.id))?;
        ensure_unique("payment", self.payments.iter().map(|p| p.id))?;

        for rental in &self.rentals {
            if self.user(rental.user_id).is_none() {
                return Err(StoreError::Inconsistent(format!(
                    "rental {} references unknown user {}",
                    rental.id, rental.user_id
                )));
            }
            if self.movie(rental.movie_id).is_none() {
                return Err(StoreError::Inconsistent(format!(
                    "rental {} references unknown movie {}",
                    rental.id, rental.movie_id
                )));
            }
        }

        for payment in &self.payments {
            if self.user(payment.user_id).is_none() {
                return Err(StoreError::Inconsistent(format!(
                    "payment {} references unknown user {}",
                    payment.id, payment.user_id
                )));
            }
        }

        for movie in &self.movies {
            let active = self
                .rentals
                .iter()
                .filter(|r| r.movie_id == movie.id && r.is_active())
                .count();
            let consistent = match movie.status {
                MovieStatus::Rented => active == 1,
                MovieStatus::Available => active == 0,
            };
            if !consistent {
                return Err(StoreError::Inconsistent(format!(
                    "movie {} is {:?} with {} active rentals",
                    movie.id, movie.status, active
                )));
            }
        }

        Ok(())
    }
}

fn ensure_unique(entity: &str, ids: impl Iterator<Item = u64>) -> StoreResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(StoreError::Inconsistent(format!("duplicate {entity} id {id}")));
        }
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn seeded() -> RentalStore {
        RentalStore::new(Seed::builtin().unwrap()).expect("built-in seed is consistent")
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn status_of(store: &RentalStore, id: MovieId) -> MovieStatus {
        store.movie(id).unwrap().status
    }

    #[test]
    fn builtin_seed_satisfies_invariants() {
        let store = seeded();
        assert_eq!(store.version(), 0);
        assert!(store.check_invariants().is_ok());
    }

    #[test]
    fn rent_appends_rental_and_payment() {
        let mut store = seeded();
        let before = store.snapshot();

        let receipt = store.rent_movie_at(103, 1, at(2024, 3, 10)).unwrap();

        assert_eq!(status_of(&store, 103), MovieStatus::Rented);
        assert_eq!(store.rentals().len(), before.rentals.len() + 1);
        assert_eq!(store.payments().len(), before.payments.len() + 1);

        let rental = &receipt.rental;
        assert_eq!(rental.movie_id, 103);
        assert_eq!(rental.user_id, 1);
        assert_eq!(rental.movie_title, "The Matrix");
        assert_eq!(rental.user_name, "Krishna");
        assert_eq!(rental.status, RentalStatus::Active);
        assert_eq!(rental.date, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(rental.due_date, NaiveDate::from_ymd_opt(2024, 3, 17).unwrap());

        let payment = &receipt.payment;
        assert_eq!(payment.amount, 180);
        assert_eq!(payment.mode, PaymentMode::Upi);
        assert_eq!(payment.movie_title, "The Matrix");
        assert_eq!(payment.user_name, "Krishna");
        assert_eq!(payment.date, rental.date);

        assert_eq!(store.rentals().last(), Some(rental));
        assert_eq!(store.payments().last(), Some(payment));
    }

    #[test]
    fn rent_leaves_other_records_untouched() {
        let mut store = seeded();
        let before = store.snapshot();

        store.rent_movie_at(104, 4, at(2024, 3, 10)).unwrap();

        for movie in before.movies.iter().filter(|m| m.id != 104) {
            assert_eq!(store.movie(movie.id), Some(movie));
        }
        assert_eq!(&store.rentals()[..before.rentals.len()], &before.rentals[..]);
        assert_eq!(&store.payments()[..before.payments.len()], &before.payments[..]);
    }

    #[test]
    fn rent_unknown_movie_changes_nothing() {
        let mut store = seeded();
        let before = store.snapshot();

        let err = store.rent_movie_at(999, 1, at(2024, 3, 10)).unwrap_err();

        assert_eq!(err, StoreError::MovieNotFound(999));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn rent_rented_movie_changes_nothing() {
        let mut store = seeded();
        let before = store.snapshot();

        let err = store.rent_movie_at(102, 4, at(2024, 3, 10)).unwrap_err();

        assert_eq!(err, StoreError::MovieNotAvailable(102));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn rent_for_unknown_user_changes_nothing() {
        let mut store = seeded();
        let before = store.snapshot();

        let err = store.rent_movie_at(103, 42, at(2024, 3, 10)).unwrap_err();

        assert_eq!(err, StoreError::UserNotFound(42));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn missing_movie_is_reported_before_missing_user() {
        let mut store = seeded();
        let err = store.rent_movie_at(999, 42, at(2024, 3, 10)).unwrap_err();
        assert_eq!(err, StoreError::MovieNotFound(999));
    }

    #[test]
    fn return_marks_rental_returned_and_movie_available() {
        let mut store = seeded();
        let payments_before = store.payments().to_vec();

        let rental = store.return_movie(1001).unwrap();

        assert_eq!(rental.status, RentalStatus::Returned);
        assert_eq!(store.rental(1001).unwrap().status, RentalStatus::Returned);
        assert_eq!(status_of(&store, 102), MovieStatus::Available);
        assert_eq!(store.payments(), &payments_before[..]);
        assert_eq!(store.rental(1002).unwrap().status, RentalStatus::Active);
    }

    #[test]
    fn return_unknown_rental_changes_nothing() {
        let mut store = seeded();
        let before = store.snapshot();

        let err = store.return_movie(5).unwrap_err();

        assert_eq!(err, StoreError::RentalNotFound(5));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn stale_return_cannot_release_a_rerented_movie() {
        let mut store = seeded();
        store.return_movie(1001).unwrap();
        let newer = store.rent_movie_at(102, 4, at(2024, 3, 10)).unwrap();
        let before = store.snapshot();

        let err = store.return_movie(1001).unwrap_err();

        assert_eq!(err, StoreError::RentalAlreadyReturned(1001));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(store.snapshot(), before);
        assert_eq!(status_of(&store, 102), MovieStatus::Rented);
        assert!(store.rental(newer.rental.id).unwrap().is_active());
    }

    #[test]
    fn rent_then_return_round_trip() {
        let mut store = seeded();

        let receipt = store.rent_movie(103, 1).unwrap();
        assert_eq!(status_of(&store, 103), MovieStatus::Rented);
        assert_eq!(receipt.payment.amount, 180);

        let returned = store.return_movie(receipt.rental.id).unwrap();
        assert_eq!(returned.status, RentalStatus::Returned);
        assert_eq!(status_of(&store, 103), MovieStatus::Available);

        let payment = store
            .payments()
            .iter()
            .find(|p| p.id == receipt.payment.id)
            .unwrap();
        assert_eq!(payment, &receipt.payment);
        assert!(store.check_invariants().is_ok());
    }

    #[test]
    fn ids_strictly_increase_within_one_millisecond() {
        let mut store = seeded();
        let now = at(2024, 3, 10);

        let first = store.rent_movie_at(101, 1, now).unwrap();
        let second = store.rent_movie_at(103, 3, now).unwrap();

        assert!(first.payment.id > first.rental.id);
        assert!(second.rental.id > first.payment.id);
        assert!(second.payment.id > second.rental.id);
    }

    #[test]
    fn ids_stay_above_seeded_ids_when_clock_is_behind() {
        let mut store = seeded();
        let epoch = Utc.timestamp_millis_opt(0).unwrap();

        let receipt = store.rent_movie_at(101, 1, epoch).unwrap();

        assert_eq!(receipt.rental.id, 2003);
        assert_eq!(receipt.payment.id, 2004);
    }

    #[test]
    fn version_only_moves_on_success() {
        let mut store = seeded();

        store.rent_movie_at(999, 1, at(2024, 3, 10)).unwrap_err();
        assert_eq!(store.version(), 0);

        let receipt = store.rent_movie_at(101, 1, at(2024, 3, 10)).unwrap();
        assert_eq!(store.version(), 1);

        store.return_movie(receipt.rental.id).unwrap();
        assert_eq!(store.version(), 2);
        assert_eq!(store.snapshot().version, 2);
    }

    #[test]
    fn invariants_hold_across_mixed_operations() {
        let mut store = seeded();
        let now = at(2024, 3, 10);
        let movie_ids: Vec<MovieId> = store.movies().iter().map(|m| m.id).collect();

        for (i, movie_id) in movie_ids.iter().enumerate() {
            let user_id = (i as u64 % 4) + 1;
            let _ = store.rent_movie_at(*movie_id, user_id, now);
        }
        let rental_ids: Vec<RentalId> = store.rentals().iter().map(|r| r.id).collect();
        for rental_id in rental_ids.iter().step_by(2) {
            let _ = store.return_movie(*rental_id);
        }
        for movie_id in &movie_ids {
            let _ = store.rent_movie_at(*movie_id, 2, now);
        }

        assert!(store.check_invariants().is_ok());
        for movie in store.movies() {
            let active = store
                .rentals()
                .iter()
                .any(|r| r.movie_id == movie.id && r.is_active());
            assert_eq!(movie.status == MovieStatus::Rented, active, "movie {}", movie.id);
        }
    }

    #[test]
    fn seed_with_rented_movie_but_no_rental_is_rejected() {
        let mut seed = Seed::builtin().unwrap();
        seed.rentals.retain(|r| r.id != 1001);

        let err = RentalStore::new(seed).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Inconsistent);
        assert!(err.to_string().contains("movie 102"));
    }

    #[test]
    fn seed_with_duplicate_ids_is_rejected() {
        let mut seed = Seed::builtin().unwrap();
        let duplicate = seed.users[0].clone();
        seed.users.push(duplicate);

        let err = RentalStore::new(seed).unwrap_err();

        assert_eq!(err, StoreError::Inconsistent("duplicate user id 1".to_string()));
    }

    #[test]
    fn seed_with_dangling_rental_is_rejected() {
        let mut seed = Seed::builtin().unwrap();
        seed.rentals[0].user_id = 77;

        let err = RentalStore::new(seed).unwrap_err();

        assert!(err.to_string().contains("unknown user 77"));
    }
}
