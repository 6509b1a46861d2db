// =============================================================================
// SEED MODULE
// =============================================================================
// The fixed dataset every process starts from. It is compiled into the binary
// so a fresh start always restores the same catalog, rentals and payments.
// =============================================================================

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::{Movie, Payment, Rental, User};

/// Raw JSON of the built-in dataset
const BUILTIN_SEED: &str = include_str!("../data/seed.json");

/// The four collections a store is built from
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seed {
    pub users: Vec<User>,
    pub movies: Vec<Movie>,
    #[serde(default)]
    pub rentals: Vec<Rental>,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

impl Seed {
    /// Parse the dataset shipped with the service
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_SEED).context("Failed to parse built-in seed data")
    }

    /// Parse a dataset from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Seed data is not valid JSON for the catalog schema")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MovieStatus, PaymentMode, Role};

    #[test]
    fn builtin_seed_parses() {
        let seed = Seed::builtin().expect("built-in seed must parse");

        assert_eq!(seed.users.len(), 4);
        assert_eq!(seed.movies.len(), 18);
        assert_eq!(seed.rentals.len(), 2);
        assert_eq!(seed.payments.len(), 2);
    }

    #[test]
    fn builtin_seed_contains_known_records() {
        let seed = Seed::builtin().unwrap();

        let krishna = seed.users.iter().find(|u| u.id == 1).unwrap();
        assert_eq!(krishna.name, "Krishna");
        assert_eq!(krishna.role, Role::Customer);

        let matrix = seed.movies.iter().find(|m| m.id == 103).unwrap();
        assert_eq!(matrix.title, "The Matrix");
        assert_eq!(matrix.price, 180);
        assert_eq!(matrix.status, MovieStatus::Available);

        let card = seed.payments.iter().find(|p| p.id == 2002).unwrap();
        assert_eq!(card.mode, PaymentMode::CreditCard);
    }

    #[test]
    fn poster_glyphs_keep_joiners_and_variation_selectors() {
        let seed = Seed::builtin().unwrap();
        let poster = |id| {
            seed.movies
                .iter()
                .find(|m| m.id == id)
                .map(|m| m.poster.clone())
                .unwrap()
        };

        assert_eq!(poster(108), "\u{1F3C3}\u{200D}\u{2642}\u{FE0F}");
        assert_eq!(poster(113), "\u{2744}\u{FE0F}");
        assert_eq!(poster(115), "\u{1F577}\u{FE0F}");
        assert_eq!(poster(116), "\u{1F3DC}\u{FE0F}");
    }

    #[test]
    fn missing_history_defaults_to_empty() {
        let seed = Seed::from_json(r#"{ "users": [], "movies": [] }"#).unwrap();
        assert!(seed.rentals.is_empty());
        assert!(seed.payments.is_empty());
    }

    #[test]
    fn malformed_seed_is_rejected() {
        let err = Seed::from_json(r#"{ "users": 1 }"#).unwrap_err();
        assert!(err.to_string().contains("Seed data"));
    }
}
