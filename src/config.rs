// =============================================================================
// CONFIGURATION MODULE
// =============================================================================
// This module handles loading configuration from environment variables.
//
// LEARNING NOTES:
// - Environment variables are the standard way to configure containers
// - We parse them into a strongly-typed Config struct
// - This makes configuration errors obvious at startup, not runtime
// =============================================================================

use anyhow::{Context, Result};
use std::env;

use crate::models::UserId;

/// Port used when PORT is unset
pub const DEFAULT_PORT: u16 = 8003;

/// Renter used when DEFAULT_USER_ID is unset
pub const DEFAULT_RENTER: UserId = 1;

// -----------------------------------------------------------------------------
// CONFIG STRUCT
// -----------------------------------------------------------------------------
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 8003)
    pub port: u16,

    /// User charged when a rent request does not name one (default: 1)
    pub default_user_id: UserId,
}

impl Config {
    /// Creates a Config by reading environment variables.
    ///
    /// Every variable is optional; a value that is set but does not parse is
    /// an error.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: match env::var("PORT") {
                Ok(raw) => raw.parse().context("Failed to parse PORT as a number")?,
                Err(_) => DEFAULT_PORT,
            },

            default_user_id: match env::var("DEFAULT_USER_ID") {
                Ok(raw) => raw
                    .parse()
                    .context("Failed to parse DEFAULT_USER_ID as a user id")?,
                Err(_) => DEFAULT_RENTER,
            },
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
// These tests mutate process-wide environment variables, so they run serially.
#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear() {
        env::remove_var("PORT");
        env::remove_var("DEFAULT_USER_ID");
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        env::set_var("PORT", "9000");
        env::set_var("DEFAULT_USER_ID", "3");

        let config = Config::from_env().expect("Failed to load config");

        assert_eq!(config.port, 9000);
        assert_eq!(config.default_user_id, 3);

        clear();
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear();

        let config = Config::from_env().expect("Failed to load config");

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.default_user_id, DEFAULT_RENTER);
    }

    #[test]
    #[serial]
    fn test_config_rejects_bad_port() {
        clear();
        env::set_var("PORT", "eighty");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("PORT"));

        clear();
    }
}
