//! Configuration management for the cart.
//!
//! Loads configuration from environment variables (and a `.env` file, when
//! present) with sensible defaults.

use crate::error::CartError;
use crate::types::{DEFAULT_TICKET_PRICE, Money};
use serde::Serialize;
use std::env;

/// Default tracing filter for the demo binary
pub const DEFAULT_LOG_FILTER: &str = "exhibit_cart=debug,exhibit_cart_runtime=debug";

/// Cart configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartConfig {
    /// Unit price used when an event has none (`CART_DEFAULT_TICKET_PRICE`, kroner)
    pub default_ticket_price: Money,
    /// Buffered actions per async action subscriber (`CART_ACTION_BROADCAST_CAPACITY`)
    pub action_broadcast_capacity: usize,
    /// Tracing filter directive (`CART_LOG_FILTER`)
    pub log_filter: String,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            default_ticket_price: DEFAULT_TICKET_PRICE,
            action_broadcast_capacity: exhibit_cart_runtime::DEFAULT_BROADCAST_CAPACITY,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl CartConfig {
    /// Load configuration from the process environment
    ///
    /// A `.env` file in the working directory is read first if it exists.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidConfig`] if a variable is set but unusable.
    pub fn from_env() -> Result<Self, CartError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidConfig`] if a variable is set but unusable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CartError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let default_ticket_price = match lookup("CART_DEFAULT_TICKET_PRICE") {
            Some(value) => value
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Money::from_kroner_f64)
                .ok_or(CartError::InvalidConfig {
                    key: "CART_DEFAULT_TICKET_PRICE",
                    value,
                })?,
            None => defaults.default_ticket_price,
        };

        let action_broadcast_capacity = match lookup("CART_ACTION_BROADCAST_CAPACITY") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|capacity| *capacity > 0)
                .ok_or(CartError::InvalidConfig {
                    key: "CART_ACTION_BROADCAST_CAPACITY",
                    value,
                })?,
            None => defaults.action_broadcast_capacity,
        };

        let log_filter = lookup("CART_LOG_FILTER")
            .filter(|filter| !filter.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        Ok(Self {
            default_ticket_price,
            action_broadcast_capacity,
            log_filter,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = CartConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CartConfig::default());
        assert_eq!(config.default_ticket_price, Money::from_kroner(45));
    }

    #[test]
    fn reads_overrides() {
        let config = CartConfig::from_lookup(lookup(&[
            ("CART_DEFAULT_TICKET_PRICE", "60.5"),
            ("CART_ACTION_BROADCAST_CAPACITY", "64"),
            ("CART_LOG_FILTER", "exhibit_cart=trace"),
        ]))
        .unwrap();

        assert_eq!(config.default_ticket_price, Money::from_ore(6_050));
        assert_eq!(config.action_broadcast_capacity, 64);
        assert_eq!(config.log_filter, "exhibit_cart=trace");
    }

    #[test]
    fn rejects_non_positive_price() {
        let result = CartConfig::from_lookup(lookup(&[("CART_DEFAULT_TICKET_PRICE", "-1")]));
        assert!(matches!(
            result,
            Err(CartError::InvalidConfig {
                key: "CART_DEFAULT_TICKET_PRICE",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_capacity() {
        let result = CartConfig::from_lookup(lookup(&[("CART_ACTION_BROADCAST_CAPACITY", "0")]));
        assert!(result.is_err());
    }
}
