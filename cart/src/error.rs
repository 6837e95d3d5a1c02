//! Error types for the cart crate.
//!
//! Cart mutations never fail; out-of-range input is clamped or ignored.
//! Errors only come from decoding external data and loading configuration.

use thiserror::Error;

/// Errors raised at the cart's boundaries
#[derive(Error, Debug)]
pub enum CartError {
    /// An events API payload could not be decoded
    #[error("Malformed event record: {0}")]
    MalformedEventRecord(#[from] serde_json::Error),

    /// A configuration variable held an unusable value
    #[error("Invalid value {value:?} for {key}")]
    InvalidConfig {
        /// Environment variable name
        key: &'static str,
        /// The rejected value
        value: String,
    },
}
