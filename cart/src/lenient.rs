//! Lenient numeric decoding for data coming from the events API and the UI.
//!
//! Ticket counts and prices arrive as JSON numbers, numeric strings, `null`,
//! or not at all. Anything that is not a usable number becomes `0` (counts)
//! or `None` (prices) before it reaches cart arithmetic, so no `NaN` or
//! negative count is ever stored.

use crate::types::Money;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Index just past the run of ASCII digits starting at `from`
fn skip_digits(bytes: &[u8], from: usize) -> usize {
    let mut end = from;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    end
}

/// Parse the numeric prefix of a string (`"12 seats"` → `12.0`, `"1e3"` → `1000.0`)
///
/// An exponent counts only when the mantissa has digits and the `e` is
/// followed by at least one digit; otherwise parsing stops before the `e`.
fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));

    let digits_start = end;
    end = skip_digits(bytes, end);
    if bytes.get(end) == Some(&b'.') {
        end = skip_digits(bytes, end + 1);
    }
    if !text[digits_start..end].bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exponent_end = skip_digits(bytes, end + 1 + sign);
        if exponent_end > end + 1 + sign {
            end = exponent_end;
        }
    }

    text[..end].parse().ok()
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => leading_number(text),
        _ => None,
    }
}

/// Coerce a JSON value to a non-negative ticket count
///
/// Fractions truncate toward zero; negative, non-finite and non-numeric
/// values become `0`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to u32 range first
pub fn coerce_count(value: &Value) -> u32 {
    match as_number(value) {
        Some(number) if number.is_finite() && number > 0.0 => {
            number.trunc().min(f64::from(u32::MAX)) as u32
        },
        _ => 0,
    }
}

/// Coerce a JSON value to a ticket price in kroner
///
/// Returns `None` for anything that is not a positive, finite amount.
#[must_use]
pub fn coerce_price(value: &Value) -> Option<Money> {
    as_number(value).and_then(Money::from_kroner_f64)
}

/// `deserialize_with` adapter for required counts
///
/// # Errors
///
/// Only fails if the input is not valid JSON-like data at all.
pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_count(&value))
}

/// `deserialize_with` adapter for counts where absence matters
///
/// `null` maps to `None`; any other value is coerced with [`coerce_count`].
///
/// # Errors
///
/// Only fails if the input is not valid JSON-like data at all.
pub fn optional_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(coerce_count(&other)),
    })
}

/// `deserialize_with` adapter for optional prices
///
/// # Errors
///
/// Only fails if the input is not valid JSON-like data at all.
pub fn optional_price<'de, D>(deserializer: D) -> Result<Option<Money>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_price(&value))
}
