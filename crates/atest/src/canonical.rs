//! Canonical JSON for comparison.
//!
//! Two JSON texts are equivalent when they canonicalize to the same bytes.
//! Canonicalization parses into a [`serde_json::Value`], sorts object keys
//! recursively, rewrites integral floats as integers, and serializes compactly.
//! The canonical form is only ever compared or shown in a diagnostic.

use crate::error::HarnessResult;
use serde_json::{Map, Number, Value};

/// Largest integer magnitude that survives a round trip through `f64`.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Parses `text` and returns its canonical serialization.
///
/// # Errors
///
/// Returns [`HarnessError::MalformedJson`](crate::HarnessError::MalformedJson)
/// if `text` is not well-formed JSON.
///
/// # Example
///
/// ```
/// use atest::canonical::canonicalize;
///
/// let a = canonicalize(r#"{"b": 2, "a": 1}"#).unwrap();
/// let b = canonicalize(r#"{"a":1,"b":2}"#).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn canonicalize(text: &str) -> HarnessResult<Vec<u8>> {
    canonical_string(text).map(String::into_bytes)
}

/// Same as [`canonicalize`], returned as a `String`.
///
/// This is the form diagnostics show for JSON mismatches.
///
/// # Errors
///
/// Returns [`HarnessError::MalformedJson`](crate::HarnessError::MalformedJson)
/// if `text` is not well-formed JSON.
pub fn canonical_string(text: &str) -> HarnessResult<String> {
    let value: Value = serde_json::from_str(text)?;
    Ok(value_string(value))
}

/// Canonical text of an already decoded value.
pub fn value_string(value: Value) -> String {
    normalize(value).to_string()
}

/// Rewrites a value tree into its canonical shape.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, normalize(value)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Number(number) => Value::Number(normalize_number(number)),
        other => other,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn normalize_number(number: Number) -> Number {
    match number.as_f64() {
        Some(f) if number.is_f64() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
            Number::from(f as i64)
        }
        _ => number,
    }
}
