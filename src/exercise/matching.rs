//! Structural containment matching.
//!
//! A pattern matches a recorded statement when every key of the pattern is
//! present in the statement with an equal scalar, or, for nested mappings and
//! arrays, with a value that recursively contains the nested pattern. Keys the
//! pattern does not mention are never compared.
//!
//! ```
//! use serde_json::json;
//! use learnstage::exercise::contains;
//!
//! let statement = json!({"call": "walk", "args": [50], "actor": "t1"});
//! assert!(contains(&statement, &json!({"call": "walk"})));
//! assert!(contains(&statement, &json!({"args": [50]})));
//! assert!(!contains(&statement, &json!({"call": "walk", "speed": 2})));
//! ```

use serde_json::Value;

/// Whether `subject` structurally contains `pattern`.
///
/// A missing key, or a scalar where the pattern expects a mapping, is simply a
/// non-match.
pub fn contains(subject: &Value, pattern: &Value) -> bool {
    match pattern {
        Value::Object(map) => {
            is_container(subject)
                && map
                    .iter()
                    .all(|(key, expected)| entry_matches(subject, key, expected))
        }
        Value::Array(items) => {
            is_container(subject)
                && items
                    .iter()
                    .enumerate()
                    .all(|(index, expected)| entry_matches(subject, &index.to_string(), expected))
        }
        Value::Null => is_container(subject),
        _ => scalar_eq(subject, pattern),
    }
}

fn entry_matches(subject: &Value, key: &str, expected: &Value) -> bool {
    match lookup(subject, key) {
        Some(actual) => contains(actual, expected),
        None => false,
    }
}

/// Mappings, arrays and null all behave as containers.
fn is_container(v: &Value) -> bool {
    matches!(v, Value::Object(_) | Value::Array(_) | Value::Null)
}

fn lookup<'a>(subject: &'a Value, key: &str) -> Option<&'a Value> {
    match subject {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Strict scalar equality. Numbers compare by value, so `1` equals `1.0`.
fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        _ => false,
    }
}
