//! # Key Normalization
//!
//! Rewrites every key of a decoded tree into the canonical snake_case form so
//! that `HttpPort` (JSON), `http_port` (TOML) and `HTTP_PORT` (env) address the
//! same field.

use crate::{Tree, Value};

/// Canonical form of a single key.
///
/// A `_` is inserted before an uppercase letter when the previous character is
/// lowercase, or when the next character is lowercase (so `HTTPPort` becomes
/// `http_port`, not `h_t_t_p_port`). Everything is lowercased afterwards.
///
/// ```
/// use confluent::canonical_key;
///
/// assert_eq!(canonical_key("HttpPort"), "http_port");
/// assert_eq!(canonical_key("HTTPPort"), "http_port");
/// assert_eq!(canonical_key("http_port"), "http_port");
/// assert_eq!(canonical_key("MONGO"), "mongo");
/// ```
pub fn canonical_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev_lower = chars[i - 1].is_lowercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev_lower || next_lower {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// Normalize the keys of an arbitrary decoded value.
///
/// Anything that is not a mapping normalizes to an empty tree.
pub fn normalize_keys(value: &Value) -> Tree {
    match value {
        Value::Object(map) => normalize_tree(map),
        _ => Tree::new()
    }
}

/// Normalize every key of `tree`, descending into nested mappings and into
/// sequences. The input is left untouched.
pub fn normalize_tree(tree: &Tree) -> Tree {
    tree.iter()
        .map(|(key, value)| (canonical_key(key), normalize_value(value)))
        .collect()
}

fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(normalize_tree(map)),
        Value::Array(items) => Value::Array(items.iter().map(normalize_value).collect()),
        other => other.clone()
    }
}
