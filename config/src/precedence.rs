//! # Configuration Precedence
//!
//! Deep-merges decoded trees. Sources are merged in ascending priority order,
//! so a source with a higher priority is merged later and overrides the
//! values of every source before it.
//!
//! # Merge Rules
//! 1. Keys present in only one tree are kept as they are
//! 2. Keys present in both where both values are mappings merge recursively
//! 3. Otherwise the overlay's value replaces the base value outright
//!    (scalars, sequences and mismatched types; sequences are never merged
//!    element by element)

use crate::{Tree, Value};

/// Merge `overlay` on top of `base`.
///
/// `base` is consumed and returned; `overlay` is only read, so the same cached
/// tree can be merged into any number of results.
///
/// ```
/// use confluent::{Value, merge};
/// use serde_json::json;
///
/// let base = json!({ "server": { "host": "localhost", "port": 8080 } });
/// let overlay = json!({ "server": { "port": 9000 } });
///
/// let (Value::Object(base), Value::Object(overlay)) = (base, overlay) else { unreachable!() };
/// let merged = merge(base, &overlay);
/// assert_eq!(Value::Object(merged), json!({ "server": { "host": "localhost", "port": 9000 } }));
/// ```
pub fn merge(base: Tree, overlay: &Tree) -> Tree {
    let mut base = base;
    merge_into(&mut base, overlay, "", &mut Vec::new());
    base
}

/// Merge `overlay` on top of `base` and log which keys the source changed.
pub(crate) fn merge_with_logging(base: Tree, overlay: &Tree, source_name: &str) -> Tree {
    let mut base = base;
    let mut changes = Vec::new();
    merge_into(&mut base, overlay, "", &mut changes);

    if !changes.is_empty() {
        tracing::info!("Configuration from {}: {:?}", source_name, changes);
    }

    base
}

fn merge_into(base: &mut Tree, overlay: &Tree, prefix: &str, changes: &mut Vec<String>) {
    for (key, value) in overlay {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        match base.get_mut(key) {
            Some(existing) => match (existing, value) {
                (Value::Object(existing), Value::Object(incoming)) => {
                    merge_into(existing, incoming, &path, changes);
                }
                (existing, _) => {
                    if *existing != *value {
                        changes.push(path);
                    }
                    *existing = value.clone();
                }
            },
            None => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}
