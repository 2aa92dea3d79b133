//! Merged configuration context.
//!
//! A [`Ctx`] is the resolved configuration a subsystem hands to its hooks and
//! facets. Contexts layer: a subsystem merges its own configuration over its
//! parent's resolved context, and later layers win field-by-field (objects
//! merge recursively, scalars and arrays replace).
//!
//! Contexts also provide a canonical [`fingerprint`](Ctx::fingerprint) used to
//! memoize build plans: two contexts with the same logical content produce the
//! same fingerprint regardless of key insertion order.
//!
//! # Example
//!
//! ```
//! use mosaic_facet::ctx::Ctx;
//! use serde_json::json;
//!
//! let mut ctx = Ctx::from_json(json!({
//!     "db": { "host": "localhost", "port": 5432 }
//! })).unwrap();
//!
//! let overlay = Ctx::from_json(json!({
//!     "db": { "port": 5433 }
//! })).unwrap();
//!
//! ctx.merge(&overlay);
//! assert_eq!(ctx.get("db.host"), Some(&json!("localhost")));
//! assert_eq!(ctx.get("db.port"), Some(&json!(5433)));
//! ```

use core::hash::{Hash, Hasher};
use std::hash::DefaultHasher;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Error raised when constructing a [`Ctx`] from a non-object value.
#[derive(Debug, Clone, Error)]
#[error("configuration root must be a JSON object, got {found}")]
pub struct CtxError {
    /// A short description of the offending value's type.
    pub found: &'static str,
}

/// A merged configuration object.
///
/// Internally a JSON object; insertion order is preserved for iteration, but
/// [`fingerprint`](Ctx::fingerprint) is key-order independent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ctx {
    root: Map<String, Value>,
}

impl Ctx {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`CtxError`] if the value is not a JSON object.
    pub fn from_json(value: Value) -> Result<Self, CtxError> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(CtxError {
                found: json_type_name(&other),
            }),
        }
    }

    /// Returns true if the context has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Returns the underlying configuration object.
    #[must_use]
    pub fn as_object(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Looks up a value by dotted path (e.g. `"db.pool.size"`).
    ///
    /// Returns `None` if any segment is missing or a non-terminal segment
    /// resolves to a non-object.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current: Option<&Value> = None;
        for segment in path.split('.') {
            current = match current {
                None => self.root.get(segment),
                Some(Value::Object(map)) => map.get(segment),
                Some(_) => None,
            };
            current.as_ref()?;
        }
        current
    }

    /// Sets a top-level key.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.root.insert(key.into(), value);
    }

    /// Deep-merges `overlay` into this context.
    ///
    /// Objects merge recursively; scalars and arrays from the overlay replace
    /// the base value wholesale.
    pub fn merge(&mut self, overlay: &Ctx) {
        merge_objects(&mut self.root, &overlay.root);
    }

    /// Returns a new context equal to this one with `overlay` merged on top.
    #[must_use]
    pub fn merged(&self, overlay: &Ctx) -> Ctx {
        let mut out = self.clone();
        out.merge(overlay);
        out
    }

    /// Computes a canonical 64-bit fingerprint of the context content.
    ///
    /// Keys are visited in sorted order at every nesting level, so contexts
    /// that differ only in insertion order fingerprint identically. Used to
    /// decide whether a memoized build plan is still valid.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        hash_object(&self.root, &mut hasher);
        hasher.finish()
    }
}

impl From<Map<String, Value>> for Ctx {
    fn from(root: Map<String, Value>) -> Self {
        Self { root }
    }
}

fn merge_objects(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, incoming) in overlay {
        match (base.get_mut(key), incoming) {
            (Some(Value::Object(existing)), Value::Object(patch)) => {
                merge_objects(existing, patch);
            }
            (_, value) => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

fn hash_object(map: &Map<String, Value>, hasher: &mut impl Hasher) {
    map.len().hash(hasher);
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by_key(|(key, _)| *key);
    for (key, value) in entries {
        key.hash(hasher);
        hash_value(value, hasher);
    }
}

fn hash_value(value: &Value, hasher: &mut impl Hasher) {
    match value {
        Value::Null => 0u8.hash(hasher),
        Value::Bool(flag) => {
            1u8.hash(hasher);
            flag.hash(hasher);
        }
        Value::Number(number) => {
            2u8.hash(hasher);
            number.to_string().hash(hasher);
        }
        Value::String(text) => {
            3u8.hash(hasher);
            text.hash(hasher);
        }
        Value::Array(items) => {
            4u8.hash(hasher);
            items.len().hash(hasher);
            for item in items {
                hash_value(item, hasher);
            }
        }
        Value::Object(map) => {
            5u8.hash(hasher);
            hash_object(map, hasher);
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
