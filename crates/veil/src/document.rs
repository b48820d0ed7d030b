//! # Tracking Document
//!
//! On-disk form of one partition's tracked positions.
//!
//! ```text
//! {
//!   "<save_key>": {
//!     "<kind identifier>": [packed_pos, packed_pos, ...],
//!     ...
//!   }
//! }
//! ```
//!
//! Position order inside an array carries no meaning; arrays are written
//! sorted so saves are stable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{VeilError, VeilResult};

/// Kind identifier → packed positions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackedDocument {
    /// Entries keyed by kind identifier.
    pub entries: BTreeMap<String, Vec<i64>>,
}

impl TrackedDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of kinds in the document.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no kind is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of positions across all kinds.
    #[must_use]
    pub fn position_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Wraps the document under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`VeilError::MalformedDocument`] if serialization fails.
    pub fn to_namespaced(&self, key: &str) -> VeilResult<Value> {
        let mut root = Map::new();
        root.insert(key.to_string(), serde_json::to_value(self)?);
        Ok(Value::Object(root))
    }

    /// Reads the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`VeilError::MissingNamespace`] if `key` is absent and
    /// [`VeilError::MalformedDocument`] if the entry has the wrong shape.
    pub fn from_namespaced(root: &Value, key: &str) -> VeilResult<Self> {
        let inner = root
            .get(key)
            .ok_or_else(|| VeilError::MissingNamespace { key: key.to_string() })?;
        Ok(Self::deserialize(inner)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_namespaced_layout() {
        let mut doc = TrackedDocument::new();
        doc.entries.insert("mod:ore".to_string(), vec![1, -5]);
        let value = doc.to_namespaced("veil").unwrap();
        assert_eq!(value, json!({ "veil": { "mod:ore": [1, -5] } }));
        assert_eq!(TrackedDocument::from_namespaced(&value, "veil").unwrap(), doc);
    }

    #[test]
    fn test_missing_namespace() {
        let value = json!({ "other": {} });
        assert!(matches!(
            TrackedDocument::from_namespaced(&value, "veil"),
            Err(VeilError::MissingNamespace { .. })
        ));
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        let value = json!({ "veil": { "mod:ore": ["not", "longs"] } });
        assert!(matches!(
            TrackedDocument::from_namespaced(&value, "veil"),
            Err(VeilError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_position_count() {
        let mut doc = TrackedDocument::new();
        doc.entries.insert("a".to_string(), vec![1, 2]);
        doc.entries.insert("b".to_string(), vec![3]);
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.position_count(), 3);
    }
}
