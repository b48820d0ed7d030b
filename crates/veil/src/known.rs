//! Process-wide set of every kind that has ever had a fib registered.
//!
//! Append-only. Used to drop pending positions nobody will ever fib.

use std::collections::HashSet;

use parking_lot::RwLock;
use veil_shared::CellKind;

/// Kinds that have had a fib registered in any partition or class.
#[derive(Debug, Default)]
pub struct KnownKinds {
    kinds: RwLock<HashSet<CellKind>>,
}

impl KnownKinds {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `kind`. Returns true if it was not known before.
    pub fn insert(&self, kind: CellKind) -> bool {
        self.kinds.write().insert(kind)
    }

    /// Returns true if a fib was ever registered for `kind`.
    #[must_use]
    pub fn contains(&self, kind: CellKind) -> bool {
        self.kinds.read().contains(&kind)
    }

    /// Number of known kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.read().len()
    }

    /// Returns true if no kind was ever registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let known = KnownKinds::new();
        let kind = CellKind::from_token(3);
        assert!(known.is_empty());
        assert!(known.insert(kind));
        assert!(!known.insert(kind));
        assert!(known.contains(kind));
        assert!(!known.contains(CellKind::from_token(4)));
        assert_eq!(known.len(), 1);
    }
}
