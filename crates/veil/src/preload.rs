//! # Preload Registry
//!
//! Fib registrations made against a partition class before any partition of
//! that class is live (e.g. from a mod initializer).
//!
//! Entries are never consumed: every partition of the class that is built
//! afterwards gets every entry, in registration order.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use veil_shared::{CellKind, PartitionClass};

use crate::fib::SharedFib;
use crate::known::KnownKinds;

/// A registration waiting for partitions of a class.
pub struct PreloadEntry<S, V> {
    /// Kind to fib.
    pub kind: CellKind,
    /// The fib.
    pub fib: SharedFib<S, V>,
}

impl<S, V> Clone for PreloadEntry<S, V> {
    fn clone(&self) -> Self {
        Self { kind: self.kind, fib: self.fib.clone() }
    }
}

impl<S, V> fmt::Debug for PreloadEntry<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreloadEntry").field("kind", &self.kind).finish_non_exhaustive()
    }
}

/// Class → ordered registrations.
pub struct PreloadRegistry<S, V> {
    entries: RwLock<HashMap<PartitionClass, Vec<PreloadEntry<S, V>>>>,
}

impl<S, V> Default for PreloadRegistry<S, V> {
    fn default() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }
}

impl<S, V> PreloadRegistry<S, V> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a registration for `class` and records `kind` in `known`.
    pub fn register(
        &self,
        known: &KnownKinds,
        class: PartitionClass,
        kind: CellKind,
        fib: SharedFib<S, V>,
    ) {
        self.entries.write().entry(class).or_default().push(PreloadEntry { kind, fib });
        known.insert(kind);
    }

    /// Registrations for `class`, oldest first. Nothing is removed.
    #[must_use]
    pub fn entries_for(&self, class: PartitionClass) -> Vec<PreloadEntry<S, V>> {
        self.entries.read().get(&class).cloned().unwrap_or_default()
    }

    /// Number of registrations for `class`.
    #[must_use]
    pub fn count_for(&self, class: PartitionClass) -> usize {
        self.entries.read().get(&class).map_or(0, Vec::len)
    }
}

impl<S, V> fmt::Debug for PreloadRegistry<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        f.debug_map().entries(entries.iter().map(|(class, list)| (class, list.len()))).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    type Entry = PreloadEntry<u32, ()>;

    fn constant(value: u32) -> SharedFib<u32, ()> {
        Arc::new(move |_s: &u32, _v: &()| value)
    }

    #[test]
    fn test_entries_keep_order_and_are_not_consumed() {
        let known = KnownKinds::new();
        let preload = PreloadRegistry::new();
        let a = CellKind::from_token(1);
        let b = CellKind::from_token(2);
        preload.register(&known, PartitionClass::OVERWORLD, a, constant(10));
        preload.register(&known, PartitionClass::OVERWORLD, b, constant(20));

        for _ in 0..2 {
            let entries: Vec<Entry> = preload.entries_for(PartitionClass::OVERWORLD);
            let kinds: Vec<CellKind> = entries.iter().map(|e| e.kind).collect();
            assert_eq!(kinds, vec![a, b]);
            assert_eq!(entries[1].fib.fib(&0, &()), 20);
        }
        assert!(known.contains(a) && known.contains(b));
    }

    #[test]
    fn test_classes_are_separate() {
        let known = KnownKinds::new();
        let preload: PreloadRegistry<u32, ()> = PreloadRegistry::new();
        preload.register(&known, PartitionClass(1), CellKind::from_token(1), constant(1));
        assert_eq!(preload.count_for(PartitionClass(1)), 1);
        assert_eq!(preload.count_for(PartitionClass(2)), 0);
        assert!(preload.entries_for(PartitionClass(2)).is_empty());
    }
}
