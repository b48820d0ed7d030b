//! # Pending Queue
//!
//! Positions submitted for tracking before any partition exists to hold them.
//!
//! ## Semantics
//!
//! - The queue is partition-agnostic: whichever partition store is built next
//!   claims every pending entry, even if the caller meant another partition.
//! - Entries for kinds that never had a fib registered are dropped on entry.
//! - `drain` hands back entries most-recent-first and empties the queue in one
//!   step, so world-generation threads may keep pushing while a partition
//!   thread drains.

use parking_lot::Mutex;
use veil_shared::{BlockPos, CellKind};

use crate::known::KnownKinds;

/// A tracking request waiting for a partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingEntry {
    /// Kind of the cell.
    pub kind: CellKind,
    /// Where the cell is.
    pub pos: BlockPos,
}

/// Thread-safe LIFO of [`PendingEntry`].
#[derive(Debug, Default)]
pub struct PendingQueue {
    stack: Mutex<Vec<PendingEntry>>,
}

impl PendingQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `(kind, pos)` if `kind` is in `known`.
    ///
    /// Returns true if the entry was queued.
    pub fn enqueue(&self, known: &KnownKinds, kind: CellKind, pos: BlockPos) -> bool {
        if !known.contains(kind) {
            return false;
        }
        self.stack.lock().push(PendingEntry { kind, pos });
        true
    }

    /// Empties the queue, returning entries most-recently-queued first.
    #[must_use]
    pub fn drain(&self) -> Vec<PendingEntry> {
        let mut taken = std::mem::take(&mut *self.stack.lock());
        taken.reverse();
        taken
    }

    /// Number of entries waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.lock().len()
    }

    /// Returns true if nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn known_with(kind: CellKind) -> KnownKinds {
        let known = KnownKinds::new();
        known.insert(kind);
        known
    }

    #[test]
    fn test_unknown_kind_dropped() {
        let queue = PendingQueue::new();
        let known = KnownKinds::new();
        assert!(!queue.enqueue(&known, CellKind::from_token(1), BlockPos::ORIGIN));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain_is_lifo_and_empties() {
        let kind = CellKind::from_token(1);
        let known = known_with(kind);
        let queue = PendingQueue::new();
        for i in 0..3 {
            assert!(queue.enqueue(&known, kind, BlockPos::new(i, 0, 0)));
        }

        let drained: Vec<i32> = queue.drain().iter().map(|e| e.pos.x).collect();
        assert_eq!(drained, vec![2, 1, 0]);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_concurrent_enqueue_and_drain_lose_nothing() {
        let kind = CellKind::from_token(7);
        let known = Arc::new(known_with(kind));
        let queue = Arc::new(PendingQueue::new());

        let producers: Vec<_> = (0..4)
            .map(|t| {
                let known = Arc::clone(&known);
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..1_000 {
                        queue.enqueue(&known, kind, BlockPos::new(t, i, 0));
                    }
                })
            })
            .collect();

        let mut drained = 0;
        while producers.iter().any(|p| !p.is_finished()) {
            drained += queue.drain().len();
        }
        for producer in producers {
            producer.join().unwrap();
        }
        drained += queue.drain().len();

        assert_eq!(drained, 4_000);
    }
}
