//! # Mock Host
//!
//! In-memory implementations of the host traits for tests and benchmarks.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::host::{CellState, KindRegistry, Partition, Viewer};
use crate::kind::{CellKind, PartitionClass, PartitionId};
use crate::pos::BlockPos;

// ============================================================================
// KIND REGISTRY
// ============================================================================

/// Mock block registry issuing sequential tokens.
///
/// Registering the same name twice issues two distinct kinds; lookups by name
/// return the most recent one.
#[derive(Debug, Default)]
pub struct MockKindRegistry {
    names: HashMap<CellKind, String>,
    by_name: HashMap<String, CellKind>,
    next_token: u32,
}

impl MockKindRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a kind under `name` and returns its handle.
    pub fn register(&mut self, name: &str) -> CellKind {
        self.next_token += 1;
        let kind = CellKind::from_token(self.next_token);
        self.names.insert(kind, name.to_string());
        self.by_name.insert(name.to_string(), kind);
        kind
    }

    /// Issues a handle the registry has no name for.
    pub fn register_unnamed(&mut self) -> CellKind {
        self.next_token += 1;
        CellKind::from_token(self.next_token)
    }
}

impl KindRegistry for MockKindRegistry {
    fn kind_id(&self, kind: CellKind) -> Option<String> {
        self.names.get(&kind).cloned()
    }

    fn kind_by_id(&self, id: &str) -> Option<CellKind> {
        self.by_name.get(id).copied()
    }
}

// ============================================================================
// PARTITION
// ============================================================================

/// Mock world: a sparse cell map plus a log of redraw requests.
#[derive(Debug)]
pub struct MockPartition {
    id: PartitionId,
    class: PartitionClass,
    cells: HashMap<BlockPos, CellKind>,
    redraws: Mutex<Vec<BlockPos>>,
}

impl MockPartition {
    /// Creates an empty partition.
    #[must_use]
    pub fn new(id: u64, class: PartitionClass) -> Self {
        Self {
            id: PartitionId(id),
            class,
            cells: HashMap::new(),
            redraws: Mutex::new(Vec::new()),
        }
    }

    /// Places `kind` at `pos`.
    pub fn set_kind(&mut self, pos: BlockPos, kind: CellKind) {
        self.cells.insert(pos, kind);
    }

    /// Clears `pos`.
    pub fn clear(&mut self, pos: BlockPos) {
        self.cells.remove(&pos);
    }

    /// Positions redrawn so far, in request order.
    #[must_use]
    pub fn redraws(&self) -> Vec<BlockPos> {
        self.redraws.lock().clone()
    }

    /// Number of redraw requests so far.
    #[must_use]
    pub fn redraw_count(&self) -> usize {
        self.redraws.lock().len()
    }

    /// Forgets recorded redraw requests.
    pub fn clear_redraws(&self) {
        self.redraws.lock().clear();
    }
}

impl Partition for MockPartition {
    fn id(&self) -> PartitionId {
        self.id
    }

    fn class(&self) -> PartitionClass {
        self.class
    }

    fn kind_at(&self, pos: BlockPos) -> Option<CellKind> {
        self.cells.get(&pos).copied()
    }

    fn mark_for_update(&self, pos: BlockPos) {
        self.redraws.lock().push(pos);
    }
}

// ============================================================================
// STATE & VIEWER
// ============================================================================

/// Mock cell state: a kind plus opaque metadata bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MockState {
    /// Cell kind.
    pub kind: CellKind,
    /// Metadata (rotation, growth stage, ...).
    pub meta: u16,
}

impl MockState {
    /// State of `kind` with zeroed metadata.
    #[must_use]
    pub const fn of(kind: CellKind) -> Self {
        Self { kind, meta: 0 }
    }
}

impl CellState for MockState {
    fn kind(&self) -> CellKind {
        self.kind
    }
}

/// Mock player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockViewer {
    /// Player name.
    pub name: String,
    /// Partition the player is in.
    pub partition: Option<PartitionId>,
    /// Whether the player has unlocked whatever the fib is hiding.
    pub privileged: bool,
}

impl MockViewer {
    /// Creates an unprivileged viewer inside `partition`.
    #[must_use]
    pub fn in_partition(name: &str, partition: PartitionId) -> Self {
        Self { name: name.to_string(), partition: Some(partition), privileged: false }
    }

    /// Creates a viewer that is not in any partition.
    #[must_use]
    pub fn detached(name: &str) -> Self {
        Self { name: name.to_string(), partition: None, privileged: false }
    }

    /// Marks the viewer privileged.
    #[must_use]
    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }
}

impl Viewer for MockViewer {
    fn partition(&self) -> Option<PartitionId> {
        self.partition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_name_issues_distinct_kinds() {
        let mut registry = MockKindRegistry::new();
        let first = registry.register("mod:ore");
        let second = registry.register("mod:ore");
        assert_ne!(first, second);
        assert_eq!(registry.kind_by_id("mod:ore"), Some(second));
        assert_eq!(registry.kind_id(first).as_deref(), Some("mod:ore"));
    }

    #[test]
    fn test_partition_records_redraws() {
        let mut registry = MockKindRegistry::new();
        let stone = registry.register("mod:stone");
        let mut world = MockPartition::new(1, PartitionClass::OVERWORLD);
        world.set_kind(BlockPos::ORIGIN, stone);

        assert_eq!(world.kind_at(BlockPos::ORIGIN), Some(stone));
        world.mark_for_update(BlockPos::ORIGIN);
        assert_eq!(world.redraws(), vec![BlockPos::ORIGIN]);

        world.clear(BlockPos::ORIGIN);
        assert_eq!(world.kind_at(BlockPos::ORIGIN), None);
    }
}
