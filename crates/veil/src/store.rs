//! # Tracking Store
//!
//! Per-partition state: which kinds have fibs, and where cells of those kinds
//! are, so they can be redrawn when a fib's answer changes.
//!
//! ## Invariants
//!
//! - A position is only ever added for a kind that has (or had) a fib in this
//!   store. Tracking a kind nobody fibs is a silent no-op.
//! - Fibs are never removed; replacing one keeps the kind's tracked positions.
//! - Fibs are not persisted. Only the tracked positions are saved.
//!
//! ## Threading
//!
//! A store belongs to its partition's tick thread and [`crate::FibRegistry`]
//! guards it with a per-partition lock. The fib table is shared with the
//! registry so resolution can read it while the store is locked.

use std::collections::{HashMap, HashSet};
use std::fmt;

use veil_shared::{BlockPos, CellKind, CellState, KindRegistry, Partition, PartitionId};

use crate::document::TrackedDocument;
use crate::error::{VeilError, VeilResult};
use crate::fib::{run_contained, FibTable, Resolution, SharedFib};
use crate::known::KnownKinds;

/// Fibs and tracked positions of one partition.
pub struct TrackingStore<S, V> {
    /// Partition this store belongs to.
    partition: PartitionId,
    /// Registered fib per kind.
    fibs: FibTable<S, V>,
    /// Packed positions per kind.
    tracked: HashMap<CellKind, HashSet<i64>>,
    /// Tracked set changed since the last save.
    dirty: bool,
}

impl<S, V> TrackingStore<S, V> {
    /// Creates an empty store. New stores start dirty so they get saved once.
    #[must_use]
    pub fn new(partition: PartitionId) -> Self {
        Self {
            partition,
            fibs: FibTable::new(),
            tracked: HashMap::new(),
            dirty: true,
        }
    }

    /// Partition this store belongs to.
    #[must_use]
    pub const fn partition(&self) -> PartitionId {
        self.partition
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Registers `fib` for `kind`, replacing any earlier one.
    pub fn register(&mut self, known: &KnownKinds, kind: CellKind, fib: SharedFib<S, V>) {
        self.fibs.insert(kind, fib);
        known.insert(kind);
        tracing::info!("Registered a fib for {} in {}", kind, self.partition);
    }

    /// Returns true if `kind` has a fib here.
    #[must_use]
    pub fn has_fib(&self, kind: CellKind) -> bool {
        self.fibs.contains(kind)
    }

    /// The fib registered for `kind`.
    #[must_use]
    pub fn fib_for(&self, kind: CellKind) -> Option<SharedFib<S, V>> {
        self.fibs.get(kind)
    }

    /// Handle to this store's fib table, shared with the registry.
    pub(crate) fn fib_table(&self) -> FibTable<S, V> {
        self.fibs.clone()
    }

    // ========================================================================
    // Tracking
    // ========================================================================

    /// Starts tracking `pos` as a cell of `kind`.
    ///
    /// Returns true if the position was newly added. Kinds without a fib are
    /// ignored, so this is safe to call for every placed cell.
    pub fn track(&mut self, kind: CellKind, pos: BlockPos) -> bool {
        if !self.fibs.contains(kind) {
            return false;
        }
        let added = self.tracked.entry(kind).or_default().insert(pos.as_long());
        self.dirty |= added;
        added
    }

    /// Stops tracking `pos`, given the kind the host currently has there.
    ///
    /// Returns true if a position was removed. Nothing happens when `current`
    /// is `None` or its kind has no tracked set.
    pub fn untrack(&mut self, pos: BlockPos, current: Option<CellKind>) -> bool {
        let Some(kind) = current else {
            return false;
        };
        let removed = self
            .tracked
            .get_mut(&kind)
            .is_some_and(|set| set.remove(&pos.as_long()));
        self.dirty |= removed;
        removed
    }

    /// Returns true if `pos` is tracked as a cell of `kind`.
    #[must_use]
    pub fn is_tracked(&self, kind: CellKind, pos: BlockPos) -> bool {
        self.tracked.get(&kind).is_some_and(|set| set.contains(&pos.as_long()))
    }

    /// Number of tracked positions of `kind`.
    #[must_use]
    pub fn tracked_count(&self, kind: CellKind) -> usize {
        self.tracked.get(&kind).map_or(0, HashSet::len)
    }

    /// Number of tracked positions across all kinds.
    #[must_use]
    pub fn total_tracked(&self) -> usize {
        self.tracked.values().map(HashSet::len).sum()
    }

    /// Kinds with at least one tracked position.
    #[must_use]
    pub fn tracked_kinds(&self) -> Vec<CellKind> {
        let mut kinds: Vec<CellKind> = self
            .tracked
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(kind, _)| *kind)
            .collect();
        kinds.sort_unstable();
        kinds
    }

    /// Tracked positions of `kind`, unordered.
    #[must_use]
    pub fn positions(&self, kind: CellKind) -> Vec<BlockPos> {
        self.tracked
            .get(&kind)
            .map(|set| set.iter().copied().map(BlockPos::from_long).collect())
            .unwrap_or_default()
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    /// Redraws every tracked position. Returns how many were redrawn.
    pub fn refresh_all(&self, partition: &impl Partition) -> usize {
        debug_assert_eq!(partition.id(), self.partition);
        let count: usize = self
            .tracked
            .values()
            .map(|set| Self::redraw(partition, set))
            .sum();
        tracing::debug!("Updated {} tracked cells in {}", count, self.partition);
        count
    }

    /// Redraws every tracked position of `kind`.
    pub fn refresh_kind(&self, partition: &impl Partition, kind: CellKind) -> usize {
        self.refresh_kinds(partition, [kind])
    }

    /// Redraws every tracked position of each of `kinds`.
    pub fn refresh_kinds(
        &self,
        partition: &impl Partition,
        kinds: impl IntoIterator<Item = CellKind>,
    ) -> usize {
        debug_assert_eq!(partition.id(), self.partition);
        let count: usize = kinds
            .into_iter()
            .filter_map(|kind| self.tracked.get(&kind))
            .map(|set| Self::redraw(partition, set))
            .sum();
        tracing::debug!("Updated {} tracked cells in {}", count, self.partition);
        count
    }

    fn redraw(partition: &impl Partition, set: &HashSet<i64>) -> usize {
        for &packed in set {
            partition.mark_for_update(BlockPos::from_long(packed));
        }
        set.len()
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Returns true if the tracked set changed since the last save.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the tracked set as saved.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Builds the persisted form of the tracked set.
    ///
    /// Kinds with no tracked positions are omitted.
    ///
    /// # Errors
    ///
    /// Returns [`VeilError::UnnamedKind`] if the host has no identifier for a
    /// tracked kind.
    pub fn serialize(&self, kinds: &impl KindRegistry) -> VeilResult<TrackedDocument> {
        let mut doc = TrackedDocument::new();
        for (kind, set) in &self.tracked {
            if set.is_empty() {
                continue;
            }
            let id = kinds.kind_id(*kind).ok_or(VeilError::UnnamedKind(*kind))?;
            let mut packed: Vec<i64> = set.iter().copied().collect();
            packed.sort_unstable();
            doc.entries.insert(id, packed);
        }
        Ok(doc)
    }

    /// Replaces the tracked set with the contents of `doc`.
    ///
    /// The replacement is all-or-nothing: on error the current tracked set is
    /// left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`VeilError::UnknownKind`] for an identifier the host registry
    /// cannot resolve.
    pub fn deserialize(&mut self, doc: &TrackedDocument, kinds: &impl KindRegistry) -> VeilResult<()> {
        let mut tracked = HashMap::with_capacity(doc.entries.len());
        for (id, packed) in &doc.entries {
            let Some(kind) = kinds.kind_by_id(id) else {
                tracing::error!("Tracking data for {} names unknown kind {:?}", self.partition, id);
                return Err(VeilError::UnknownKind { id: id.clone() });
            };
            tracked.insert(kind, packed.iter().copied().collect::<HashSet<i64>>());
        }
        self.tracked = tracked;
        self.dirty = false;
        Ok(())
    }
}

impl<S: CellState, V> TrackingStore<S, V> {
    /// Starts tracking `pos` using the kind of `state`. Only the kind is used.
    pub fn track_state(&mut self, state: &S, pos: BlockPos) -> bool {
        self.track(state.kind(), pos)
    }

    /// Resolves `state` for `viewer`, keeping the reason for any fallback.
    #[must_use]
    pub fn resolve_detailed(&self, state: &S, viewer: &V) -> Resolution<S> {
        match self.fibs.get(state.kind()) {
            Some(fib) => run_contained(fib.as_ref(), state, viewer),
            None => Resolution::Unregistered,
        }
    }

    /// What `viewer` is told a cell in `state` contains.
    ///
    /// Never fails: without a fib, or if the fib panics, this is `state`.
    #[must_use]
    pub fn resolve(&self, state: &S, viewer: &V) -> S {
        let resolution = self.resolve_detailed(state, viewer);
        if matches!(resolution, Resolution::Failed) {
            tracing::warn!("Fib for {} panicked in {}; showing real state", state.kind(), self.partition);
        }
        resolution.into_state(state.clone())
    }
}

impl<S, V> fmt::Debug for TrackingStore<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackingStore")
            .field("partition", &self.partition)
            .field("fibs", &self.fibs.len())
            .field("tracked", &self.total_tracked())
            .field("dirty", &self.dirty)
            .finish()
    }
}
