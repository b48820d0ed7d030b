//! # Fib Registry
//!
//! The public entry point. One instance per process, shared by reference with
//! every call site; there are no hidden statics.
//!
//! ## Partition lifecycle
//!
//! ```text
//! partition becomes available
//!        │
//!        ▼
//! store(partition) ──> absent? ──> build TrackingStore
//!                                     │
//!                                     ├─ apply class preloads (oldest first)
//!                                     └─ drain pending queue (newest first),
//!                                        tracking + redrawing each position
//!        │
//!        ▼
//! track / untrack / register / refresh / save route to that store
//! ```
//!
//! A new store is published already locked, so nothing can observe it before
//! its preloads and pending entries are in.
//!
//! ## Locking
//!
//! ```text
//! stores: RwLock<HashMap<PartitionId, Slot>>
//!                                      ├─ fibs:  FibTable (RwLock, shared with the store)
//!                                      └─ store: Arc<Mutex<TrackingStore>>
//! ```
//!
//! The map lock is only held to find or publish a slot, never across a host
//! callback or a store lock. Resolution reads the map and the fib table and
//! never waits on a store, so a host may resolve cells from inside
//! `mark_for_update`. Each store has its own mutex; holding one partition's
//! store does not stall any other partition. Fibs run with every lock
//! released.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use parking_lot::{ArcMutexGuard, Mutex, RawMutex, RwLock};
use serde_json::Value;
use veil_shared::{
    BlockPos, CellKind, CellState, KindRegistry, Partition, PartitionClass, PartitionId, Viewer,
};

use crate::config::VeilConfig;
use crate::document::TrackedDocument;
use crate::error::VeilResult;
use crate::fib::{run_contained, Fib, FibTable, Resolution};
use crate::known::KnownKinds;
use crate::pending::PendingQueue;
use crate::preload::PreloadRegistry;
use crate::store::TrackingStore;

/// Exclusive access to one partition's store.
///
/// Holds only that partition's lock. Other partitions and resolution are
/// unaffected while it lives.
pub type StoreGuard<S, V> = ArcMutexGuard<RawMutex, TrackingStore<S, V>>;

type SharedStore<S, V> = Arc<Mutex<TrackingStore<S, V>>>;

/// One partition's entry in the registry.
struct Slot<S, V> {
    /// Read by resolution without locking the store.
    fibs: FibTable<S, V>,
    store: SharedStore<S, V>,
}

/// How a slot lookup was satisfied.
enum Access<S, V> {
    /// The store already existed.
    Existing(SharedStore<S, V>),
    /// The store was just published, locked and not yet drained.
    Built(StoreGuard<S, V>),
}

/// Process-wide fib state: every partition's store plus the queues that feed
/// stores which do not exist yet.
pub struct FibRegistry<S, V> {
    config: VeilConfig,
    known: KnownKinds,
    pending: PendingQueue,
    preload: PreloadRegistry<S, V>,
    stores: RwLock<HashMap<PartitionId, Slot<S, V>>>,
}

impl<S, V> Default for FibRegistry<S, V>
where
    S: CellState + 'static,
    V: Viewer + 'static,
{
    fn default() -> Self {
        Self::new(VeilConfig::default())
    }
}

impl<S, V> FibRegistry<S, V>
where
    S: CellState + 'static,
    V: Viewer + 'static,
{
    /// Creates an empty registry.
    #[must_use]
    pub fn new(config: VeilConfig) -> Self {
        Self {
            config,
            known: KnownKinds::new(),
            pending: PendingQueue::new(),
            preload: PreloadRegistry::new(),
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &VeilConfig {
        &self.config
    }

    /// Kinds that ever had a fib registered.
    #[must_use]
    pub fn known_kinds(&self) -> &KnownKinds {
        &self.known
    }

    /// Positions waiting for a partition.
    #[must_use]
    pub fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    /// Returns true if `partition` already has a store.
    #[must_use]
    pub fn contains(&self, partition: PartitionId) -> bool {
        self.stores.read().contains_key(&partition)
    }

    // ========================================================================
    // Store access
    // ========================================================================

    /// The store of `partition`, built on first use.
    ///
    /// The guard locks this partition's store only. Host callbacks made while
    /// it is held may resolve cells but must not mutate this partition through
    /// the registry.
    pub fn store<P: Partition>(&self, partition: &P) -> StoreGuard<S, V> {
        let access = match self.access(partition, |_| Ok::<(), Infallible>(())) {
            Ok(access) => access,
            Err(never) => match never {},
        };
        match access {
            Access::Existing(store) => {
                let mut store = store.lock_arc();
                if self.config.drain_on_access {
                    self.drain_into(&mut store, partition);
                }
                store
            }
            Access::Built(mut store) => {
                self.drain_into(&mut store, partition);
                store
            }
        }
    }

    /// Drops the store of `partition`. Save it first.
    ///
    /// Returns true if a store was dropped. A caller still holding its guard
    /// keeps working on the detached store until the guard is released.
    pub fn unload(&self, partition: PartitionId) -> bool {
        let unloaded = self.stores.write().remove(&partition).is_some();
        if unloaded {
            tracing::info!("Unloaded fib store for {}", partition);
        }
        unloaded
    }

    fn existing(&self, partition: PartitionId) -> Option<SharedStore<S, V>> {
        self.stores.read().get(&partition).map(|slot| Arc::clone(&slot.store))
    }

    /// Finds the store of `partition`, or builds and publishes one.
    ///
    /// A new store is seeded, given its class preloads, then published under
    /// its own lock. If `seed` fails nothing is published. If another thread
    /// publishes first, the seeded store is discarded and theirs is returned.
    fn access<P, E>(
        &self,
        partition: &P,
        seed: impl FnOnce(&mut TrackingStore<S, V>) -> Result<(), E>,
    ) -> Result<Access<S, V>, E>
    where
        P: Partition,
    {
        let id = partition.id();
        if let Some(store) = self.existing(id) {
            return Ok(Access::Existing(store));
        }
        let mut store = TrackingStore::new(id);
        seed(&mut store)?;
        let mut stores = self.stores.write();
        match stores.entry(id) {
            Entry::Occupied(slot) => Ok(Access::Existing(Arc::clone(&slot.get().store))),
            Entry::Vacant(vacant) => {
                self.apply_preloads(&mut store, partition);
                let fibs = store.fib_table();
                let store = Arc::new(Mutex::new(store));
                let guard = store.lock_arc();
                vacant.insert(Slot { fibs, store });
                Ok(Access::Built(guard))
            }
        }
    }

    fn apply_preloads<P: Partition>(&self, store: &mut TrackingStore<S, V>, partition: &P) {
        let entries = self.preload.entries_for(partition.class());
        for entry in &entries {
            store.register(&self.known, entry.kind, entry.fib.clone());
        }
        if !entries.is_empty() {
            tracing::info!(
                "Registered {} pre-loaded fib{} in {}",
                entries.len(),
                if entries.len() == 1 { "" } else { "s" },
                partition.id()
            );
        }
    }

    /// Moves every pending entry into `store`. Returns how many were tracked.
    fn drain_into<P: Partition>(&self, store: &mut TrackingStore<S, V>, partition: &P) -> usize {
        let drained = self.pending.drain();
        let mut tracked = 0;
        for entry in &drained {
            if store.track(entry.kind, entry.pos) {
                tracked += 1;
            }
            if self.config.redraw_drained {
                partition.mark_for_update(entry.pos);
            }
        }
        if tracked > 0 {
            tracing::info!(
                "Registered {} pre-loaded cell{} in {}",
                tracked,
                if tracked == 1 { "" } else { "s" },
                partition.id()
            );
        }
        if drained.len() > tracked {
            tracing::debug!(
                "Drained {} pending cells into {}; {} had no fib there",
                drained.len(),
                partition.id(),
                drained.len() - tracked
            );
        }
        tracked
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Registers `fib` for `kind` in a live partition, replacing any earlier one.
    pub fn register<P, F>(&self, partition: &P, kind: CellKind, fib: F)
    where
        P: Partition,
        F: Fib<S, V> + 'static,
    {
        self.store(partition).register(&self.known, kind, Arc::new(fib));
    }

    /// Registers `fib` for `kind` in every partition of `class` built from now
    /// on. Partitions that are already live are not affected.
    pub fn register_for_class<F>(&self, class: PartitionClass, kind: CellKind, fib: F)
    where
        F: Fib<S, V> + 'static,
    {
        self.preload.register(&self.known, class, kind, Arc::new(fib));
        tracing::info!("Pre-loaded a fib for {} in {}", kind, class);
    }

    // ========================================================================
    // Tracking
    // ========================================================================

    /// Tracks `pos` as a cell of `kind` in `partition`.
    ///
    /// Returns true if the position was newly tracked.
    pub fn put<P: Partition>(&self, partition: &P, kind: CellKind, pos: BlockPos) -> bool {
        self.store(partition).track(kind, pos)
    }

    /// Tracks `pos` using the kind of `state`.
    pub fn put_state<P: Partition>(&self, partition: &P, state: &S, pos: BlockPos) -> bool {
        self.store(partition).track_state(state, pos)
    }

    /// Queues `pos` for whichever partition store is built next.
    ///
    /// For callers that run before any partition exists (world generation).
    /// The queue cannot target a partition: the next store built claims the
    /// entry. Kinds that never had a fib registered are dropped.
    pub fn put_pending(&self, kind: CellKind, pos: BlockPos) -> bool {
        let queued = self.pending.enqueue(&self.known, kind, pos);
        if !queued {
            tracing::debug!("Dropped pending {} at {}: no fib was ever registered", kind, pos);
        }
        queued
    }

    /// Stops tracking `pos` in `partition`, keyed by the kind the host
    /// currently has there.
    pub fn remove<P: Partition>(&self, partition: &P, pos: BlockPos) -> bool {
        let current = partition.kind_at(pos);
        self.store(partition).untrack(pos, current)
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolves `state` for `viewer`, keeping the reason for any fallback.
    ///
    /// Never builds a store and never waits on one: a viewer in a partition
    /// nobody has touched yet gets [`Resolution::NoStore`].
    pub fn try_get(&self, state: &S, viewer: &V) -> Resolution<S> {
        let Some(partition) = viewer.partition() else {
            return Resolution::NoStore;
        };
        let fib = {
            let stores = self.stores.read();
            let Some(slot) = stores.get(&partition) else {
                return Resolution::NoStore;
            };
            slot.fibs.get(state.kind())
        };
        match fib {
            Some(fib) => run_contained(fib.as_ref(), state, viewer),
            None => Resolution::Unregistered,
        }
    }

    /// What `viewer` is told a cell in `state` contains.
    ///
    /// Never fails. Anything short of a fib producing a state yields `state`.
    pub fn get(&self, state: &S, viewer: &V) -> S {
        let resolution = self.try_get(state, viewer);
        match resolution {
            Resolution::Failed => {
                tracing::warn!("Fib for {} panicked; showing real state", state.kind());
            }
            Resolution::NoStore => {
                tracing::trace!("No fib store for viewer's partition; showing real state");
            }
            Resolution::Fibbed(_) | Resolution::Unregistered => {}
        }
        resolution.into_state(state.clone())
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    /// Redraws every tracked cell in `partition`.
    pub fn refresh_all<P: Partition>(&self, partition: &P) -> usize {
        self.store(partition).refresh_all(partition)
    }

    /// Redraws every tracked cell of `kind` in `partition`.
    pub fn refresh_kind<P: Partition>(&self, partition: &P, kind: CellKind) -> usize {
        self.store(partition).refresh_kind(partition, kind)
    }

    /// Redraws every tracked cell of each of `kinds` in `partition`.
    pub fn refresh_kinds<P, I>(&self, partition: &P, kinds: I) -> usize
    where
        P: Partition,
        I: IntoIterator<Item = CellKind>,
    {
        self.store(partition).refresh_kinds(partition, kinds)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Saves the tracked set of `partition` under the configured key.
    ///
    /// Returns `Ok(None)` if the partition has no store. Clears the store's
    /// dirty flag on success.
    ///
    /// # Errors
    ///
    /// Fails if a tracked kind has no identifier in `kinds`.
    pub fn save(&self, partition: PartitionId, kinds: &impl KindRegistry) -> VeilResult<Option<Value>> {
        let Some(store) = self.existing(partition) else {
            return Ok(None);
        };
        let mut store = store.lock();
        let doc = store.serialize(kinds)?;
        let root = doc.to_namespaced(&self.config.save_key)?;
        store.mark_clean();
        tracing::debug!("Saved {} tracked cells for {}", doc.position_count(), partition);
        Ok(Some(root))
    }

    /// Loads the tracked set of `partition` from a saved document.
    ///
    /// A live store has its tracked set replaced. Otherwise a new store is
    /// built from the document, then prepared like any new store. On error
    /// nothing changes: a live store keeps its data and no store is built.
    ///
    /// # Errors
    ///
    /// Fails if the document lacks the save key, is malformed, or names a kind
    /// `kinds` does not know.
    pub fn load<P: Partition>(
        &self,
        partition: &P,
        root: &Value,
        kinds: &impl KindRegistry,
    ) -> VeilResult<()> {
        let doc = TrackedDocument::from_namespaced(root, &self.config.save_key)?;
        match self.access(partition, |store| store.deserialize(&doc, kinds))? {
            Access::Existing(store) => {
                store.lock().deserialize(&doc, kinds)?;
            }
            Access::Built(mut store) => {
                self.drain_into(&mut store, partition);
            }
        }
        tracing::debug!("Loaded {} tracked cells for {}", doc.position_count(), partition.id());
        Ok(())
    }
}

impl<S, V> fmt::Debug for FibRegistry<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FibRegistry")
            .field("config", &self.config)
            .field("known", &self.known.len())
            .field("pending", &self.pending.len())
            .field("stores", &self.stores.read().len())
            .finish_non_exhaustive()
    }
}
