//! # Fibs
//!
//! A fib decides what a viewer is told a cell contains. It never touches the
//! authoritative state; it returns a replacement for one viewer.
//!
//! Closures are fibs:
//!
//! ```rust,ignore
//! registry.register(&world, ore, |state: &BlockState, player: &Player| {
//!     if player.has_advancement(SMELTING) { state.clone() } else { STONE }
//! });
//! ```

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;
use veil_shared::CellKind;

/// Viewer-dependent replacement of a cell state.
pub trait Fib<S, V>: Send + Sync {
    /// What `viewer` is told a cell in `state` contains.
    fn fib(&self, state: &S, viewer: &V) -> S;
}

impl<S, V, F> Fib<S, V> for F
where
    F: Fn(&S, &V) -> S + Send + Sync,
{
    fn fib(&self, state: &S, viewer: &V) -> S {
        self(state, viewer)
    }
}

/// Shared handle to a registered fib.
pub type SharedFib<S, V> = Arc<dyn Fib<S, V>>;

/// Fibs of one partition, keyed by kind.
///
/// Clones share the same table. A store writes to it on registration; the
/// registry reads it on resolution without touching the store's lock.
pub(crate) struct FibTable<S, V> {
    fibs: Arc<RwLock<HashMap<CellKind, SharedFib<S, V>>>>,
}

impl<S, V> FibTable<S, V> {
    pub(crate) fn new() -> Self {
        Self { fibs: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub(crate) fn insert(&self, kind: CellKind, fib: SharedFib<S, V>) {
        self.fibs.write().insert(kind, fib);
    }

    pub(crate) fn get(&self, kind: CellKind) -> Option<SharedFib<S, V>> {
        self.fibs.read().get(&kind).cloned()
    }

    pub(crate) fn contains(&self, kind: CellKind) -> bool {
        self.fibs.read().contains_key(&kind)
    }

    pub(crate) fn len(&self) -> usize {
        self.fibs.read().len()
    }
}

impl<S, V> Clone for FibTable<S, V> {
    fn clone(&self) -> Self {
        Self { fibs: Arc::clone(&self.fibs) }
    }
}

/// Why a resolution did or did not produce a fibbed state.
///
/// Public lookups collapse every variant except [`Resolution::Fibbed`] to the
/// authoritative state; the variants exist so failures can be logged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution<S> {
    /// A fib ran and produced this state.
    Fibbed(S),
    /// No fib is registered for the kind.
    Unregistered,
    /// The viewer has no partition, or the partition has no store yet.
    NoStore,
    /// The fib panicked.
    Failed,
}

impl<S> Resolution<S> {
    /// State to show the viewer, falling back to `authoritative`.
    #[must_use]
    pub fn into_state(self, authoritative: S) -> S {
        match self {
            Self::Fibbed(state) => state,
            Self::Unregistered | Self::NoStore | Self::Failed => authoritative,
        }
    }

    /// Returns true if a fib produced the state.
    #[must_use]
    pub const fn is_fibbed(&self) -> bool {
        matches!(self, Self::Fibbed(_))
    }
}

/// Runs `fib`, containing any panic it raises.
pub(crate) fn run_contained<S, V, F>(fib: &F, state: &S, viewer: &V) -> Resolution<S>
where
    F: Fib<S, V> + ?Sized,
{
    match panic::catch_unwind(AssertUnwindSafe(|| fib.fib(state, viewer))) {
        Ok(fibbed) => Resolution::Fibbed(fibbed),
        Err(_) => Resolution::Failed,
    }
}
