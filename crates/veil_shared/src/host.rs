//! # Host Integration Traits
//!
//! Everything this workspace needs from the host simulation, expressed as
//! traits the host implements.
//!
//! ```text
//! veil defines:              host implements:
//! ┌────────────────────┐     ┌────────────────────┐
//! │ trait Viewer       │ ←── │ impl Viewer        │  players
//! │ trait Partition    │ ←── │ impl Partition     │  worlds
//! │ trait KindRegistry │ ←── │ impl KindRegistry  │  block registry
//! └────────────────────┘     └────────────────────┘
//! ```
//!
//! None of these calls may block. Redraw requests are fire-and-forget.

use crate::kind::{CellKind, PartitionClass, PartitionId};
use crate::pos::BlockPos;

/// Authoritative state of one cell.
///
/// Only the kind is inspected by this workspace; the rest is handed to
/// registered fibs untouched.
pub trait CellState: Clone {
    /// Kind of the cell this state belongs to.
    fn kind(&self) -> CellKind;
}

/// Someone being told what cells contain (a connected player).
pub trait Viewer {
    /// Partition the viewer currently lives in, if any.
    fn partition(&self) -> Option<PartitionId>;
}

/// A live partition (world) as seen from this workspace.
pub trait Partition {
    /// Identity of this partition.
    fn id(&self) -> PartitionId;

    /// Class this partition was built from.
    fn class(&self) -> PartitionClass;

    /// Kind currently occupying `pos`, or `None` if the host has nothing there.
    fn kind_at(&self, pos: BlockPos) -> Option<CellKind>;

    /// Asks the host to resend `pos` to every viewer that can see it.
    fn mark_for_update(&self, pos: BlockPos);
}

/// The host's registry of cell kinds, consulted only when saving and loading.
pub trait KindRegistry {
    /// Stable string identifier of `kind` (e.g. `"minecraft:stone"`).
    fn kind_id(&self, kind: CellKind) -> Option<String>;

    /// Kind registered under `id`.
    fn kind_by_id(&self, id: &str) -> Option<CellKind>;
}
