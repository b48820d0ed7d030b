//! # Identity Handles
//!
//! Opaque, identity-compared handles issued by the host.
//!
//! A [`CellKind`] is NOT its name. The host's type registry hands out one
//! token per registered kind; two kinds that happen to share a name get two
//! different tokens and are different map keys everywhere in this workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle to a kind of cell (a registered block type).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKind(u32);

impl CellKind {
    /// Wraps an identity token issued by the host's type registry.
    #[inline]
    #[must_use]
    pub const fn from_token(token: u32) -> Self {
        Self(token)
    }

    /// Returns the identity token.
    #[inline]
    #[must_use]
    pub const fn token(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kind#{}", self.0)
    }
}

/// Identity of a live partition (one world instance).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionId(pub u64);

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "partition#{}", self.0)
    }
}

/// Class of a partition (the dimension type a world is built from).
///
/// Several live partitions may share one class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionClass(pub u32);

impl PartitionClass {
    /// The primary class. Pending positions submitted without a partition
    /// are usually destined for a partition of this class.
    pub const OVERWORLD: Self = Self(0);
}

impl fmt::Display for PartitionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class#{}", self.0)
    }
}
