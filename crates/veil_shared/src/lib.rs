//! # Veil Shared
//!
//! Types shared between the fib engine and the host simulation.
//!
//! ## CRITICAL RULE
//!
//! This crate holds NO engine logic. It carries:
//! - `BlockPos` and its 64-bit packing
//! - Identity handles (`CellKind`, `PartitionId`, `PartitionClass`)
//! - The traits the host implements (`CellState`, `Viewer`, `Partition`,
//!   `KindRegistry`)
//! - Mock implementations of those traits for tests

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod host;
pub mod kind;
pub mod mock;
pub mod pos;

pub use host::{CellState, KindRegistry, Partition, Viewer};
pub use kind::{CellKind, PartitionClass, PartitionId};
pub use pos::{Axis, BlockPos, PositionError};
