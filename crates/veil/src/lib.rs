//! # Veil
//!
//! Per-viewer disguises for grid cells.
//!
//! A host registers a [`Fib`] per cell kind. When a viewer is told what a cell
//! contains, the host asks [`FibRegistry::get`], which runs the fib for that
//! kind and returns what this viewer should see. The authoritative cell is
//! never touched.
//!
//! To let the host redraw disguised cells when a fib's answer changes, each
//! partition keeps the positions of every cell whose kind has a fib. That set
//! is persisted with the partition and survives reloads.
//!
//! ## Design Principles
//!
//! 1. **Fail open**: resolution never errors or panics into the caller; the
//!    worst case is the viewer sees the real cell
//! 2. **Fail loud on load**: a save naming an unknown kind is an error, never
//!    silently dropped
//! 3. **Early callers welcome**: fibs may be registered against a partition
//!    class, and positions submitted, before any partition exists
//!
//! ## Example
//!
//! ```rust,ignore
//! use veil::{FibRegistry, VeilConfig};
//!
//! let registry = FibRegistry::new(VeilConfig::default());
//!
//! // Mod initializer: no world yet.
//! registry.register_for_class(OVERWORLD, ore, |state: &BlockState, player: &Player| {
//!     if player.can_see_ore() { state.clone() } else { BlockState::STONE }
//! });
//!
//! // Block placed in a live world.
//! registry.put(&world, ore, pos);
//!
//! // Packet encoding, per player per block.
//! let shown = registry.get(&state, &player);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod document;
pub mod error;
pub mod fib;
pub mod known;
pub mod pending;
pub mod preload;
pub mod registry;
pub mod store;

pub use config::VeilConfig;
pub use document::TrackedDocument;
pub use error::{VeilError, VeilResult};
pub use fib::{Fib, Resolution, SharedFib};
pub use known::KnownKinds;
pub use pending::{PendingEntry, PendingQueue};
pub use preload::{PreloadEntry, PreloadRegistry};
pub use registry::{FibRegistry, StoreGuard};
pub use store::TrackingStore;
