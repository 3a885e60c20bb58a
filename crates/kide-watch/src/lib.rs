//! The watch layer (C4): typed informers for the built-in kinds plus CRD-discovered dynamic
//! informers, each driving the shared [`kide_core::ResourceCache`] through a transformer and the
//! bidirectional relationship patch, then emitting a [`kide_core::events::ResourceEvent`] onto an
//! intake channel the caller supplies (typically [`kide_hub`]'s resource hub).
//!
//! This crate knows nothing about HTTP, sessions, or fan-out — it only produces a consistent
//! cache and a stream of events describing how it changed.

mod dynamic;
mod error;
mod sync;
mod typed;
mod watcher;

pub use error::{Error, Result};
pub use sync::SyncHandle;
pub use watcher::{DEFAULT_RESYNC_PERIOD, Watcher};
