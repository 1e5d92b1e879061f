//! In-memory storage module
//!
//! Provides the open-addressed table used for every keyed collection in the
//! server: the database itself and the registry of live connections.
//! This module knows nothing about sockets or the text protocol.

mod entry;
mod hash;
mod table;

pub use entry::Entry;
pub use hash::fnv1a;
pub use table::{Iter, IterMut, Table, INITIAL_CAPACITY};

use thiserror::Error;

/// Storage failures
///
/// Lookup and delete misses are ordinary outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The slot array for the requested capacity could not be allocated
    #[error("out of memory allocating {capacity} slots")]
    OutOfMemory { capacity: usize },
}
