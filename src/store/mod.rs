//! Entry storage.
//!
//! The execution engine only needs read access to entries by name, expressed
//! by the [`EntryLookup`] trait. The on-disk [`Vault`] implements it for the
//! CLI; [`MemoryStore`] backs tests.

mod memory;
mod vault;

use crate::core::Entry;

pub use memory::MemoryStore;
pub use vault::{StoreError, Vault};

/// Read-only entry lookup consumed by the execution engine.
pub trait EntryLookup {
    /// Find an entry by ID or name.
    fn lookup(&self, identifier: &str) -> Option<Entry>;
}
