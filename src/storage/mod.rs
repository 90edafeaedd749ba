//! World-state storage for ClassLedger.
//!
//! The [`WorldState`] trait defines the abstract key-value interface; the
//! submodules provide backends.

mod memory;
mod traits;

#[cfg(feature = "persistent")]
pub mod persistent;

pub use memory::InMemoryWorldState;
pub use traits::{StateEntry, StorageError, WorldState};

#[cfg(feature = "persistent")]
pub use persistent::{open_world_state, PersistentWorldState};
