//! Abstract world-state interface.
//!
//! The ledger is a flat map from string keys to opaque byte values. The
//! contract only ever talks to it through this trait, so backends can be
//! swapped:
//! - In-memory for tests and embedded use
//! - Persistent (WAL + snapshot) for the command line tool

use thiserror::Error;

/// Errors that can occur during world-state access.
///
/// None of these mean "key not found": an absent key is `Ok(None)`.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend error.
    #[error("world state backend error: {0}")]
    Backend(String),

    /// I/O against the backing files failed.
    #[error("world state I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Another process holds the store.
    #[error("world state is locked: {0}")]
    Locked(String),
}

/// One key/value pair returned by a range scan.
pub type StateEntry = (String, Vec<u8>);

/// Key-value world state.
///
/// # Consistency
/// Each method is atomic on its own. Nothing spans two calls; callers that
/// read then write get no isolation from other writers in between.
pub trait WorldState: Send + Sync {
    /// Get the value stored under `key`, or `None` if absent.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Insert or overwrite `key`.
    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn del_state(&self, key: &str) -> Result<(), StorageError>;

    /// Scan `[start, end)` in ascending key order.
    ///
    /// An empty `start` or `end` leaves that side unbounded, so
    /// `get_state_by_range("", "")` returns the whole keyspace.
    fn get_state_by_range(&self, start: &str, end: &str) -> Result<Vec<StateEntry>, StorageError>;
}

/// Returns true if `key` falls inside the half-open range `[start, end)`,
/// treating empty bounds as open.
pub(crate) fn in_range(key: &str, start: &str, end: &str) -> bool {
    (start.is_empty() || key >= start) && (end.is_empty() || key < end)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure the trait is object-safe
    fn _assert_world_state_object_safe(_: &dyn WorldState) {}

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::Backend("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));

        let err = StorageError::Locked("held by pid 42".to_string());
        assert!(err.to_string().contains("locked"));
    }

    #[test]
    fn test_in_range_bounds() {
        assert!(in_range("b", "", ""));
        assert!(in_range("b", "a", "c"));
        assert!(in_range("a", "a", "c"));
        assert!(!in_range("c", "a", "c"));
        assert!(!in_range("0", "a", ""));
        assert!(in_range("zzz", "a", ""));
        assert!(!in_range("zzz", "", "m"));
    }
}
