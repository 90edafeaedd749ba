//! Persistent world-state backend.
//!
//! Durable, crash-safe storage for a single process:
//! - Write-ahead log for every mutation
//! - Snapshot file written by compaction
//! - Directory lock against concurrent opens
//! - CRC32 framed records for corruption detection
//!
//! # Layout
//!
//! ```text
//! <dir>/
//!   .lock             exclusive lock, held while open
//!   ledger.snapshot   full keyspace as of the last compaction
//!   ledger.wal        mutations since the last compaction
//! ```

mod codec;
mod file_lock;
mod snapshot;
mod store;
mod wal;

pub use file_lock::DirLock;
pub use snapshot::{SnapshotData, SnapshotFile, SNAPSHOT_FILE, SNAPSHOT_TMP_FILE};
pub use store::{CompactionResult, PersistentWorldState, WAL_FILE};
pub use wal::{WalEntry, WalEntryKind, WalReader, WalRecovery, WriteAheadLog};

use std::path::Path;

pub use crate::config::PersistentConfig;
use crate::error::LedgerResult;

/// Open or create a persistent ledger at `path`.
///
/// # Errors
/// - If the configuration is invalid
/// - If the directory cannot be created or read
/// - If another process holds the lock
/// - If the snapshot or a complete log entry is corrupt
///
/// # Example
/// ```rust,ignore
/// use std::sync::Arc;
/// use classledger::storage::open_world_state;
/// use classledger::AssignmentContract;
///
/// let state = open_world_state("./ledger", None)?;
/// let contract = AssignmentContract::new(Arc::new(state));
/// ```
pub fn open_world_state(
    path: impl AsRef<Path>,
    config: Option<PersistentConfig>,
) -> LedgerResult<PersistentWorldState> {
    let cfg = config.unwrap_or_default().validate()?;
    Ok(PersistentWorldState::open(path.as_ref(), cfg)?)
}
