//! Durable [`WorldState`] backed by a snapshot plus a write-ahead log.
//!
//! The whole keyspace lives in memory for reads and scans. Writes go to the
//! log first and are applied to the map only once the log append succeeded,
//! so a failed write leaves both unchanged.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::storage::traits::{in_range, StateEntry, StorageError, WorldState};

use super::file_lock::DirLock;
use super::snapshot::{SnapshotData, SnapshotFile};
use super::wal::{WalEntryKind, WriteAheadLog};
use super::PersistentConfig;

/// Log file name inside the ledger directory.
pub const WAL_FILE: &str = "ledger.wal";

fn lock_err(context: &'static str) -> StorageError {
    StorageError::Backend(format!("poisoned lock: {context}"))
}

/// Result of a compaction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactionResult {
    /// Log entries folded into the snapshot.
    pub entries_compacted: u64,
    /// Keys in the new snapshot.
    pub keys: usize,
    /// Log size before truncation.
    pub wal_size_before: u64,
    /// Log size after truncation.
    pub wal_size_after: u64,
}

/// Persistent world state rooted at one directory.
pub struct PersistentWorldState {
    dir: PathBuf,
    _lock: DirLock,
    wal: WriteAheadLog,
    snapshot: SnapshotFile,
    state: RwLock<BTreeMap<String, Vec<u8>>>,
    config: PersistentConfig,
}

impl std::fmt::Debug for PersistentWorldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentWorldState")
            .field("dir", &self.dir)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PersistentWorldState {
    /// Open or create a ledger directory.
    ///
    /// # Errors
    /// - `Locked` if another process has the directory open
    /// - `Io` if the directory, snapshot or log cannot be read
    pub fn open(dir: &Path, config: PersistentConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(dir)?;

        let lock = DirLock::acquire(dir).map_err(|e| {
            if e.kind() == ErrorKind::WouldBlock {
                StorageError::Locked(format!("{}: {e}", dir.display()))
            } else {
                StorageError::Io(e)
            }
        })?;

        let snapshot = SnapshotFile::new(dir);
        let mut map = snapshot.load()?.entries;
        let snapshot_keys = map.len();

        let (wal, recovery) = WriteAheadLog::open(&dir.join(WAL_FILE), config.sync_on_write)?;
        if recovery.truncated_bytes > 0 {
            tracing::warn!(
                dir = %dir.display(),
                truncated_bytes = recovery.truncated_bytes,
                "discarded torn entry at the end of the write-ahead log"
            );
        }

        let mut replayed = 0u64;
        for entry in wal.iter()? {
            match entry?.kind {
                WalEntryKind::Put { key, value } => {
                    map.insert(key, value);
                }
                WalEntryKind::Delete { key } => {
                    map.remove(&key);
                }
            }
            replayed += 1;
        }

        tracing::info!(
            dir = %dir.display(),
            snapshot_keys,
            replayed,
            keys = map.len(),
            "opened persistent world state"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            _lock: lock,
            wal,
            snapshot,
            state: RwLock::new(map),
            config,
        })
    }

    /// The ledger directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.read("state.len")?.len())
    }

    /// Returns true if no keys are stored.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    fn read(&self, context: &'static str) -> Result<RwLockReadGuard<'_, BTreeMap<String, Vec<u8>>>, StorageError> {
        self.state.read().map_err(|_| lock_err(context))
    }

    fn write(&self, context: &'static str) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Vec<u8>>>, StorageError> {
        self.state.write().map_err(|_| lock_err(context))
    }

    /// Fold the log into a fresh snapshot and truncate the log.
    ///
    /// Writers are blocked for the duration. If this fails part way the old
    /// snapshot and the full log are still on disk and will be replayed.
    pub fn compact(&self) -> Result<CompactionResult, StorageError> {
        let state = self.write("state.compact")?;
        self.compact_locked(&state)
    }

    fn compact_locked(
        &self,
        state: &BTreeMap<String, Vec<u8>>,
    ) -> Result<CompactionResult, StorageError> {
        let entries_compacted = self.wal.current_sequence()?;
        let wal_size_before = self.wal.size_bytes()?;

        let data = SnapshotData {
            created_at: Some(Utc::now()),
            folded_entries: entries_compacted,
            entries: state.clone(),
        };
        let snapshot_bytes = self.snapshot.write(&data)?;
        self.wal.truncate()?;
        let wal_size_after = self.wal.size_bytes()?;

        tracing::info!(
            dir = %self.dir.display(),
            entries_compacted,
            keys = state.len(),
            snapshot_bytes,
            wal_size_before,
            "compacted write-ahead log"
        );

        Ok(CompactionResult {
            entries_compacted,
            keys: state.len(),
            wal_size_before,
            wal_size_after,
        })
    }

    fn append_and_apply(
        &self,
        kind: WalEntryKind,
        context: &'static str,
    ) -> Result<(), StorageError> {
        // Holding the map lock across the append keeps log order equal to
        // apply order.
        let mut state = self.write(context)?;
        self.wal.append(kind.clone())?;
        match kind {
            WalEntryKind::Put { key, value } => {
                state.insert(key, value);
            }
            WalEntryKind::Delete { key } => {
                state.remove(&key);
            }
        }

        // The write is durable and applied from here on; a failed
        // compaction only leaves a longer log and is retried on a later write.
        match self.wal.size_bytes() {
            Ok(size) if size > self.config.max_wal_size => {
                if let Err(e) = self.compact_locked(&state) {
                    tracing::warn!(
                        dir = %self.dir.display(),
                        wal_size = size,
                        error = %e,
                        "auto-compaction failed; log kept for replay"
                    );
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "could not stat write-ahead log");
            }
        }
        Ok(())
    }
}

impl WorldState for PersistentWorldState {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.read("state.get")?.get(key).cloned())
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.append_and_apply(
            WalEntryKind::Put {
                key: key.to_string(),
                value,
            },
            "state.put",
        )
    }

    fn del_state(&self, key: &str) -> Result<(), StorageError> {
        self.append_and_apply(
            WalEntryKind::Delete {
                key: key.to_string(),
            },
            "state.del",
        )
    }

    fn get_state_by_range(&self, start: &str, end: &str) -> Result<Vec<StateEntry>, StorageError> {
        let state = self.read("state.range")?;
        let lower = if start.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(start)
        };
        Ok(state
            .range::<str, _>((lower, Bound::Unbounded))
            .take_while(|(k, _)| in_range(k, start, end))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
