//! Point-in-time snapshot of the whole keyspace.
//!
//! Compaction writes the current map here and then truncates the log, so the
//! snapshot plus the log always reproduce the latest state. A snapshot is
//! replaced atomically: written to a temporary file, synced, then renamed.
//!
//! # File Format
//! ```text
//! [MAGIC: 4 bytes][VERSION: 1 byte]
//! [codec frame of SnapshotMeta]
//! [codec frame of one key/value entry] x meta.entries
//! ```
//!
//! Each entry is its own frame, so the frame size limit bounds a single
//! value rather than the whole keyspace.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Result as IoResult, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::codec;

/// Snapshot file name inside the ledger directory.
pub const SNAPSHOT_FILE: &str = "ledger.snapshot";

/// Temporary file a new snapshot is written to before the rename.
pub const SNAPSHOT_TMP_FILE: &str = "ledger.snapshot.tmp";

/// Contents of a snapshot file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotData {
    /// When the snapshot was taken.
    pub created_at: Option<DateTime<Utc>>,
    /// Number of log entries folded into this snapshot since the previous one.
    pub folded_entries: u64,
    /// Every key and its raw value.
    pub entries: BTreeMap<String, Vec<u8>>,
}

/// First frame of a snapshot file.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotMeta {
    created_at: Option<DateTime<Utc>>,
    folded_entries: u64,
    entries: u64,
}

#[derive(Serialize)]
struct EntryRef<'a> {
    key: &'a str,
    value: &'a [u8],
}

#[derive(Deserialize)]
struct Entry {
    key: String,
    value: Vec<u8>,
}

/// Reads and replaces the snapshot in one ledger directory.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
    tmp_path: PathBuf,
}

impl SnapshotFile {
    /// Snapshot handle for `dir`. Nothing is read until [`SnapshotFile::load`].
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(SNAPSHOT_FILE),
            tmp_path: dir.join(SNAPSHOT_TMP_FILE),
        }
    }

    /// Path of the live snapshot.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, or an empty one if none has been written yet.
    ///
    /// A leftover temporary file from an interrupted compaction is removed;
    /// the log it was compacting from was never truncated.
    pub fn load(&self) -> IoResult<SnapshotData> {
        match fs::remove_file(&self.tmp_path) {
            Ok(()) => tracing::warn!(
                path = %self.tmp_path.display(),
                "removed incomplete snapshot from an interrupted compaction"
            ),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SnapshotData::default()),
            Err(e) => return Err(e),
        };
        let mut reader = BufReader::new(file);
        codec::read_header(&mut reader)?;

        let meta: SnapshotMeta = codec::decode(&mut reader)?;
        let mut entries = BTreeMap::new();
        for _ in 0..meta.entries {
            let entry: Entry = codec::decode(&mut reader)?;
            entries.insert(entry.key, entry.value);
        }

        Ok(SnapshotData {
            created_at: meta.created_at,
            folded_entries: meta.folded_entries,
            entries,
        })
    }

    /// Atomically replace the snapshot with `data`.
    ///
    /// Returns the size of the new snapshot in bytes.
    pub fn write(&self, data: &SnapshotData) -> IoResult<u64> {
        let meta = SnapshotMeta {
            created_at: data.created_at,
            folded_entries: data.folded_entries,
            entries: data.entries.len() as u64,
        };

        let mut written = codec::HEADER_LEN;
        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.tmp_path)?;
            let mut writer = BufWriter::new(file);
            codec::write_header(&mut writer)?;

            let frame = codec::encode(&meta)?;
            writer.write_all(&frame)?;
            written += frame.len() as u64;

            for (key, value) in &data.entries {
                let frame = codec::encode(&EntryRef { key, value })?;
                writer.write_all(&frame)?;
                written += frame.len() as u64;
            }

            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&self.tmp_path, &self.path)?;
        Ok(written)
    }
}
