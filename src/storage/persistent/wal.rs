//! Write-ahead log for the persistent world state.
//!
//! Every mutation is appended here (and optionally fsynced) before it is
//! applied to the in-memory map. On open the log is replayed on top of the
//! latest snapshot.
//!
//! # File Format
//! ```text
//! [MAGIC: 4 bytes][VERSION: 1 byte]
//! [ENTRY 1: codec frame of WalEntry]
//! [ENTRY 2: codec frame of WalEntry]
//! ...
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Error as IoError, ErrorKind, Result as IoResult, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::codec;

/// A single entry in the write-ahead log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry {
    /// Monotonically increasing sequence number, reset by truncation.
    pub sequence: u64,
    /// When this entry was written.
    pub timestamp: DateTime<Utc>,
    /// The mutation being logged.
    pub kind: WalEntryKind,
}

/// The mutation recorded by a [`WalEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WalEntryKind {
    /// Insert or overwrite a key.
    Put {
        /// Key written.
        key: String,
        /// Raw value stored under `key`.
        value: Vec<u8>,
    },
    /// Remove a key.
    Delete {
        /// Key removed.
        key: String,
    },
}

fn poisoned(context: &'static str) -> IoError {
    IoError::other(format!("poisoned lock: {context}"))
}

struct WalWriter {
    file: BufWriter<File>,
    sequence: u64,
}

/// Append-only mutation log.
///
/// Thread-safe via an internal mutex; appends are serialized.
pub struct WriteAheadLog {
    path: PathBuf,
    writer: Mutex<WalWriter>,
    sync_on_write: bool,
}

/// Outcome of scanning an existing log on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalRecovery {
    /// Entries that decoded cleanly.
    pub valid_entries: u64,
    /// Bytes dropped from a torn final frame.
    pub truncated_bytes: u64,
}

impl WriteAheadLog {
    /// Open or create a log file.
    ///
    /// A torn final frame (a crash mid-append) is cut off so that new
    /// appends follow the last complete entry. A frame that is complete but
    /// fails its checksum is an error: that is corruption, not a crash.
    pub fn open(path: &Path, sync_on_write: bool) -> IoResult<(Self, WalRecovery)> {
        let is_new = !path.exists() || std::fs::metadata(path)?.len() < codec::HEADER_LEN;

        let mut recovery = WalRecovery::default();
        let mut last_sequence = 0;

        if is_new {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?;
            codec::write_header(&mut file)?;
            if sync_on_write {
                file.sync_all()?;
            }
        } else {
            let mut reader = WalReader::open(path)?;
            for entry in reader.by_ref() {
                let entry = entry?;
                last_sequence = entry.sequence;
                recovery.valid_entries += 1;
            }

            let file_len = std::fs::metadata(path)?.len();
            let valid_len = reader.valid_len();
            if valid_len < file_len {
                let file = OpenOptions::new().write(true).open(path)?;
                file.set_len(valid_len)?;
                file.sync_all()?;
                recovery.truncated_bytes = file_len - valid_len;
            }
        }

        let file = OpenOptions::new().append(true).open(path)?;
        let wal = Self {
            path: path.to_path_buf(),
            writer: Mutex::new(WalWriter {
                file: BufWriter::new(file),
                sequence: last_sequence,
            }),
            sync_on_write,
        };
        Ok((wal, recovery))
    }

    fn lock(&self, context: &'static str) -> IoResult<MutexGuard<'_, WalWriter>> {
        self.writer.lock().map_err(|_| poisoned(context))
    }

    /// Append an entry, returning its sequence number.
    ///
    /// The sequence only advances once the frame has been flushed (and
    /// synced, if configured).
    pub fn append(&self, kind: WalEntryKind) -> IoResult<u64> {
        let mut writer = self.lock("wal.append")?;

        let sequence = writer.sequence + 1;
        let entry = WalEntry {
            sequence,
            timestamp: Utc::now(),
            kind,
        };
        let frame = codec::encode(&entry)?;

        writer.file.write_all(&frame)?;
        writer.file.flush()?;
        if self.sync_on_write {
            writer.file.get_ref().sync_all()?;
        }

        writer.sequence = sequence;
        Ok(sequence)
    }

    /// Iterate over all entries currently in the log.
    pub fn iter(&self) -> IoResult<WalReader> {
        WalReader::open(&self.path)
    }

    /// Sequence number of the last appended entry.
    pub fn current_sequence(&self) -> IoResult<u64> {
        Ok(self.lock("wal.sequence")?.sequence)
    }

    /// Size of the log file in bytes.
    pub fn size_bytes(&self) -> IoResult<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    /// Discard every entry, leaving only the header.
    ///
    /// Only call this once a snapshot containing all logged state is durable.
    pub fn truncate(&self) -> IoResult<()> {
        let mut writer = self.lock("wal.truncate")?;
        writer.file.flush()?;

        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        codec::write_header(&mut file)?;
        if self.sync_on_write {
            file.sync_all()?;
        }

        let file = OpenOptions::new().append(true).open(&self.path)?;
        writer.file = BufWriter::new(file);
        writer.sequence = 0;
        Ok(())
    }
}

/// Sequential reader over log entries.
///
/// Stops cleanly at a torn final frame; [`WalReader::valid_len`] then reports
/// where the last complete frame ended.
pub struct WalReader {
    reader: BufReader<File>,
    valid_len: u64,
    file_len: u64,
    done: bool,
}

impl WalReader {
    fn open(path: &Path) -> IoResult<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        codec::read_header(&mut reader)?;
        Ok(Self {
            reader,
            valid_len: codec::HEADER_LEN,
            file_len,
            done: false,
        })
    }

    /// Byte offset just past the last complete entry read so far.
    #[must_use]
    pub fn valid_len(&self) -> u64 {
        self.valid_len
    }
}

impl Iterator for WalReader {
    type Item = IoResult<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.valid_len >= self.file_len {
            return None;
        }

        match codec::decode_frame::<WalEntry>(&mut self.reader) {
            Ok((entry, frame_len)) => {
                self.valid_len += frame_len;
                Some(Ok(entry))
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
