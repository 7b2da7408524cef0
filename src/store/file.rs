//! Append-only durable byte store
//!
//! - One file, `<data_dir>/state/values.dat`, never updated in place
//! - Multiple records for the same key may exist; latest wins
//! - A batch is one append and (when enabled) one fsync
//! - Checksums verified for every record on open; corruption is fatal
//! - An incomplete trailing record (interrupted append) is cut off on open
//! - A failed append is rolled back; if the rollback fails too, the store
//!   refuses further writes until reopened
//!
//! The latest value of every key is held in memory, rebuilt by scanning the
//! file on open.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::errors::{StoreError, StoreResult};
use super::reader::RecordReader;
use super::record::KeyRecord;
use super::ByteStore;
use crate::observability::{Event, Logger};
use crate::state::Key;

/// Subdirectory of the data directory holding the store file.
pub const STORE_DIR: &str = "state";
/// Store file name.
pub const STORE_FILE: &str = "values.dat";

/// Result of a full verification scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Records in the file, including superseded ones
    pub records: u64,
    /// Distinct keys
    pub keys: u64,
    /// File size in bytes
    pub bytes: u64,
}

/// Points where tests force an I/O failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailPoint {
    /// Half of the batch reaches the file, then the write fails
    Append,
    /// Truncating back to the last good offset fails
    Rollback,
}

/// Everything a front-to-back scan learned about the file.
struct Scan {
    values: HashMap<Key, Vec<u8>>,
    records: u64,
    /// End of the last complete record
    end: u64,
    file_size: u64,
    /// Set when the file ends inside a record
    tail: Option<StoreError>,
}

fn scan(path: &Path) -> StoreResult<Scan> {
    let mut reader = RecordReader::open(path)?;
    let mut values = HashMap::new();
    let mut records = 0u64;

    let tail = loop {
        match reader.read_next() {
            Ok(Some(record)) => {
                values.insert(record.key, record.value);
                records += 1;
            }
            Ok(None) => break None,
            Err(err @ StoreError::TruncatedTail { .. }) => break Some(err),
            Err(err) => return Err(err),
        }
    };

    Ok(Scan {
        values,
        records,
        end: reader.current_offset(),
        file_size: reader.file_size(),
        tail,
    })
}

fn store_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_DIR).join(STORE_FILE)
}

/// Append-only file store.
pub struct FileStore {
    path: PathBuf,
    file: File,
    current_offset: u64,
    values: HashMap<Key, Vec<u8>>,
    record_count: u64,
    sync_writes: bool,
    logger: Logger,
    /// Why the store stopped accepting writes
    failed: Option<String>,
    #[cfg(test)]
    fail_points: Vec<FailPoint>,
}

impl FileStore {
    /// Opens or creates the store under `data_dir`, fsyncing every batch.
    pub fn open(data_dir: &Path) -> StoreResult<Self> {
        Self::open_with(data_dir, true, Logger::disabled())
    }

    /// Opens or creates the store under `data_dir`.
    ///
    /// Creates `<data_dir>/state/values.dat` and parent directories if
    /// needed, then scans every existing record. A trailing record cut
    /// short by an interrupted append is removed from the file.
    pub fn open_with(data_dir: &Path, sync_writes: bool, logger: Logger) -> StoreResult<Self> {
        let store_dir = data_dir.join(STORE_DIR);
        let path = store_path(data_dir);

        if !store_dir.exists() {
            fs::create_dir_all(&store_dir).map_err(|e| {
                StoreError::io(
                    format!("Failed to create store directory: {}", store_dir.display()),
                    e,
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                StoreError::io(format!("Failed to open store file: {}", path.display()), e)
            })?;

        let path_field = path.display().to_string();
        let scanned = match scan(&path) {
            Ok(scanned) => scanned,
            Err(err) => {
                if err.is_fatal() {
                    let error = err.to_string();
                    logger.fatal(
                        Event::StoreCorruption,
                        &[("path", path_field.as_str()), ("error", error.as_str())],
                    );
                }
                return Err(err);
            }
        };

        if let Some(tail) = &scanned.tail {
            file.set_len(scanned.end).map_err(|e| {
                StoreError::io(format!("Failed to truncate {}", path.display()), e)
            })?;
            if sync_writes {
                file.sync_all()
                    .map_err(|e| StoreError::io("Failed to sync truncated store", e))?;
            }

            let offset = scanned.end.to_string();
            let dropped = (scanned.file_size - scanned.end).to_string();
            let reason = tail.to_string();
            logger.warn(
                Event::StoreTailTruncated,
                &[
                    ("dropped_bytes", dropped.as_str()),
                    ("offset", offset.as_str()),
                    ("path", path_field.as_str()),
                    ("reason", reason.as_str()),
                ],
            );
        }

        let keys = scanned.values.len().to_string();
        let records = scanned.records.to_string();
        logger.info(
            Event::StoreOpen,
            &[
                ("keys", keys.as_str()),
                ("path", path_field.as_str()),
                ("records", records.as_str()),
            ],
        );

        Ok(Self {
            path,
            file,
            current_offset: scanned.end,
            values: scanned.values,
            record_count: scanned.records,
            sync_writes,
            logger,
            failed: None,
            #[cfg(test)]
            fail_points: Vec::new(),
        })
    }

    /// Verifies every record of the store under `data_dir` without opening
    /// it for writing. An incomplete trailing record is reported as
    /// `TruncatedTail`, not repaired.
    pub fn verify(data_dir: &Path) -> StoreResult<ScanReport> {
        let scanned = scan(&store_path(data_dir))?;
        if let Some(tail) = scanned.tail {
            return Err(tail);
        }

        Ok(ScanReport {
            records: scanned.records,
            keys: scanned.values.len() as u64,
            bytes: scanned.end,
        })
    }

    /// Latest value of every key, sorted by key, read without opening the
    /// file for writing.
    ///
    /// Matches what `open` would load: an incomplete trailing record is
    /// ignored, a corrupt one is an error.
    pub fn read_entries(data_dir: &Path) -> StoreResult<Vec<(Key, Vec<u8>)>> {
        let mut entries: Vec<_> = scan(&store_path(data_dir))?.values.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    /// Returns the path to the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current end-of-file offset.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Records in the file, including superseded ones.
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Distinct keys.
    pub fn key_count(&self) -> usize {
        self.values.len()
    }

    /// Returns true once a failed rollback has left the file untrusted.
    pub fn is_failed(&self) -> bool {
        self.failed.is_some()
    }

    #[cfg(test)]
    fn fail_at(&self, point: FailPoint) -> io::Result<()> {
        if self.fail_points.contains(&point) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("injected failure at {:?}", point),
            ));
        }
        Ok(())
    }

    #[cfg(not(test))]
    #[inline]
    fn fail_at(&self, _point: FailPoint) -> io::Result<()> {
        Ok(())
    }

    fn write_batch(&mut self, buffer: &[u8]) -> io::Result<()> {
        if let Err(e) = self.fail_at(FailPoint::Append) {
            self.file.write_all(&buffer[..buffer.len() / 2])?;
            return Err(e);
        }
        self.file.write_all(buffer)?;
        if self.sync_writes {
            self.file.sync_all()?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> io::Result<()> {
        self.fail_at(FailPoint::Rollback)?;
        self.file.set_len(self.current_offset)?;
        if self.sync_writes {
            self.file.sync_all()?;
        }
        Ok(())
    }

    fn append(&mut self, buffer: &[u8]) -> StoreResult<()> {
        let e = match self.write_batch(buffer) {
            Ok(()) => {
                self.current_offset += buffer.len() as u64;
                return Ok(());
            }
            Err(e) => e,
        };

        let error = e.to_string();
        let offset = self.current_offset.to_string();
        let path = self.path.display().to_string();
        match self.rollback() {
            Ok(()) => self.logger.error(
                Event::StoreWriteFailed,
                &[
                    ("error", error.as_str()),
                    ("offset", offset.as_str()),
                    ("path", path.as_str()),
                ],
            ),
            Err(rollback) => {
                let rollback_error = rollback.to_string();
                self.logger.fatal(
                    Event::StoreWriteFailed,
                    &[
                        ("error", error.as_str()),
                        ("offset", offset.as_str()),
                        ("path", path.as_str()),
                        ("rollback_error", rollback_error.as_str()),
                    ],
                );
                self.failed = Some(format!(
                    "rollback to offset {} failed: {}",
                    offset, rollback_error
                ));
            }
        }

        Err(StoreError::io(format!("Failed to append batch to {}", path), e))
    }
}

impl ByteStore for FileStore {
    fn multi_get(&mut self, keys: &[Key]) -> StoreResult<Vec<Option<Vec<u8>>>> {
        Ok(keys.iter().map(|key| self.values.get(key).cloned()).collect())
    }

    fn multi_put(&mut self, keys: &[Key], values: &[Vec<u8>]) -> StoreResult<()> {
        if let Some(reason) = &self.failed {
            return Err(StoreError::unavailable(format!(
                "{} refuses writes: {}",
                self.path.display(),
                reason
            )));
        }
        StoreError::check_batch(keys.len(), values.len())?;
        if keys.is_empty() {
            return Ok(());
        }

        let mut buffer = Vec::new();
        for (key, value) in keys.iter().zip(values) {
            KeyRecord::new(key.clone(), value.clone()).serialize_into(&mut buffer);
        }
        self.append(&buffer)?;

        // Latest record wins, including duplicates within this batch.
        for (key, value) in keys.iter().zip(values) {
            self.values.insert(key.clone(), value.clone());
        }
        self.record_count += keys.len() as u64;
        Ok(())
    }
}
