//! Pager - low-level file I/O for fixed-size records.
//!
//! The [`Pager`] handles all direct file operations:
//! - Reading and writing records by slot index
//! - Extending the backing file as slots are written
//! - Detecting first use of a fresh file

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::{Error, PageId, Result};

/// Manages disk I/O for a single record file.
///
/// # File Layout
/// The file is a flat array of fixed-size records:
/// ```text
/// ┌──────────┬──────────┬──────────┬─────────┬──────────┐
/// │ Record 0 │ Record 1 │ Record 2 │  ...    │ Record N │
/// └──────────┴──────────┴──────────┴─────────┴──────────┘
/// Offset:   0         L         2L    ...        N×L
/// ```
///
/// Record N is located at file offset `N × record_len`. The record length is
/// fixed at open time; it is determined entirely by the tree's order
/// parameter and key type (see [`crate::common::config::record_len`]).
///
/// # Thread Safety
/// `Pager` is **single-threaded**. The owning node store serializes access.
///
/// # Durability
/// All writes are followed by `fsync()`. There is no write-ahead log: a
/// crash mid-operation can leave a partially rebalanced tree behind.
pub struct Pager {
    file: File,
    record_len: usize,
    /// Number of record slots in the file.
    record_count: u64,
    /// True exactly when this handle created (or truncated to) a fresh file.
    fresh: bool,
}

impl Pager {
    /// Create a new record file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P, record_len: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self {
            file,
            record_len,
            record_count: 0,
            fresh: true,
        })
    }

    /// Open an existing record file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, record_len: usize) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        // Calculate record count from file size
        let metadata = file.metadata()?;
        let file_size = metadata.len();
        let record_count = file_size / record_len as u64;

        Ok(Self {
            file,
            record_len,
            record_count,
            // A zero-length file carries no header yet and counts as fresh.
            fresh: record_count == 0,
        })
    }

    /// Open an existing record file, or create if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P, record_len: usize) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path, record_len)
        } else {
            Self::create(path, record_len)
        }
    }

    /// Open a record file, discarding any previous contents.
    pub fn open_truncated<P: AsRef<Path>>(path: P, record_len: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            file,
            record_len,
            record_count: 0,
            fresh: true,
        })
    }

    /// Whether this handle is backed by a fresh (never-written) file.
    ///
    /// True exactly once, at first use; the tree uses it to trigger initial
    /// root and header creation.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fresh && self.record_count == 0
    }

    /// Read a record from disk into a freshly allocated buffer.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the slot has never been written.
    pub fn read_record(&mut self, id: PageId) -> Result<Vec<u8>> {
        if id.0 >= self.record_count {
            return Err(Error::PageNotFound(id));
        }

        let offset = id.0 * self.record_len as u64;
        self.file.seek(SeekFrom::Start(offset))?;

        let mut buf = vec![0u8; self.record_len];
        self.file.read_exact(&mut buf)?;

        Ok(buf)
    }

    /// Write a record to disk, extending the file as needed.
    ///
    /// Slots between the current end of file and `id` become zero-filled
    /// holes; the monotonic allocator never produces them in practice.
    ///
    /// # Durability
    /// Calls `fsync()` after writing so the record is persisted.
    ///
    /// # Panics
    /// Panics if `data` is not exactly one record long; record sizing is a
    /// construction-time decision and a mismatch here is a codec bug.
    pub fn write_record(&mut self, id: PageId, data: &[u8]) -> Result<()> {
        assert_eq!(
            data.len(),
            self.record_len,
            "record must be exactly {} bytes",
            self.record_len
        );

        let offset = id.0 * self.record_len as u64;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)?;
        self.file.sync_all()?;

        if id.0 >= self.record_count {
            self.record_count = id.0 + 1;
        }
        Ok(())
    }

    /// Get the record length this pager was opened with.
    #[inline]
    pub fn record_len(&self) -> usize {
        self.record_len
    }

    /// Get the number of record slots in the file.
    #[inline]
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Get the total size of the backing file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        self.record_count * self.record_len as u64
    }
}
