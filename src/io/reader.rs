//! File reading utilities with memory mapping support.
//!
//! Used by `crate::descriptor` to read full file content (small/medium
//! files) or a memory-mapped view (large files) while building a
//! [`crate::ContextDescriptor`].

// Memory mapping requires unsafe but is well-documented and safe for read-only access
#![allow(unsafe_code)]

use crate::error::Error;
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Threshold above which [`FileReader`] prefers memory mapping over a
/// direct read (1 MiB).
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// File reader with support for memory mapping.
///
/// Automatically chooses the best reading strategy based on file size:
/// small files are read directly into memory; larger files are
/// memory-mapped.
pub struct FileReader {
    file: File,
    size: u64,
    path: PathBuf,
}

impl FileReader {
    /// Opens a file for reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputUnreadable`] if the file doesn't exist, is a
    /// directory, or can't be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path_ref = path.as_ref();
        let unreadable = |reason: String| Error::InputUnreadable {
            path: Some(path_ref.to_path_buf()),
            reason,
        };

        if !path_ref.exists() {
            return Err(unreadable("no such file or directory".to_string()));
        }
        if path_ref.is_dir() {
            return Err(unreadable("path is a directory".to_string()));
        }

        let file = File::open(path_ref).map_err(|e| unreadable(e.to_string()))?;
        let metadata = file.metadata().map_err(|e| unreadable(e.to_string()))?;

        Ok(Self {
            file,
            size: metadata.len(),
            path: path_ref.to_path_buf(),
        })
    }

    /// Returns the file size in bytes, from the stat call made at open
    /// time.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Returns the path this reader was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the full file content as bytes, choosing between a direct
    /// read and a memory-mapped read based on [`MMAP_THRESHOLD`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputUnreadable`] if reading fails.
    pub fn read_to_bytes(&self) -> Result<Vec<u8>, Error> {
        if self.size >= MMAP_THRESHOLD {
            self.read_mmap_bytes()
        } else {
            self.read_direct_bytes()
        }
    }

    /// Reads only the leading `len` bytes, for bounded-prefix sniffing.
    /// Used by the descriptor builder's `dataKind`/structure sniffing and
    /// its sampled-prefix token estimate above the 16 MiB threshold.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputUnreadable`] if reading fails.
    pub fn read_prefix(&self, len: usize) -> Result<Vec<u8>, Error> {
        let unreadable = |reason: String| Error::InputUnreadable {
            path: Some(self.path.clone()),
            reason,
        };
        let mut file = &self.file;
        let cap = (self.size as usize).min(len);
        let mut buffer = vec![0u8; cap];
        let mut read = 0;
        while read < cap {
            let n = file
                .read(&mut buffer[read..])
                .map_err(|e| unreadable(e.to_string()))?;
            if n == 0 {
                buffer.truncate(read);
                break;
            }
            read += n;
        }
        Ok(buffer)
    }

    fn read_mmap_bytes(&self) -> Result<Vec<u8>, Error> {
        if self.size == 0 {
            return Ok(Vec::new());
        }
        // Safety: read-only mapping of a file we just opened for reading.
        let mmap = unsafe {
            Mmap::map(&self.file).map_err(|e| Error::InputUnreadable {
                path: Some(self.path.clone()),
                reason: format!("mmap failed: {e}"),
            })?
        };
        Ok(mmap.to_vec())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn read_direct_bytes(&self) -> Result<Vec<u8>, Error> {
        let unreadable = |reason: String| Error::InputUnreadable {
            path: Some(self.path.clone()),
            reason,
        };
        let mut file = &self.file;
        let mut buffer = Vec::with_capacity(self.size as usize);
        file.read_to_end(&mut buffer)
            .map_err(|e| unreadable(e.to_string()))?;
        Ok(buffer)
    }
}
