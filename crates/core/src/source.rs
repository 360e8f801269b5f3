// Read-only byte source backing both the image and hex views.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use serde::Serialize;

use crate::error::{CoreError, Result};

/// Files at or above this size are memory-mapped instead of read into memory.
pub const MMAP_THRESHOLD: u64 = 100 * 1024 * 1024; // 100MB

/// Storage behind a [`ByteSource`].
#[derive(Debug)]
enum Contents {
    InMemory(Vec<u8>),
    Mapped(Mmap),
}

/// Metadata about the opened file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub path: Option<PathBuf>,
    pub file_name: Option<String>,
    pub file_size: usize,
    pub memory_mapped: bool,
}

/// Immutable view over the bytes of one opened file.
///
/// Safe to share between threads; nothing mutates it after construction.
#[derive(Debug)]
pub struct ByteSource {
    contents: Contents,
    path: Option<PathBuf>,
}

impl ByteSource {
    /// Open `path`, memory-mapping it when it is at least [`MMAP_THRESHOLD`] bytes.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_threshold(path, MMAP_THRESHOLD)
    }

    /// Open `path` using a caller-chosen mapping threshold.
    pub fn open_with_threshold(path: &Path, threshold: u64) -> Result<Self> {
        let file = File::open(path)?;
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Err(CoreError::Io(std::io::Error::other(format!(
                "not a regular file: {}",
                path.display()
            ))));
        }
        if metadata.len() == 0 {
            return Err(CoreError::EmptyFile);
        }
        let contents = if metadata.len() >= threshold {
            // Safety: the mapping is read-only and the file is not mutated
            // by this process while the mapping is alive.
            let mmap = unsafe { Mmap::map(&file)? };
            Contents::Mapped(mmap)
        } else {
            let mut buf = Vec::with_capacity(metadata.len() as usize);
            let mut file = file;
            file.read_to_end(&mut buf)?;
            Contents::InMemory(buf)
        };
        tracing::info!(
            path = %path.display(),
            size = metadata.len(),
            mapped = matches!(contents, Contents::Mapped(_)),
            "opened byte source"
        );
        Ok(Self {
            contents,
            path: Some(path.to_path_buf()),
        })
    }

    /// Wrap an in-memory buffer.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            contents: Contents::InMemory(bytes),
            path: None,
        }
    }

    fn data(&self) -> &[u8] {
        match &self.contents {
            Contents::InMemory(v) => v,
            Contents::Mapped(m) => &m[..],
        }
    }

    /// Total length in bytes.
    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    pub fn is_memory_mapped(&self) -> bool {
        matches!(self.contents, Contents::Mapped(_))
    }

    /// Borrow `length` bytes starting at `offset`.
    pub fn read(&self, offset: usize, length: usize) -> Result<&[u8]> {
        let total = self.len();
        match offset.checked_add(length) {
            Some(end) if end <= total => Ok(&self.data()[offset..end]),
            _ => Err(CoreError::OutOfRange(format!(
                "read of {length} bytes at offset {offset} exceeds length {total}"
            ))),
        }
    }

    /// Borrow the whole buffer.
    pub fn as_bytes(&self) -> &[u8] {
        self.data()
    }

    pub fn file_info(&self) -> FileInfo {
        FileInfo {
            path: self.path.clone(),
            file_name: self
                .path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned()),
            file_size: self.len(),
            memory_mapped: self.is_memory_mapped(),
        }
    }
}
