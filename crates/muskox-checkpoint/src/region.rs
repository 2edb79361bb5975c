//! Read-only memory-mapped file region

use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};

/// A page-backed, read-only view of a file's bytes.
///
/// The OS mapping is shared behind an `Arc` so that tensor views can hold
/// their own handle to it; the mapping is released exactly once, when the
/// last handle drops. The region is never exposed mutably.
#[derive(Debug, Clone)]
pub struct MappedRegion {
    mmap: Arc<Mmap>,
}

impl MappedRegion {
    /// Map the file at `path` read-only.
    ///
    /// The mapping does not read the file eagerly; pages fault in lazily on
    /// first access.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::MapFailed {
            path: path.to_path_buf(),
            source,
        })?;

        // Safety: the mapping is read-only and the file is opened read-only;
        // we rely on the caller not truncating the checkpoint while mapped.
        let mmap = unsafe {
            MmapOptions::new()
                .map(&file)
                .map_err(|source| Error::MapFailed {
                    path: path.to_path_buf(),
                    source,
                })?
        };

        debug!(path = %path.display(), bytes = mmap.len(), "mapped checkpoint file");

        Ok(Self {
            mmap: Arc::new(mmap),
        })
    }

    /// Total byte length of the mapped file.
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Whether the mapped file is empty.
    pub fn is_empty(&self) -> bool {
        self.mmap.len() == 0
    }

    /// The mapped bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// Number of live handles to the underlying mapping, counting this one.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.mmap)
    }
}
