//! Error types for checkpoint loading

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for checkpoint operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while mapping and reinterpreting a checkpoint
#[derive(Error, Debug)]
pub enum Error {
    /// Opening or memory-mapping the checkpoint file failed
    #[error("failed to map checkpoint {path:?}: {source}")]
    MapFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Payload byte length is not a whole number of f32 elements
    #[error("payload length {len} is not a multiple of 4 bytes")]
    MisalignedLength { len: usize },

    /// Payload does not start on a 4-byte boundary
    #[error("payload address {addr:#x} is not 4-byte aligned")]
    MisalignedAddress { addr: usize },

    /// Header skip distance lands past the end of the mapped file
    #[error("data offset {offset} exceeds file size {file_size}")]
    OffsetOutOfBounds { offset: u64, file_size: usize },

    /// Requested tensor view does not fit inside the payload
    #[error("tensor view [{start}, {start}+{len}) exceeds payload of {payload} elements")]
    ViewOutOfBounds {
        start: usize,
        len: usize,
        payload: usize,
    },
}
