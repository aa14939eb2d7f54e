use std::io;

use crate::map::AccessMode;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by buffer operations.
///
/// Every bounds check fails immediately; nothing is clamped, retried, or
/// partially applied. A failed bulk transfer leaves the backing bytes and
/// the cursor untouched.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Read past the readable limit of the buffer.")]
    BufferUnderflow,

    #[error("Write past the writable limit of the buffer.")]
    BufferOverflow,

    #[error("Index {index} with length {len} is outside the buffer limit {limit}.")]
    IndexOutOfRange {
        index: usize,
        len: usize,
        limit: usize,
    },

    #[error("Buffer is read-only.")]
    ReadOnlyBuffer,

    #[error("Operation is not supported for memory-mapped buffers.")]
    NotSupported,

    #[error("No mark is set to reset to.")]
    InvalidMark,

    #[error("Invalid argument: {0}.")]
    InvalidArgument(&'static str),

    #[error("Failed to flush mapped region to disk.")]
    Flush(#[source] io::Error),
}

/// Failures raised while mapping a view of a file.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("View length must not be zero.")]
    EmptyView,

    #[error("View length {0} exceeds the maximum addressable view size.")]
    ViewTooLarge(u64),

    #[error(
        "View at offset {offset} with length {len} extends past the end of the file ({file_len} bytes)."
    )]
    OutOfBounds {
        offset: u64,
        len: usize,
        file_len: u64,
    },

    #[error("Access mode {0:?} is not supported by this backing.")]
    UnsupportedMode(AccessMode),

    #[error("Could not query file metadata.")]
    Metadata(#[source] io::Error),

    #[error("Failed to map view of file.")]
    MapFailed(#[source] io::Error),
}
