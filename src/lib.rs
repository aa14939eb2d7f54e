//! Cursor-based view buffers over memory-mapped file regions.
//!
//! Use [MapOptions][MapOptions] to map a view of a file, and the returned
//! [ViewBuffer][ViewBuffer] to read and write typed values through it.

mod buffer;
mod cursor;
mod error;
mod map;
mod order;
mod region;

pub use buffer::{Access, ReadOnly, ReadWrite, ViewBuffer};
pub use error::{Error, MapError, Result};
pub use map::{AccessMode, MapOptions, MappedBuffer, MAX_VIEW_LEN};
pub use order::ByteOrder;
