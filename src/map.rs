//! The mapping factory: opens OS views over a file and wires them into
//! buffers.
//!
//! [`MapOptions`] follows the shape of `memmap2::MmapOptions`, which does
//! the actual mapping underneath: configure offset and length, then pick
//! the access-selected mapping call. The view's byte offset is applied by
//! the OS mapping exactly once; the returned buffer indexes from zero.

use std::fs::File;

use memmap2::MmapOptions;

use crate::buffer::{ReadOnly, ReadWrite, ViewBuffer};
use crate::error::MapError;
use crate::order::ByteOrder;
use crate::region::{RegionHandle, SharedRegion};

/// Largest mappable view in bytes. Views are indexed with 32-bit signed
/// arithmetic in the formats this crate serves, so the factory rejects
/// anything larger up front.
pub const MAX_VIEW_LEN: usize = i32::MAX as usize;

/// Access mode requested for a mapped view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    ReadWrite,
    Write,
    CopyOnWrite,
    ReadExecute,
    ReadWriteExecute,
}

/// A mapped view buffer of either capability, as selected by
/// [`AccessMode`].
#[derive(Debug)]
pub enum MappedBuffer {
    ReadOnly(ViewBuffer<ReadOnly>),
    ReadWrite(ViewBuffer<ReadWrite>),
}

/// Builder for mapping a view of a file.
///
/// New buffers start in big-endian order; change it afterwards with
/// [`set_order`](ViewBuffer::set_order).
#[derive(Debug, Clone, Default)]
pub struct MapOptions {
    offset: u64,
    len: Option<usize>,
}

impl MapOptions {
    pub fn new() -> MapOptions {
        MapOptions::default()
    }

    /// Byte offset of the view within the file. Defaults to 0.
    pub fn offset(mut self, offset: u64) -> MapOptions {
        self.offset = offset;
        self
    }

    /// Length of the view in bytes. Defaults to the rest of the file past
    /// the offset.
    pub fn len(mut self, len: usize) -> MapOptions {
        self.len = Some(len);
        self
    }

    fn resolved_len(&self, file: &File) -> Result<usize, MapError> {
        let file_len = file.metadata().map_err(MapError::Metadata)?.len();

        if self.offset > file_len {
            return Err(MapError::OutOfBounds {
                offset: self.offset,
                len: self.len.unwrap_or(0),
                file_len,
            });
        }

        let len = match self.len {
            Some(len) => len,
            None => {
                let rest = file_len - self.offset;
                if rest > MAX_VIEW_LEN as u64 {
                    return Err(MapError::ViewTooLarge(rest));
                }
                rest as usize
            }
        };

        if len == 0 {
            return Err(MapError::EmptyView);
        }
        if len > MAX_VIEW_LEN {
            return Err(MapError::ViewTooLarge(len as u64));
        }
        if len as u64 > file_len - self.offset {
            return Err(MapError::OutOfBounds {
                offset: self.offset,
                len,
                file_len,
            });
        }

        Ok(len)
    }

    /// Maps a read-only view ([`AccessMode::Read`]).
    ///
    /// # Safety
    /// The underlying file must not be truncated or otherwise resized
    /// while the mapping is alive.
    pub unsafe fn map(&self, file: &File) -> Result<ViewBuffer<ReadOnly>, MapError> {
        let len = self.resolved_len(file)?;
        let map = MmapOptions::new()
            .offset(self.offset)
            .len(len)
            .map(file)
            .map_err(MapError::MapFailed)?;
        tracing::debug!(
            offset = format_args!("{:#x}", self.offset),
            len,
            "mapped read-only view"
        );
        Ok(self.buffer(RegionHandle::from_map(map), len))
    }

    /// Maps a read-write view backed by the file
    /// ([`AccessMode::ReadWrite`] and [`AccessMode::Write`]).
    ///
    /// # Safety
    /// As for [`map`](MapOptions::map); additionally no other mapping of
    /// the same range may assume the content stays unchanged.
    pub unsafe fn map_mut(&self, file: &File) -> Result<ViewBuffer<ReadWrite>, MapError> {
        let len = self.resolved_len(file)?;
        let map = MmapOptions::new()
            .offset(self.offset)
            .len(len)
            .map_mut(file)
            .map_err(MapError::MapFailed)?;
        tracing::debug!(
            offset = format_args!("{:#x}", self.offset),
            len,
            "mapped read-write view"
        );
        Ok(self.buffer(RegionHandle::from_map_mut(map), len))
    }

    /// Maps a copy-on-write view ([`AccessMode::CopyOnWrite`]): writable
    /// through the buffer, never written back to the file.
    ///
    /// # Safety
    /// As for [`map`](MapOptions::map).
    pub unsafe fn map_copy(&self, file: &File) -> Result<ViewBuffer<ReadWrite>, MapError> {
        let len = self.resolved_len(file)?;
        let map = MmapOptions::new()
            .offset(self.offset)
            .len(len)
            .map_copy(file)
            .map_err(MapError::MapFailed)?;
        tracing::debug!(
            offset = format_args!("{:#x}", self.offset),
            len,
            "mapped copy-on-write view"
        );
        Ok(self.buffer(RegionHandle::from_map_mut(map), len))
    }

    /// Maps a read-execute view ([`AccessMode::ReadExecute`]). The buffer
    /// surface is the read-only one; executing the content is outside
    /// this crate.
    ///
    /// # Safety
    /// As for [`map`](MapOptions::map).
    pub unsafe fn map_exec(&self, file: &File) -> Result<ViewBuffer<ReadOnly>, MapError> {
        let len = self.resolved_len(file)?;
        let map = MmapOptions::new()
            .offset(self.offset)
            .len(len)
            .map_exec(file)
            .map_err(MapError::MapFailed)?;
        tracing::debug!(
            offset = format_args!("{:#x}", self.offset),
            len,
            "mapped read-execute view"
        );
        Ok(self.buffer(RegionHandle::from_map(map), len))
    }

    /// Maps a view with the capability variant selected by `mode`.
    ///
    /// # Safety
    /// As for [`map`](MapOptions::map).
    pub unsafe fn map_mode(&self, mode: AccessMode, file: &File) -> Result<MappedBuffer, MapError> {
        match mode {
            AccessMode::Read => self.map(file).map(MappedBuffer::ReadOnly),
            AccessMode::ReadExecute => self.map_exec(file).map(MappedBuffer::ReadOnly),
            AccessMode::ReadWrite | AccessMode::Write => {
                self.map_mut(file).map(MappedBuffer::ReadWrite)
            }
            AccessMode::CopyOnWrite => self.map_copy(file).map(MappedBuffer::ReadWrite),
            // The backing has no writable-executable mapping call.
            AccessMode::ReadWriteExecute => Err(MapError::UnsupportedMode(mode)),
        }
    }

    fn buffer<A: crate::buffer::Access>(&self, handle: RegionHandle, len: usize) -> ViewBuffer<A> {
        ViewBuffer::new(SharedRegion::new(handle), 0, len, ByteOrder::BigEndian)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn file_with(dir: &tempfile::TempDir, bytes: &[u8]) -> File {
        let path = dir.path().join("view.bin");
        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn test_len_defaults_to_rest_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = file_with(&dir, &[0u8; 32]);
        let buf = unsafe { MapOptions::new().offset(8).map(&file) }.unwrap();
        assert_eq!(buf.capacity(), 24);
    }

    #[test]
    fn test_rejects_empty_view() {
        let dir = tempfile::tempdir().unwrap();
        let file = file_with(&dir, &[0u8; 8]);
        assert!(matches!(
            unsafe { MapOptions::new().offset(8).map(&file) },
            Err(MapError::EmptyView)
        ));
        assert!(matches!(
            unsafe { MapOptions::new().len(0).map(&file) },
            Err(MapError::EmptyView)
        ));
    }

    #[test]
    fn test_rejects_view_past_end_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = file_with(&dir, &[0u8; 8]);
        assert!(matches!(
            unsafe { MapOptions::new().offset(4).len(8).map(&file) },
            Err(MapError::OutOfBounds {
                offset: 4,
                len: 8,
                file_len: 8
            })
        ));
        assert!(matches!(
            unsafe { MapOptions::new().offset(16).map(&file) },
            Err(MapError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_rejects_oversized_view() {
        let dir = tempfile::tempdir().unwrap();
        let file = file_with(&dir, &[0u8; 8]);
        assert!(matches!(
            unsafe { MapOptions::new().len(MAX_VIEW_LEN + 1).map(&file) },
            Err(MapError::ViewTooLarge(_))
        ));
    }

    #[test]
    fn test_mode_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let file = file_with(&dir, &[0u8; 8]);
        assert!(matches!(
            unsafe { MapOptions::new().map_mode(AccessMode::Read, &file) },
            Ok(MappedBuffer::ReadOnly(_))
        ));
        assert!(matches!(
            unsafe { MapOptions::new().map_mode(AccessMode::ReadWrite, &file) },
            Ok(MappedBuffer::ReadWrite(_))
        ));
        assert!(matches!(
            unsafe { MapOptions::new().map_mode(AccessMode::CopyOnWrite, &file) },
            Ok(MappedBuffer::ReadWrite(_))
        ));
        assert!(matches!(
            unsafe { MapOptions::new().map_mode(AccessMode::ReadWriteExecute, &file) },
            Err(MapError::UnsupportedMode(AccessMode::ReadWriteExecute))
        ));
    }
}
