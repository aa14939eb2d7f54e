//! The mapped region handle and the shared box around it.
//!
//! A [`RegionHandle`] owns one OS memory mapping and the raw pointer
//! acquired from it. The view's byte offset was applied by the mapping
//! call exactly once, so all indexing below this point is offset-free.
//! Every access here is unchecked: the cursor gates in the buffer layer
//! are the only bounds enforcement, and the `unsafe` markers record the
//! caller obligation.
//!
//! The pointer is released exactly once, when the handle drops. Views
//! share a handle through [`SharedRegion`], so the release runs only
//! after the last sibling view is gone.

use std::fmt;
use std::ops::Deref;
use std::ptr;
use std::sync::Arc;

use memmap2::{Mmap, MmapMut};

use crate::error::{Error, Result};

enum Backing {
    ReadOnly(Mmap),
    ReadWrite(MmapMut),
}

pub(crate) struct RegionHandle {
    ptr: *mut u8,
    len: usize,
    backing: Backing,
}

// The pointer is owned by the backing mapping, which lives exactly as
// long as the handle. Concurrent access through sibling views has the
// same unspecified visibility as any directly shared mapped memory.
unsafe impl Send for RegionHandle {}
unsafe impl Sync for RegionHandle {}

impl RegionHandle {
    pub(crate) fn from_map(map: Mmap) -> RegionHandle {
        let ptr = map.as_ptr() as *mut u8;
        let len = map.len();
        tracing::debug!(ptr = format_args!("{:p}", ptr), len, "acquired read-only region");
        RegionHandle {
            ptr,
            len,
            backing: Backing::ReadOnly(map),
        }
    }

    pub(crate) fn from_map_mut(map: MmapMut) -> RegionHandle {
        let ptr = map.as_ptr() as *mut u8;
        let len = map.len();
        tracing::debug!(ptr = format_args!("{:p}", ptr), len, "acquired writable region");
        RegionHandle {
            ptr,
            len,
            backing: Backing::ReadWrite(map),
        }
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// # Safety
    /// `index` must be within `[0, len)`.
    #[inline(always)]
    pub(crate) unsafe fn get_unchecked(&self, index: usize) -> u8 {
        *self.ptr.add(index)
    }

    /// # Safety
    /// `index` must be within `[0, len)`, and the backing must be writable.
    #[inline(always)]
    pub(crate) unsafe fn set_unchecked(&self, index: usize, value: u8) {
        *self.ptr.add(index) = value;
    }

    /// # Safety
    /// `offset + len` must not exceed the region length.
    #[inline(always)]
    pub(crate) unsafe fn slice_unchecked(&self, offset: usize, len: usize) -> &[u8] {
        std::slice::from_raw_parts(self.ptr.add(offset), len)
    }

    /// Bulk write as a single transfer.
    ///
    /// # Safety
    /// `offset + src.len()` must not exceed the region length, and the
    /// backing must be writable.
    #[inline(always)]
    pub(crate) unsafe fn copy_from_unchecked(&self, offset: usize, src: &[u8]) {
        ptr::copy_nonoverlapping(src.as_ptr(), self.ptr.add(offset), src.len());
    }

    /// Forces buffered writes in the mapping back to the file. A no-op
    /// for read-only backings.
    pub(crate) fn flush(&self) -> Result<()> {
        match &self.backing {
            Backing::ReadOnly(_) => Ok(()),
            Backing::ReadWrite(map) => {
                tracing::debug!(len = self.len, "flushing mapped region");
                map.flush().map_err(Error::Flush)
            }
        }
    }
}

impl Drop for RegionHandle {
    fn drop(&mut self) {
        // The mapping itself is unmapped by the backing's drop; after this
        // point the pointer is gone with it.
        tracing::debug!(ptr = format_args!("{:p}", self.ptr), len = self.len, "releasing mapped region");
    }
}

impl fmt::Debug for RegionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionHandle")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Reference-counted indirection so that every view derived from one
/// mapping observes the same handle identity, and the mapping is released
/// only when the last holder drops.
#[derive(Debug, Clone)]
pub(crate) struct SharedRegion(Arc<RegionHandle>);

impl SharedRegion {
    pub(crate) fn new(handle: RegionHandle) -> SharedRegion {
        SharedRegion(Arc::new(handle))
    }

    /// Number of live views holding this region.
    pub(crate) fn share_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl Deref for SharedRegion {
    type Target = RegionHandle;

    #[inline(always)]
    fn deref(&self) -> &RegionHandle {
        &self.0
    }
}
