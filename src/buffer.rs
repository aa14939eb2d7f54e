//! Cursor-bearing buffer views over a shared mapped region.
//!
//! A [`ViewBuffer`] composes a cursor, a byte-order flag and a shared
//! region handle into the typed get/put surface. The read-only /
//! read-write split is carried in the type: [`ReadOnly`] and
//! [`ReadWrite`] are uninhabited markers, and the sealed [`Access`]
//! trait selects the write gate at compile time. A mutating call on a
//! read-only view fails with [`Error::ReadOnlyBuffer`] before touching
//! any byte; there is no runtime capability flag.

use std::fmt;
use std::marker::PhantomData;

use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::order::{self, ByteOrder};
use crate::region::SharedRegion;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::ReadOnly {}
    impl Sealed for super::ReadWrite {}
}

/// Capability marker for buffer views.
///
/// Sealed; the only implementors are [`ReadOnly`] and [`ReadWrite`].
pub trait Access: sealed::Sealed + 'static {
    #[doc(hidden)]
    fn ensure_writable() -> Result<()>;
}

/// Marker for views that reject every mutating operation.
pub enum ReadOnly {}

/// Marker for views that accept both reads and writes.
pub enum ReadWrite {}

impl Access for ReadOnly {
    #[inline(always)]
    fn ensure_writable() -> Result<()> {
        Err(Error::ReadOnlyBuffer)
    }
}

impl Access for ReadWrite {
    #[inline(always)]
    fn ensure_writable() -> Result<()> {
        Ok(())
    }
}

/// A cursor-bearing window over a memory-mapped byte region.
///
/// Views derived with [`slice`](ViewBuffer::slice) and
/// [`duplicate`](ViewBuffer::duplicate) alias the same mapping under
/// independent cursors; the mapping is released when the last view over
/// it is dropped. A single view is not internally synchronized; every
/// cursor-advancing operation takes `&mut self`, so the borrow checker
/// rules out unsynchronized sharing of one view across threads.
pub struct ViewBuffer<A: Access> {
    region: SharedRegion,
    cursor: Cursor,
    /// This view's zero point within the shared region.
    offset: usize,
    order: ByteOrder,
    _access: PhantomData<A>,
}

impl<A: Access> ViewBuffer<A> {
    pub(crate) fn new(region: SharedRegion, offset: usize, len: usize, order: ByteOrder) -> ViewBuffer<A> {
        debug_assert!(offset + len <= region.len());
        ViewBuffer {
            region,
            cursor: Cursor::new(len),
            offset,
            order,
            _access: PhantomData,
        }
    }

    /// Borrows the span `[index, index + len)` of this view's window.
    /// Bounds were established by the cursor gates.
    #[inline(always)]
    fn span(&self, index: usize, len: usize) -> &[u8] {
        unsafe { self.region.slice_unchecked(self.offset + index, len) }
    }

    #[inline(always)]
    fn write_span(&mut self, index: usize, src: &[u8]) {
        unsafe { self.region.copy_from_unchecked(self.offset + index, src) }
    }

    // ========================================================================
    // CURSOR SURFACE
    // ========================================================================

    /// The fixed size of this view in bytes.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.cursor.capacity()
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    /// Moves the read/write position. Fails if `position` exceeds the limit.
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        self.cursor.set_position(position)
    }

    #[inline(always)]
    pub fn limit(&self) -> usize {
        self.cursor.limit()
    }

    /// Moves the limit. Fails if `limit` exceeds the capacity.
    pub fn set_limit(&mut self, limit: usize) -> Result<()> {
        self.cursor.set_limit(limit)
    }

    /// Bytes left between position and limit.
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    #[inline(always)]
    pub fn has_remaining(&self) -> bool {
        self.cursor.has_remaining()
    }

    /// Saves the current position for a later [`reset`](ViewBuffer::reset).
    pub fn mark(&mut self) {
        self.cursor.mark()
    }

    /// Restores the marked position. Fails with [`Error::InvalidMark`] if
    /// no mark is set.
    pub fn reset(&mut self) -> Result<()> {
        self.cursor.reset()
    }

    /// Position 0, limit at capacity, mark discarded. The content is
    /// untouched.
    pub fn clear(&mut self) {
        self.cursor.clear()
    }

    /// Limit at the current position, position 0, mark discarded.
    pub fn flip(&mut self) {
        self.cursor.flip()
    }

    /// Position 0, mark discarded, limit kept.
    pub fn rewind(&mut self) {
        self.cursor.rewind()
    }

    /// The byte order consulted by every multi-byte accessor.
    #[inline(always)]
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Changes the byte order for all subsequent decodes; past decodes are
    /// unaffected.
    pub fn set_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    /// Number of live views sharing this mapping, this one included.
    pub fn share_count(&self) -> usize {
        self.region.share_count()
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Reads the byte at the current position and advances by one.
    #[inline]
    pub fn get(&mut self) -> Result<u8> {
        let index = self.cursor.next_get_index()?;
        Ok(unsafe { self.region.get_unchecked(self.offset + index) })
    }

    /// Reads the byte at `index` without moving the position.
    #[inline]
    pub fn get_at(&self, index: usize) -> Result<u8> {
        let index = self.cursor.check_index(index)?;
        Ok(unsafe { self.region.get_unchecked(self.offset + index) })
    }

    /// Fills `dst` from the current position as a single bulk transfer and
    /// advances by `dst.len()`. Fails with [`Error::BufferUnderflow`] if
    /// fewer than `dst.len()` bytes remain; an empty `dst` always
    /// succeeds, even at the limit.
    pub fn get_bytes(&mut self, dst: &mut [u8]) -> Result<()> {
        let index = self.cursor.next_get_index_n(dst.len())?;
        dst.copy_from_slice(self.span(index, dst.len()));
        Ok(())
    }

    pub fn get_u16(&mut self) -> Result<u16> {
        let index = self.cursor.next_get_index_n(2)?;
        Ok(order::read_u16(self.order, self.span(index, 2)))
    }

    pub fn get_u16_at(&self, index: usize) -> Result<u16> {
        let index = self.cursor.check_index_n(index, 2)?;
        Ok(order::read_u16(self.order, self.span(index, 2)))
    }

    pub fn get_i16(&mut self) -> Result<i16> {
        Ok(self.get_u16()? as i16)
    }

    pub fn get_i16_at(&self, index: usize) -> Result<i16> {
        Ok(self.get_u16_at(index)? as i16)
    }

    /// Reads a 16-bit unit as a UTF-16 code unit.
    pub fn get_char(&mut self) -> Result<u16> {
        self.get_u16()
    }

    pub fn get_char_at(&self, index: usize) -> Result<u16> {
        self.get_u16_at(index)
    }

    pub fn get_u32(&mut self) -> Result<u32> {
        let index = self.cursor.next_get_index_n(4)?;
        Ok(order::read_u32(self.order, self.span(index, 4)))
    }

    pub fn get_u32_at(&self, index: usize) -> Result<u32> {
        let index = self.cursor.check_index_n(index, 4)?;
        Ok(order::read_u32(self.order, self.span(index, 4)))
    }

    pub fn get_i32(&mut self) -> Result<i32> {
        Ok(self.get_u32()? as i32)
    }

    pub fn get_i32_at(&self, index: usize) -> Result<i32> {
        Ok(self.get_u32_at(index)? as i32)
    }

    pub fn get_u64(&mut self) -> Result<u64> {
        let index = self.cursor.next_get_index_n(8)?;
        Ok(order::read_u64(self.order, self.span(index, 8)))
    }

    pub fn get_u64_at(&self, index: usize) -> Result<u64> {
        let index = self.cursor.check_index_n(index, 8)?;
        Ok(order::read_u64(self.order, self.span(index, 8)))
    }

    pub fn get_i64(&mut self) -> Result<i64> {
        Ok(self.get_u64()? as i64)
    }

    pub fn get_i64_at(&self, index: usize) -> Result<i64> {
        Ok(self.get_u64_at(index)? as i64)
    }

    /// Reads an IEEE single by re-interpreting the 32-bit integer form.
    pub fn get_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.get_u32()?))
    }

    pub fn get_f32_at(&self, index: usize) -> Result<f32> {
        Ok(f32::from_bits(self.get_u32_at(index)?))
    }

    /// Reads an IEEE double by re-interpreting the 64-bit integer form.
    pub fn get_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.get_u64()?))
    }

    pub fn get_f64_at(&self, index: usize) -> Result<f64> {
        Ok(f64::from_bits(self.get_u64_at(index)?))
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// Writes one byte at the current position and advances by one. Fails
    /// with [`Error::ReadOnlyBuffer`] on a read-only view.
    #[inline]
    pub fn put(&mut self, value: u8) -> Result<()> {
        A::ensure_writable()?;
        let index = self.cursor.next_put_index()?;
        unsafe { self.region.set_unchecked(self.offset + index, value) };
        Ok(())
    }

    /// Writes one byte at `index` without moving the position.
    #[inline]
    pub fn put_at(&mut self, index: usize, value: u8) -> Result<()> {
        A::ensure_writable()?;
        let index = self.cursor.check_index(index)?;
        unsafe { self.region.set_unchecked(self.offset + index, value) };
        Ok(())
    }

    /// Writes all of `src` from the current position as a single bulk
    /// transfer. On failure nothing is written.
    pub fn put_bytes(&mut self, src: &[u8]) -> Result<()> {
        A::ensure_writable()?;
        let index = self.cursor.next_put_index_n(src.len())?;
        self.write_span(index, src);
        Ok(())
    }

    pub fn put_u16(&mut self, value: u16) -> Result<()> {
        A::ensure_writable()?;
        let index = self.cursor.next_put_index_n(2)?;
        let mut buf = [0u8; 2];
        order::write_u16(self.order, &mut buf, value);
        self.write_span(index, &buf);
        Ok(())
    }

    pub fn put_u16_at(&mut self, index: usize, value: u16) -> Result<()> {
        A::ensure_writable()?;
        let index = self.cursor.check_index_n(index, 2)?;
        let mut buf = [0u8; 2];
        order::write_u16(self.order, &mut buf, value);
        self.write_span(index, &buf);
        Ok(())
    }

    pub fn put_i16(&mut self, value: i16) -> Result<()> {
        self.put_u16(value as u16)
    }

    pub fn put_i16_at(&mut self, index: usize, value: i16) -> Result<()> {
        self.put_u16_at(index, value as u16)
    }

    /// Writes a 16-bit unit as a UTF-16 code unit.
    pub fn put_char(&mut self, value: u16) -> Result<()> {
        self.put_u16(value)
    }

    pub fn put_char_at(&mut self, index: usize, value: u16) -> Result<()> {
        self.put_u16_at(index, value)
    }

    pub fn put_u32(&mut self, value: u32) -> Result<()> {
        A::ensure_writable()?;
        let index = self.cursor.next_put_index_n(4)?;
        let mut buf = [0u8; 4];
        order::write_u32(self.order, &mut buf, value);
        self.write_span(index, &buf);
        Ok(())
    }

    pub fn put_u32_at(&mut self, index: usize, value: u32) -> Result<()> {
        A::ensure_writable()?;
        let index = self.cursor.check_index_n(index, 4)?;
        let mut buf = [0u8; 4];
        order::write_u32(self.order, &mut buf, value);
        self.write_span(index, &buf);
        Ok(())
    }

    pub fn put_i32(&mut self, value: i32) -> Result<()> {
        self.put_u32(value as u32)
    }

    pub fn put_i32_at(&mut self, index: usize, value: i32) -> Result<()> {
        self.put_u32_at(index, value as u32)
    }

    pub fn put_u64(&mut self, value: u64) -> Result<()> {
        A::ensure_writable()?;
        let index = self.cursor.next_put_index_n(8)?;
        let mut buf = [0u8; 8];
        order::write_u64(self.order, &mut buf, value);
        self.write_span(index, &buf);
        Ok(())
    }

    pub fn put_u64_at(&mut self, index: usize, value: u64) -> Result<()> {
        A::ensure_writable()?;
        let index = self.cursor.check_index_n(index, 8)?;
        let mut buf = [0u8; 8];
        order::write_u64(self.order, &mut buf, value);
        self.write_span(index, &buf);
        Ok(())
    }

    pub fn put_i64(&mut self, value: i64) -> Result<()> {
        self.put_u64(value as u64)
    }

    pub fn put_i64_at(&mut self, index: usize, value: i64) -> Result<()> {
        self.put_u64_at(index, value as u64)
    }

    /// Writes an IEEE single as its raw 32-bit pattern.
    pub fn put_f32(&mut self, value: f32) -> Result<()> {
        self.put_u32(value.to_bits())
    }

    pub fn put_f32_at(&mut self, index: usize, value: f32) -> Result<()> {
        self.put_u32_at(index, value.to_bits())
    }

    /// Writes an IEEE double as its raw 64-bit pattern.
    pub fn put_f64(&mut self, value: f64) -> Result<()> {
        self.put_u64(value.to_bits())
    }

    pub fn put_f64_at(&mut self, index: usize, value: f64) -> Result<()> {
        self.put_u64_at(index, value.to_bits())
    }

    // ========================================================================
    // DERIVED VIEWS
    // ========================================================================

    /// A new view over `[position, limit)` of this view, position reset to
    /// 0, sharing the same mapping, keeping the byte order and the access
    /// variant.
    pub fn slice(&self) -> ViewBuffer<A> {
        ViewBuffer {
            region: self.region.clone(),
            cursor: Cursor::new(self.cursor.remaining()),
            offset: self.offset + self.cursor.position(),
            order: self.order,
            _access: PhantomData,
        }
    }

    /// A new view over the same full range with position/limit/mark copied;
    /// subsequent cursor moves are independent.
    pub fn duplicate(&self) -> ViewBuffer<A> {
        ViewBuffer {
            region: self.region.clone(),
            cursor: self.cursor.clone(),
            offset: self.offset,
            order: self.order,
            _access: PhantomData,
        }
    }

    /// A read-only duplicate sharing the same mapping.
    pub fn as_read_only(&self) -> ViewBuffer<ReadOnly> {
        ViewBuffer {
            region: self.region.clone(),
            cursor: self.cursor.clone(),
            offset: self.offset,
            order: self.order,
            _access: PhantomData,
        }
    }

    /// Mapped content is externally owned and cannot be reflowed.
    /// Always fails: [`Error::ReadOnlyBuffer`] on a read-only view,
    /// [`Error::NotSupported`] otherwise.
    pub fn compact(&mut self) -> Result<()> {
        A::ensure_writable()?;
        Err(Error::NotSupported)
    }

    /// Forces buffered writes in the mapping back to the file. May block
    /// on OS I/O. A no-op for read-only mappings.
    pub fn flush(&self) -> Result<()> {
        self.region.flush()
    }

    // ========================================================================
    // UNCHECKED ACCESS
    // ========================================================================

    /// Reads the byte at `index` with no bounds checking performed.
    ///
    /// # Safety
    /// `index` must be within `[0, capacity)`.
    #[inline(always)]
    pub unsafe fn get_unchecked(&self, index: usize) -> u8 {
        self.region.get_unchecked(self.offset + index)
    }

    /// Borrows `[index, index + len)` of this view with no bounds checking
    /// performed, for zero-overhead bulk transfer.
    ///
    /// # Safety
    /// `index + len` must not exceed the capacity.
    #[inline(always)]
    pub unsafe fn slice_unchecked(&self, index: usize, len: usize) -> &[u8] {
        self.region.slice_unchecked(self.offset + index, len)
    }
}

impl ViewBuffer<ReadWrite> {
    /// Writes the byte at `index` with no bounds checking performed.
    ///
    /// # Safety
    /// `index` must be within `[0, capacity)`.
    #[inline(always)]
    pub unsafe fn set_unchecked(&self, index: usize, value: u8) {
        self.region.set_unchecked(self.offset + index, value);
    }

    /// Copies all of `src` to `[index, index + src.len())` with no bounds
    /// checking performed.
    ///
    /// # Safety
    /// `index + src.len()` must not exceed the capacity.
    #[inline(always)]
    pub unsafe fn copy_from_unchecked(&self, index: usize, src: &[u8]) {
        self.region.copy_from_unchecked(self.offset + index, src);
    }
}

impl<A: Access> fmt::Debug for ViewBuffer<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewBuffer")
            .field("position", &self.cursor.position())
            .field("limit", &self.cursor.limit())
            .field("capacity", &self.cursor.capacity())
            .field("offset", &self.offset)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}
