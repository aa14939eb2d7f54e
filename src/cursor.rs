//! Cursor state for buffer views.
//!
//! A cursor tracks the position, limit, mark and capacity of one view.
//! Its index methods are the sole gate through which every typed accessor
//! obtains an index; the invariant `position <= limit <= capacity` holds
//! after every mutating operation, and violating attempts fail instead of
//! clamping.

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub(crate) struct Cursor {
    position: usize,
    limit: usize,
    mark: Option<usize>,
    capacity: usize,
}

impl Cursor {
    /// A fresh cursor: position 0, limit at capacity, no mark.
    pub(crate) fn new(capacity: usize) -> Cursor {
        Cursor {
            position: 0,
            limit: capacity,
            mark: None,
            capacity,
        }
    }

    #[inline(always)]
    pub(crate) fn position(&self) -> usize {
        self.position
    }

    #[inline(always)]
    pub(crate) fn limit(&self) -> usize {
        self.limit
    }

    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline(always)]
    pub(crate) fn remaining(&self) -> usize {
        self.limit - self.position
    }

    #[inline(always)]
    pub(crate) fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    /// Moves the position. A mark beyond the new position is discarded.
    pub(crate) fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.limit {
            return Err(Error::InvalidArgument("position must not exceed the limit"));
        }
        if self.mark.is_some_and(|mark| mark > position) {
            self.mark = None;
        }
        self.position = position;
        Ok(())
    }

    /// Moves the limit. The position is pulled back to the new limit if it
    /// was beyond it, and a mark beyond the new limit is discarded.
    pub(crate) fn set_limit(&mut self, limit: usize) -> Result<()> {
        if limit > self.capacity {
            return Err(Error::InvalidArgument("limit must not exceed the capacity"));
        }
        self.limit = limit;
        if self.position > limit {
            self.position = limit;
        }
        if self.mark.is_some_and(|mark| mark > limit) {
            self.mark = None;
        }
        Ok(())
    }

    /// Saves the current position for a later [`reset`](Cursor::reset).
    pub(crate) fn mark(&mut self) {
        self.mark = Some(self.position);
    }

    /// Restores the position saved by [`mark`](Cursor::mark).
    pub(crate) fn reset(&mut self) -> Result<()> {
        let mark = self.mark.ok_or(Error::InvalidMark)?;
        self.position = mark;
        Ok(())
    }

    /// Readies the cursor for a fresh write pass over the whole view.
    pub(crate) fn clear(&mut self) {
        self.position = 0;
        self.limit = self.capacity;
        self.mark = None;
    }

    /// Readies the cursor to read back what was just written.
    pub(crate) fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
        self.mark = None;
    }

    /// Rewinds to position 0, keeping the limit.
    pub(crate) fn rewind(&mut self) {
        self.position = 0;
        self.mark = None;
    }

    // ========================================================================
    // INDEX GATES
    // ========================================================================

    /// Returns the current position and advances by one.
    #[inline]
    pub(crate) fn next_get_index(&mut self) -> Result<usize> {
        if self.position >= self.limit {
            return Err(Error::BufferUnderflow);
        }
        let index = self.position;
        self.position = index + 1;
        Ok(index)
    }

    /// Returns the current position and advances by `n`. A zero-length
    /// request succeeds even at the limit.
    #[inline]
    pub(crate) fn next_get_index_n(&mut self, n: usize) -> Result<usize> {
        if self.limit - self.position < n {
            return Err(Error::BufferUnderflow);
        }
        let index = self.position;
        self.position = index + n;
        Ok(index)
    }

    /// Returns the current position and advances by one.
    #[inline]
    pub(crate) fn next_put_index(&mut self) -> Result<usize> {
        if self.position >= self.limit {
            return Err(Error::BufferOverflow);
        }
        let index = self.position;
        self.position = index + 1;
        Ok(index)
    }

    /// Returns the current position and advances by `n`.
    #[inline]
    pub(crate) fn next_put_index_n(&mut self, n: usize) -> Result<usize> {
        if self.limit - self.position < n {
            return Err(Error::BufferOverflow);
        }
        let index = self.position;
        self.position = index + n;
        Ok(index)
    }

    /// Validates an absolute single-byte index against the limit.
    #[inline]
    pub(crate) fn check_index(&self, index: usize) -> Result<usize> {
        if index >= self.limit {
            return Err(Error::IndexOutOfRange {
                index,
                len: 1,
                limit: self.limit,
            });
        }
        Ok(index)
    }

    /// Validates an absolute `n`-byte span against the limit.
    #[inline]
    pub(crate) fn check_index_n(&self, index: usize, n: usize) -> Result<usize> {
        if index > self.limit || n > self.limit - index {
            return Err(Error::IndexOutOfRange {
                index,
                len: n,
                limit: self.limit,
            });
        }
        Ok(index)
    }
}
