use std::io::Read;

use crate::error::{FrameError, Result};

/// Default upper bound on receive buffer growth: 10 MiB.
pub const DEFAULT_MAX_CAPACITY: usize = 10 * 1024 * 1024;

/// Growable staging buffer for bytes read off a socket but not yet assembled
/// into a complete frame.
///
/// Unread content is the contiguous range `[start, end)` of `storage`.
/// Already-consumed bytes before `start` are reclaimed by [`compact`], and
/// storage doubles on demand up to `max_capacity`.
///
/// [`compact`]: RecvBuffer::compact
#[derive(Debug)]
pub struct RecvBuffer {
    storage: Vec<u8>,
    start: usize,
    end: usize,
    max_capacity: usize,
}

impl RecvBuffer {
    /// Create a buffer with `initial_len` bytes of storage, growable up to
    /// `max_capacity`. A zero `max_capacity` selects [`DEFAULT_MAX_CAPACITY`].
    pub fn new(initial_len: usize, max_capacity: usize) -> Self {
        let max_capacity = if max_capacity == 0 {
            DEFAULT_MAX_CAPACITY
        } else {
            max_capacity
        };
        let initial_len = initial_len.clamp(1, max_capacity);
        Self {
            storage: vec![0; initial_len],
            start: 0,
            end: 0,
            max_capacity,
        }
    }

    /// Number of buffered, unconsumed bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True when no unconsumed bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Upper bound on storage growth.
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Shift unread bytes to offset 0, reclaiming space occupied by
    /// already-consumed bytes. No-op when nothing has been consumed.
    pub fn compact(&mut self) {
        if self.start == 0 {
            return;
        }
        self.storage.copy_within(self.start..self.end, 0);
        self.end -= self.start;
        self.start = 0;
    }

    /// Make sure at least one free byte exists after `end`, doubling storage
    /// if necessary (capped at `max_capacity`).
    ///
    /// Fails with [`FrameError::BufferOverflow`] when the buffer is full and
    /// cannot grow further. That is fatal for the owning connection: the peer
    /// is sending a single frame too large to stage, or the stream is not
    /// frame-conformant.
    pub fn ensure_capacity(&mut self) -> Result<()> {
        if self.end < self.storage.len() {
            return Ok(());
        }
        if self.storage.len() >= self.max_capacity {
            return Err(FrameError::BufferOverflow {
                buffered: self.len(),
                max: self.max_capacity,
            });
        }
        let new_len = (self.storage.len() * 2).min(self.max_capacity);
        tracing::trace!(new_len, "receive buffer grown");
        self.storage.resize(new_len, 0);
        Ok(())
    }

    /// Perform exactly one read from `src` into the free space after `end`.
    ///
    /// `Ok(0)` means the source is exhausted (EOF). I/O errors propagate
    /// unchanged. Call [`ensure_capacity`] first: reading into a full buffer
    /// would return `Ok(0)` and be indistinguishable from EOF.
    ///
    /// [`ensure_capacity`]: RecvBuffer::ensure_capacity
    pub fn fill_from<R: Read>(&mut self, src: &mut R) -> std::io::Result<usize> {
        let n = src.read(&mut self.storage[self.end..])?;
        self.end += n;
        Ok(n)
    }

    /// Return the next `n` unread bytes without consuming them.
    pub fn peek(&self, n: usize) -> Result<&[u8]> {
        if self.len() < n {
            return Err(FrameError::InsufficientData {
                have: self.len(),
                need: n,
            });
        }
        Ok(&self.storage[self.start..self.start + n])
    }

    /// Discard `offset` bytes, then return and advance past the next `n`.
    pub fn consume(&mut self, offset: usize, n: usize) -> Result<&[u8]> {
        if self.len() < offset + n {
            return Err(FrameError::InsufficientData {
                have: self.len(),
                need: offset + n,
            });
        }
        self.start += offset;
        let buf = &self.storage[self.start..self.start + n];
        self.start += n;
        Ok(buf)
    }
}
