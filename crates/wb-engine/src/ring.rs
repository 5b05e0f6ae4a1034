//! Fixed-capacity circular buffer with wrap-aware cursors.

/// Circular buffer over `N` elements with one producer and one
/// consumer.
///
/// Writers must check [`has_space_for`](RingBuffer::has_space_for)
/// before calling [`write`](RingBuffer::write); the check is strict
/// (`free() > n`), which keeps the write cursor from ever reaching the
/// read cursor, so `read_index == write_index` always means empty and
/// unread data is never overwritten.
pub struct RingBuffer<T: Copy + Default, const N: usize> {
    buf: [T; N],
    write_index: usize,
    read_index: usize,
}

impl<T: Copy + Default, const N: usize> RingBuffer<T, N> {
    pub fn new() -> Self {
        Self {
            buf: [T::default(); N],
            write_index: 0,
            read_index: 0,
        }
    }

    /// Elements available to read.
    pub fn used(&self) -> usize {
        if self.write_index >= self.read_index {
            self.write_index - self.read_index
        } else {
            N - (self.read_index - self.write_index)
        }
    }

    /// Elements that may still be written.
    pub fn free(&self) -> usize {
        N - self.used()
    }

    /// True when strictly more than `n` elements are free.
    pub fn has_space_for(&self, n: usize) -> bool {
        self.free() > n
    }

    /// Copy `src` in, splitting the copy at the wrap point.
    ///
    /// The caller must have verified space with `has_space_for`;
    /// violating that ordering is a caller bug.
    pub fn write(&mut self, src: &[T]) {
        debug_assert!(self.free() > src.len(), "ring write without space check");
        let n = src.len();
        let tail = N - self.write_index;
        if n <= tail {
            self.buf[self.write_index..self.write_index + n].copy_from_slice(src);
            self.write_index += n;
            if self.write_index == N {
                self.write_index = 0;
            }
        } else {
            self.buf[self.write_index..].copy_from_slice(&src[..tail]);
            self.buf[..n - tail].copy_from_slice(&src[tail..]);
            self.write_index = n - tail;
        }
    }

    /// Copy out up to `dst.len()` elements; returns how many were read.
    pub fn read(&mut self, dst: &mut [T]) -> usize {
        let n = dst.len().min(self.used());
        let tail = N - self.read_index;
        if n <= tail {
            dst[..n].copy_from_slice(&self.buf[self.read_index..self.read_index + n]);
            self.read_index += n;
            if self.read_index == N {
                self.read_index = 0;
            }
        } else {
            dst[..tail].copy_from_slice(&self.buf[self.read_index..]);
            dst[tail..n].copy_from_slice(&self.buf[..n - tail]);
            self.read_index = n - tail;
        }
        n
    }

    /// Drop all contents.
    pub fn clear(&mut self) {
        self.write_index = 0;
        self.read_index = 0;
    }
}

impl<T: Copy + Default, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
