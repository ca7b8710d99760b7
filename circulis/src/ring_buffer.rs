//! Fixed-capacity byte ring buffer.

use std::cmp;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::capacity::effective_capacity;
use crate::error::{BufferError, WriteError};

/// A thread-safe, fixed-capacity byte ring buffer.
///
/// `RingBuffer` is shared by any number of producers and consumers. Its
/// capacity is rounded up to a power of two so that cursor positions map
/// into storage with a mask.
///
/// # Semantics
///
/// - **Write**: places every input byte. When full, a non-blocking write
///   returns [`BufferError::Full`] with the partial count; a blocking write
///   waits for space.
/// - **Read**: returns between 1 and `buf.len()` bytes. When empty, a
///   non-blocking read returns [`BufferError::Empty`]; a blocking read
///   waits for data.
/// - **Close**: new writes fail immediately, readers drain what is buffered
///   and then get [`BufferError::Closed`].
///
/// Bytes from one `write` call stay in order, but bytes from concurrent
/// writers may interleave at chunk granularity when a writer has to wait
/// for space part way through its input.
///
/// # Example
///
/// ```
/// use circulis::{BufferError, RingBuffer};
///
/// let buf = RingBuffer::new(8);
/// assert_eq!(buf.write(b"hello").unwrap(), 5);
///
/// let mut out = [0u8; 8];
/// assert_eq!(buf.read(&mut out).unwrap(), 5);
/// assert_eq!(&out[..5], b"hello");
/// assert_eq!(buf.read(&mut out), Err(BufferError::Empty));
/// ```
pub struct RingBuffer {
    inner: Arc<RingBufferInner>,
}

struct RingBufferInner {
    state: Mutex<RingBufferState>,
    // Notified when tail advances.
    data_available: Condvar,
    // Notified when head advances.
    space_freed: Condvar,
}

struct RingBufferState {
    storage: Box<[u8]>,
    mask: u64,
    // Monotonic cursors; only `cursor & mask` indexes storage.
    // Invariant: tail - head <= storage.len().
    head: u64,
    tail: u64,
    closed: bool,
    blocking: bool,
}

impl RingBufferState {
    fn len(&self) -> usize {
        self.tail.wrapping_sub(self.head) as usize
    }

    fn free(&self) -> usize {
        self.storage.len() - self.len()
    }

    fn push(&mut self, data: &[u8]) {
        let offset = (self.tail & self.mask) as usize;
        copy_in(&mut self.storage, offset, data);
        self.tail = self.tail.wrapping_add(data.len() as u64);
    }

    fn pop(&mut self, buf: &mut [u8]) {
        let offset = (self.head & self.mask) as usize;
        copy_out(&self.storage, offset, buf);
        self.head = self.head.wrapping_add(buf.len() as u64);
    }
}

/// Copies `src` into `storage` starting at `offset`, wrapping to the front.
fn copy_in(storage: &mut [u8], offset: usize, src: &[u8]) {
    debug_assert!(offset < storage.len() && src.len() <= storage.len());
    let first = cmp::min(src.len(), storage.len() - offset);
    storage[offset..offset + first].copy_from_slice(&src[..first]);
    storage[..src.len() - first].copy_from_slice(&src[first..]);
}

/// Fills `dst` from `storage` starting at `offset`, wrapping to the front.
fn copy_out(storage: &[u8], offset: usize, dst: &mut [u8]) {
    debug_assert!(offset < storage.len() && dst.len() <= storage.len());
    let first = cmp::min(dst.len(), storage.len() - offset);
    let second = dst.len() - first;
    dst[..first].copy_from_slice(&storage[offset..offset + first]);
    dst[first..].copy_from_slice(&storage[..second]);
}

impl Clone for RingBuffer {
    fn clone(&self) -> Self {
        RingBuffer {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("RingBuffer")
            .field("capacity", &state.storage.len())
            .field("len", &state.len())
            .field("closed", &state.closed)
            .field("blocking", &state.blocking)
            .finish()
    }
}

impl RingBuffer {
    /// Creates a non-blocking RingBuffer holding at least `capacity` bytes.
    ///
    /// The capacity is rounded up to the next power of two.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or cannot be rounded to a power of two.
    pub fn new(capacity: usize) -> Self {
        match Self::try_new(capacity) {
            Ok(buf) => buf,
            Err(err) => panic!("{err}"),
        }
    }

    /// Creates a non-blocking RingBuffer, reporting a bad capacity as an error.
    pub fn try_new(capacity: usize) -> Result<Self, BufferError> {
        let capacity =
            effective_capacity(capacity).ok_or(BufferError::InvalidCapacity(capacity))?;

        Ok(RingBuffer {
            inner: Arc::new(RingBufferInner {
                state: Mutex::new(RingBufferState {
                    storage: vec![0u8; capacity].into_boxed_slice(),
                    mask: capacity as u64 - 1,
                    head: 0,
                    tail: 0,
                    closed: false,
                    blocking: false,
                }),
                data_available: Condvar::new(),
                space_freed: Condvar::new(),
            }),
        })
    }

    /// Creates a RingBuffer already set to the given mode.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`RingBuffer::new`].
    pub fn with_blocking(capacity: usize, blocking: bool) -> Self {
        let buf = Self::new(capacity);
        buf.set_blocking(blocking);
        buf
    }

    /// Returns the effective (power of two) capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.inner.state.lock().storage.len()
    }

    /// Returns the number of bytes currently buffered.
    pub fn len(&self) -> usize {
        self.inner.state.lock().len()
    }

    /// Returns the number of bytes that can be written without waiting.
    pub fn free(&self) -> usize {
        self.inner.state.lock().free()
    }

    /// Returns true if no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if no space is left.
    pub fn is_full(&self) -> bool {
        self.free() == 0
    }

    /// Returns true once [`RingBuffer::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Returns true if reads and writes wait instead of failing.
    pub fn is_blocking(&self) -> bool {
        self.inner.state.lock().blocking
    }

    /// Switches between blocking and non-blocking mode.
    ///
    /// Applies to current waiters as well as future calls: every waiter is
    /// woken to re-check, so a writer blocked on a full buffer returns
    /// [`BufferError::Full`] as soon as blocking is disabled.
    pub fn set_blocking(&self, blocking: bool) {
        let mut state = self.inner.state.lock();
        state.blocking = blocking;
        self.inner.data_available.notify_all();
        self.inner.space_freed.notify_all();
    }

    /// Closes the buffer.
    ///
    /// Further writes fail with [`BufferError::Closed`]. Readers keep
    /// receiving buffered bytes until the buffer is drained. All waiters are
    /// woken. Calling `close` more than once has no further effect.
    pub fn close(&self) {
        let mut state = self.inner.state.lock();
        state.closed = true;
        self.inner.data_available.notify_all();
        self.inner.space_freed.notify_all();
    }

    /// Writes all of `data` into the buffer.
    ///
    /// Returns `data.len()` on success. When the write stops early the
    /// [`WriteError`] carries the number of bytes already accepted:
    ///
    /// - non-blocking mode, no space left: [`BufferError::Full`]
    /// - blocking mode, closed while waiting for space: [`BufferError::Closed`]
    ///
    /// A write to a closed buffer always fails with nothing written.
    pub fn write(&self, data: &[u8]) -> Result<usize, WriteError> {
        let mut state = self.inner.state.lock();

        if state.closed {
            return Err(WriteError::new(0, BufferError::Closed));
        }

        let mut written = 0;
        while written < data.len() {
            let free = state.free();
            if free == 0 {
                if !state.blocking {
                    return Err(WriteError::new(written, BufferError::Full));
                }
                self.inner.space_freed.wait(&mut state);
                if state.closed {
                    return Err(WriteError::new(written, BufferError::Closed));
                }
                continue;
            }

            let n = cmp::min(data.len() - written, free);
            state.push(&data[written..written + n]);
            written += n;
            self.inner.data_available.notify_one();
        }

        // Pass the wakeup on if another writer could still make progress.
        if state.free() > 0 {
            self.inner.space_freed.notify_one();
        }
        Ok(written)
    }

    /// Reads up to `buf.len()` bytes from the buffer.
    ///
    /// Returns as soon as at least one byte is available; a short read is
    /// not an error. When nothing is buffered:
    ///
    /// - closed: [`BufferError::Closed`]
    /// - non-blocking mode: [`BufferError::Empty`]
    /// - blocking mode: waits for data or close
    ///
    /// An empty `buf` returns `Ok(0)` without waiting unless the buffer is
    /// closed and drained.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, BufferError> {
        let mut state = self.inner.state.lock();

        loop {
            let available = state.len();
            if available == 0 {
                if state.closed {
                    return Err(BufferError::Closed);
                }
                if buf.is_empty() {
                    return Ok(0);
                }
                if !state.blocking {
                    return Err(BufferError::Empty);
                }
                self.inner.data_available.wait(&mut state);
                continue;
            }

            let n = cmp::min(buf.len(), available);
            if n == 0 {
                return Ok(0);
            }
            state.pop(&mut buf[..n]);
            self.inner.space_freed.notify_one();

            // Pass the wakeup on if another reader could still make progress.
            if state.len() > 0 {
                self.inner.data_available.notify_one();
            }
            return Ok(n);
        }
    }
}
