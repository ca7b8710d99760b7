//! Fixed-capacity byte ring buffer for concurrent producers and consumers.
//!
//! [`RingBuffer`] is a power-of-two sized circular byte buffer guarded by a
//! single mutex. Any number of threads may read, write, switch modes and
//! close it concurrently.
//!
//! # Modes
//!
//! ## Non-blocking (default)
//!
//! Operations never wait. A write into a full buffer returns
//! [`BufferError::Full`] together with the number of bytes it did place,
//! and a read from an empty buffer returns [`BufferError::Empty`]. Callers
//! own their retry loops.
//!
//! ```
//! use circulis::{BufferError, RingBuffer};
//!
//! let buf = RingBuffer::new(8);
//! buf.write(&[0; 6]).unwrap();
//!
//! let err = buf.write(&[1; 10]).unwrap_err();
//! assert_eq!(err.written, 2);
//! assert_eq!(err.error, BufferError::Full);
//! ```
//!
//! ## Blocking
//!
//! Writers wait for space and readers wait for data. Switching modes with
//! [`RingBuffer::set_blocking`] wakes every waiter so it can re-check.
//!
//! ```
//! use circulis::RingBuffer;
//! use std::thread;
//!
//! let buf = RingBuffer::with_blocking(4, true);
//! let producer_buf = buf.clone();
//!
//! let producer = thread::spawn(move || {
//!     producer_buf.write(b"more than four bytes").unwrap();
//!     producer_buf.close();
//! });
//!
//! let mut out = Vec::new();
//! let mut chunk = [0u8; 4];
//! while let Ok(n) = buf.read(&mut chunk) {
//!     out.extend_from_slice(&chunk[..n]);
//! }
//!
//! producer.join().unwrap();
//! assert_eq!(out, b"more than four bytes");
//! ```
//!
//! # Closing
//!
//! [`RingBuffer::close`] rejects all further writes, while readers drain the
//! bytes already accepted before receiving [`BufferError::Closed`].
//!
//! # I/O
//!
//! `RingBuffer` and `&RingBuffer` implement [`std::io::Read`] and
//! [`std::io::Write`]; a closed and drained buffer reads as end of file.

mod bytes;
mod capacity;
mod error;
mod io;
mod ring_buffer;

pub use bytes::*;
pub use capacity::effective_capacity;
pub use error::{BufferError, WriteError};
pub use ring_buffer::RingBuffer;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RingBuffer>();
        assert_send_sync::<BufferError>();
        assert_send_sync::<WriteError>();
    }

    #[test]
    fn test_ring_buffer_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<RingBuffer>();
    }

    #[test]
    fn test_clones_share_state() {
        let a = RingBuffer::new(8);
        let b = a.clone();
        a.write(b"xyz").unwrap();
        assert_eq!(b.len(), 3);
        b.close();
        assert!(a.is_closed());
    }
}
