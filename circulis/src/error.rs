//! Error types for ring buffer operations.

use std::io;

use thiserror::Error;

/// Ring buffer operation error.
///
/// `Full` and `Empty` are transient and only occur in non-blocking mode;
/// the caller may retry. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    /// No free space for a non-blocking write.
    #[error("circulis: buffer full")]
    Full,

    /// No buffered data for a non-blocking read.
    #[error("circulis: buffer empty")]
    Empty,

    /// The buffer has been closed (and, for reads, fully drained).
    #[error("circulis: buffer closed")]
    Closed,

    /// Requested capacity is zero or cannot be rounded to a power of two.
    #[error("circulis: invalid capacity {0}")]
    InvalidCapacity(usize),
}

impl BufferError {
    /// Returns true if the operation may succeed when retried later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BufferError::Full | BufferError::Empty)
    }
}

/// A write that stopped before placing every input byte.
///
/// `written` bytes were accepted into the buffer before `error` occurred;
/// they are not rolled back and will be delivered to readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{error} after writing {written} bytes")]
pub struct WriteError {
    /// Bytes placed in the buffer during this call.
    pub written: usize,
    /// Why the write stopped: `Full` or `Closed`.
    #[source]
    pub error: BufferError,
}

impl WriteError {
    pub(crate) fn new(written: usize, error: BufferError) -> Self {
        WriteError { written, error }
    }
}

impl From<WriteError> for BufferError {
    fn from(err: WriteError) -> Self {
        err.error
    }
}

impl From<BufferError> for io::Error {
    fn from(err: BufferError) -> Self {
        let kind = match err {
            BufferError::Full | BufferError::Empty => io::ErrorKind::WouldBlock,
            BufferError::Closed => io::ErrorKind::BrokenPipe,
            BufferError::InvalidCapacity(_) => io::ErrorKind::InvalidInput,
        };
        io::Error::new(kind, err)
    }
}

impl From<WriteError> for io::Error {
    fn from(err: WriteError) -> Self {
        err.error.into()
    }
}
