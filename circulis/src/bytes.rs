//! Preset constructors for common byte capacities.
//!
//! All presets start in non-blocking mode.

use crate::RingBuffer;

/// Creates a 1KB ring buffer.
pub fn ring_bytes_1kb() -> RingBuffer {
    RingBuffer::new(1 << 10)
}

/// Creates a 4KB ring buffer.
pub fn ring_bytes_4kb() -> RingBuffer {
    RingBuffer::new(4 << 10)
}

/// Creates a 16KB ring buffer.
pub fn ring_bytes_16kb() -> RingBuffer {
    RingBuffer::new(16 << 10)
}

/// Creates a 64KB ring buffer.
pub fn ring_bytes_64kb() -> RingBuffer {
    RingBuffer::new(64 << 10)
}

/// Creates a ring buffer holding at least `size` bytes.
pub fn ring_bytes(size: usize) -> RingBuffer {
    RingBuffer::new(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_capacities() {
        assert_eq!(ring_bytes_1kb().capacity(), 1024);
        assert_eq!(ring_bytes_4kb().capacity(), 4096);
        assert_eq!(ring_bytes_16kb().capacity(), 16384);
        assert_eq!(ring_bytes_64kb().capacity(), 65536);
        assert_eq!(ring_bytes(100).capacity(), 128);
    }

    #[test]
    fn test_presets_are_nonblocking() {
        let buf = ring_bytes_1kb();
        assert!(!buf.is_blocking());
        assert_eq!(buf.read(&mut [0u8; 1]), Err(crate::BufferError::Empty));
    }
}
