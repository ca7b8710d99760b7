//! `std::io` adapters.
//!
//! A drained, closed buffer reads as end of file. In non-blocking mode an
//! empty or full buffer surfaces as [`io::ErrorKind::WouldBlock`], and a
//! write that placed some bytes before stopping reports a short write.

use std::io;

use crate::error::BufferError;
use crate::ring_buffer::RingBuffer;

impl io::Read for &RingBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match RingBuffer::read(self, buf) {
            Ok(n) => Ok(n),
            Err(BufferError::Closed) => Ok(0),
            Err(err) => Err(err.into()),
        }
    }
}

impl io::Write for &RingBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        match RingBuffer::write(self, data) {
            Ok(n) => Ok(n),
            Err(err) if err.written > 0 => Ok(err.written),
            Err(err) => Err(err.into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for RingBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(&mut &*self, buf)
    }
}

impl io::Write for RingBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut &*self, data)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::thread;

    #[test]
    fn test_read_eof_after_close() {
        let mut buf = RingBuffer::new(8);
        buf.write_all(b"hi").unwrap();
        buf.close();

        let mut out = Vec::new();
        buf.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hi");
        assert_eq!(Read::read(&mut buf, &mut [0u8; 4]).unwrap(), 0);
    }

    #[test]
    fn test_would_block() {
        let mut buf = RingBuffer::new(4);
        let err = Read::read(&mut buf, &mut [0u8; 4]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);

        assert_eq!(Write::write(&mut buf, b"abcdef").unwrap(), 4);
        let err = Write::write(&mut buf, b"g").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn test_write_after_close_is_broken_pipe() {
        let mut buf = RingBuffer::new(4);
        buf.close();
        let err = Write::write(&mut buf, b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_io_copy_through_blocking_buffer() {
        let buf = RingBuffer::with_blocking(16, true);
        let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

        let producer_buf = buf.clone();
        let input = payload.clone();
        let producer = thread::spawn(move || {
            let mut src = &input[..];
            let mut dst = &producer_buf;
            io::copy(&mut src, &mut dst).unwrap();
            producer_buf.close();
        });

        let mut received = Vec::new();
        let mut src = &buf;
        io::copy(&mut src, &mut received).unwrap();

        producer.join().unwrap();
        assert_eq!(received, payload);
    }
}
