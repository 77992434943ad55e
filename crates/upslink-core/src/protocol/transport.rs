//! Transport and timing seams
//!
//! The driver only ever talks to the UPS through these two traits, so the
//! serial port and the wall clock can both be replaced in tests.

use std::time::Duration;

use super::TransportError;

/// Byte stream to the UPS.
///
/// Implementations are opened with 2400-8-N-1 and a 2 second read timeout.
pub trait Transport {
    /// Open and configure the stream
    fn open(&mut self) -> Result<(), TransportError>;

    /// Close the stream. Closing an already closed stream is not an error.
    fn close(&mut self) -> Result<(), TransportError>;

    /// Whether `open` succeeded and `close` has not been called since
    fn is_open(&self) -> bool;

    /// Best-effort write, returns the number of bytes accepted
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Number of bytes buffered for reading, without blocking
    fn bytes_available(&mut self) -> Result<usize, TransportError>;

    /// Read exactly `count` bytes, blocking at most the configured timeout
    fn read_exact(&mut self, count: usize) -> Result<Vec<u8>, TransportError>;
}

/// Blocking delay provider
pub trait Delay {
    /// Block the caller for `duration`
    fn delay(&mut self, duration: Duration);
}

/// Sleeps the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self) -> Result<(), TransportError> {
        (**self).open()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        (**self).write(data)
    }

    fn bytes_available(&mut self) -> Result<usize, TransportError> {
        (**self).bytes_available()
    }

    fn read_exact(&mut self, count: usize) -> Result<Vec<u8>, TransportError> {
        (**self).read_exact(count)
    }
}
