//! Byte Link Abstraction for Framed Acquisition
//!
//! ## Overview
//!
//! The frame decoder pulls raw bytes from a [`ByteLink`] one at a time. The
//! trait follows the pull-based `nb` model: `WouldBlock` means "nothing
//! arrived within the transport's read timeout", which lets a blocking
//! serial port, a socket, or an in-memory replay buffer all sit behind the
//! same seam without an async runtime.
//!
//! ## Contract
//!
//! - `read_byte` must be bounded by the transport's own timeout discipline;
//!   it never blocks indefinitely.
//! - `WouldBlock` covers both timeouts and end-of-stream. Neither is an
//!   error: the driver simply repeats the cycle.
//! - `Other(e)` is reserved for genuine transport faults (for a serial port,
//!   anything other than a timed-out read).
//! - `discard_input` drops any bytes the transport has buffered but not yet
//!   handed out. The decoder calls it when it sees evidence of a shifted
//!   frame boundary, so the next read starts from a clean boundary.

use core::fmt;

/// Pull-based source of raw link bytes
///
/// Implementations exist for real hardware (the serial adapter in
/// `sigflow-connectors`) and for in-memory replay ([`MemoryLink`]).
pub trait ByteLink {
    /// Transport fault type
    type Error: fmt::Display;

    /// Attempt to pull one byte from the link
    ///
    /// Returns:
    /// - `Ok(byte)` - a byte was available
    /// - `Err(nb::Error::WouldBlock)` - nothing within the read timeout,
    ///   or the stream is exhausted
    /// - `Err(nb::Error::Other(e))` - transport fault
    fn read_byte(&mut self) -> nb::Result<u8, Self::Error>;

    /// Drop any buffered-but-undelivered input
    ///
    /// Called on loss of frame synchronization. Links without an internal
    /// buffer may implement this as a no-op.
    fn discard_input(&mut self) -> Result<(), Self::Error>;
}

/// In-memory byte link for testing and replay
///
/// Delivers a fixed byte sequence one byte per call, then reports
/// `WouldBlock` forever. There is no internal buffer beyond the slice
/// itself, so `discard_input` is a no-op: bytes not yet delivered model
/// future link traffic, not stale buffered input.
///
/// ## Example
///
/// ```rust
/// use sigflow_core::link::{ByteLink, MemoryLink};
///
/// let mut link = MemoryLink::new(&[0xA5, 0x01]);
/// assert_eq!(link.read_byte(), Ok(0xA5));
/// assert_eq!(link.read_byte(), Ok(0x01));
/// assert!(link.read_byte().is_err()); // exhausted -> WouldBlock
/// ```
pub struct MemoryLink<'a> {
    /// Byte sequence to replay
    data: &'a [u8],
    /// Next byte to deliver
    position: usize,
}

impl<'a> MemoryLink<'a> {
    /// Create a new link over a byte slice
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Reset to the beginning of the sequence
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Number of bytes not yet delivered
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Check if every byte has been delivered
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.data.len()
    }
}

impl ByteLink for MemoryLink<'_> {
    type Error = core::convert::Infallible;

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
        if self.position >= self.data.len() {
            return Err(nb::Error::WouldBlock);
        }

        let byte = self.data[self.position];
        self.position += 1;
        Ok(byte)
    }

    fn discard_input(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_bytes_in_order() {
        let mut link = MemoryLink::new(&[1, 2, 3]);

        assert_eq!(link.remaining(), 3);
        assert_eq!(link.read_byte(), Ok(1));
        assert_eq!(link.read_byte(), Ok(2));
        assert_eq!(link.read_byte(), Ok(3));
        assert!(link.is_exhausted());
    }

    #[test]
    fn exhaustion_is_would_block() {
        let mut link = MemoryLink::new(&[]);
        assert_eq!(link.read_byte(), Err(nb::Error::WouldBlock));
        // Sticky: still WouldBlock on repeat
        assert_eq!(link.read_byte(), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn reset_replays() {
        let mut link = MemoryLink::new(&[7]);
        assert_eq!(link.read_byte(), Ok(7));
        link.reset();
        assert_eq!(link.read_byte(), Ok(7));
    }
}
