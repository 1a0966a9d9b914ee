//! Frame Synchronization and Decoding
//!
//! ## Wire Format
//!
//! The link carries fixed 3-byte frames with no length field and no
//! checksum; integrity relies entirely on header resynchronization:
//!
//! ```text
//! ┌────────┬────────┬────────┐
//! │ 0xA5   │   HI   │   LO   │
//! └────────┴────────┴────────┘
//!            │         │
//!            │         └── bits 7..4: sample bits 3..0
//!            │             bits 3..0: padding (ignored, never validated)
//!            └──────────── sample bits 11..4
//! ```
//!
//! The 12-bit sample value is `(HI << 4) | (LO >> 4)`, range 0..=4095.
//!
//! ## Decoding State Machine
//!
//! The decoder is an explicit two-state machine rather than a buffer-reset
//! side effect:
//!
//! ```text
//! SeekHeader ── header byte ──▶ ReadBody ── HI, LO ──▶ SeekHeader
//!     │ ▲                          │
//!     │ └── non-header byte:       └── timeout mid-body: keep the bytes
//!     │      discard buffered          read so far, resume on the next
//!     │      input, report no          call; a partial frame is never
//!     │      sample                    surfaced as a sample
//!     └──────────────────────────
//! ```
//!
//! Each `poll_sample` call reads at most 3 bytes and returns, so a call is
//! bounded by the link's own timeout discipline and never blocks on a full
//! frame.

use crate::link::ByteLink;

/// Header byte marking a frame boundary, as emitted by the hardware
pub const DEFAULT_HEADER: u8 = 0xA5;

/// Decoder state: seeking a frame boundary, or collecting the body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Waiting for the header byte
    SeekHeader,
    /// Header seen; collecting HI then LO
    ReadBody {
        /// HI byte, once read
        hi: Option<u8>,
    },
}

/// Frame decoder recovering 12-bit samples from the raw byte stream
///
/// Stateful across calls: a frame interrupted by a read timeout is resumed
/// where it left off, so samples are neither dropped nor duplicated by
/// timing alone.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    header: u8,
    state: DecodeState,
}

impl FrameDecoder {
    /// Create a decoder using the standard header byte (`0xA5`)
    pub fn new() -> Self {
        Self::with_header(DEFAULT_HEADER)
    }

    /// Create a decoder for a non-standard header byte
    pub fn with_header(header: u8) -> Self {
        Self {
            header,
            state: DecodeState::SeekHeader,
        }
    }

    /// Drop any in-progress frame and return to header seeking
    ///
    /// The driver calls this after a link transport fault, when bytes read
    /// before the fault can no longer be trusted to belong to one frame.
    pub fn reset(&mut self) {
        self.state = DecodeState::SeekHeader;
    }

    /// Check whether the decoder is mid-frame
    pub fn is_mid_frame(&self) -> bool {
        self.state != DecodeState::SeekHeader
    }

    /// Attempt to decode one sample from the link
    ///
    /// Returns:
    /// - `Ok(sample)` - a complete frame was decoded (0..=4095)
    /// - `Err(nb::Error::WouldBlock)` - no sample yet: the link timed out,
    ///   the stream is exhausted, or a stray byte forced resynchronization
    /// - `Err(nb::Error::Other(e))` - link transport fault
    pub fn poll_sample<L: ByteLink>(&mut self, link: &mut L) -> nb::Result<u16, L::Error> {
        if self.state == DecodeState::SeekHeader {
            let byte = link.read_byte()?;
            if byte != self.header {
                // Shifted frame boundary: stale buffered input is
                // unusable, so flush it and retry from a clean boundary
                // on the next call.
                log::trace!("frame resync: expected header {:#04x}, got {:#04x}", self.header, byte);
                link.discard_input().map_err(nb::Error::Other)?;
                return Err(nb::Error::WouldBlock);
            }
            self.state = DecodeState::ReadBody { hi: None };
        }

        let hi = if let DecodeState::ReadBody { hi: Some(hi) } = self.state {
            hi
        } else {
            let hi = link.read_byte()?;
            self.state = DecodeState::ReadBody { hi: Some(hi) };
            hi
        };

        let lo = link.read_byte()?;
        self.state = DecodeState::SeekHeader;

        Ok(((hi as u16) << 4) | ((lo as u16) >> 4))
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
