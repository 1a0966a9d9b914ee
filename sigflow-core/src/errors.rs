//! Error Types for the Acquisition Pipeline
//!
//! Two families of failure exist in the core:
//!
//! - Configuration errors, rejected once at construction time. A pipeline
//!   never starts with an invalid filter coefficient or window size.
//! - Pipeline errors, surfaced while cycling. Only byte-link transport
//!   faults and the terminal stopped state appear here: framing noise is
//!   handled silently by resynchronization, and sink failures are logged
//!   and counted rather than propagated (a later record may still be
//!   stored or published).
//!
//! All error data is inline; variants are `Copy` where the payload allows
//! so they can be returned from hot paths without allocation.

use crate::stats::MAX_WINDOW;
use thiserror_no_std::Error;

/// Errors raised while constructing pipeline components
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Filter coefficient outside the valid [0, 1] interval
    #[error("filter coefficient {alpha} outside [0, 1]")]
    InvalidAlpha {
        /// The rejected coefficient
        alpha: f64,
    },

    /// Window size outside the supported range
    #[error("window size {requested} outside 1..={max}")]
    InvalidWindow {
        /// The rejected window size
        requested: usize,
        /// Largest supported window (`MAX_WINDOW`)
        max: usize,
    },
}

impl ConfigError {
    /// Reject a window size the sliding estimator cannot hold
    pub fn invalid_window(requested: usize) -> Self {
        Self::InvalidWindow {
            requested,
            max: MAX_WINDOW,
        }
    }
}

/// Errors surfaced by the pipeline driver while cycling
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum PipelineError<E> {
    /// Transport fault on the byte link (timeouts are not faults; they
    /// surface as `nb::Error::WouldBlock` instead)
    #[error("byte link fault: {0}")]
    Link(E),

    /// The driver has reached its terminal state; no further samples
    /// will be processed
    #[error("pipeline is stopped")]
    Stopped,
}
