//! Core acquisition pipeline for Sigflow
//!
//! Turns the byte stream of a framed 12-bit ADC link into enriched sample
//! records: decode, smooth, baseline, flag, assemble, dispatch.
//!
//! Key constraints:
//! - One sample in, one record out, in arrival order
//! - No sample is silently dropped or duplicated once decoded
//! - Sink failures never corrupt filter or window state
//!
//! ```no_run
//! use sigflow_core::{FrameDecoder, MemoryLink};
//!
//! // One valid frame: header, HI, LO (low nibble of LO is padding)
//! let mut link = MemoryLink::new(&[0xA5, 0x30, 0x00]);
//! let mut decoder = FrameDecoder::new();
//!
//! assert_eq!(decoder.poll_sample(&mut link), Ok(768));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod fault;
pub mod filter;
pub mod frame;
pub mod link;
pub mod pipeline;
pub mod record;
pub mod stats;
pub mod time;
pub mod traits;

// Public API
pub use errors::{ConfigError, PipelineError};
pub use fault::SigmaClassifier;
pub use filter::SmoothingFilter;
pub use frame::{FrameDecoder, DEFAULT_HEADER};
pub use link::{ByteLink, MemoryLink};
pub use pipeline::{Pipeline, PipelineConfig, PipelineMetrics};
pub use record::{SampleRecord, SCHEMA_VERSION};
pub use stats::{SlidingStats, WindowStats, MAX_WINDOW};
pub use time::{FixedClock, TimeSource, Timestamp};
pub use traits::{PublishSink, StorageSink};

#[cfg(feature = "std")]
pub use time::SystemClock;

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
