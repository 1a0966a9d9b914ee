//! Pipeline Driver
//!
//! ## Overview
//!
//! The driver composes the per-sample stages into one synchronous cycle and
//! repeats it indefinitely:
//!
//! ```text
//! byte link ─▶ FrameDecoder ─▶ SmoothingFilter ─▶ SlidingStats
//!                                      │               │
//!                                      └───────┬───────┘
//!                                              ▼
//!                                      SigmaClassifier
//!                                              ▼
//!                                       SampleRecord ──▶ storage sink
//!                                                    └─▶ publish sink
//! ```
//!
//! There is no queuing between stages: one raw sample in, one record out,
//! in arrival order. Filter state and the statistics window are owned by
//! the driver and updated strictly before the record's metrics are read,
//! so every record's statistics include the sample it describes.
//!
//! ## Failure Policy
//!
//! - Framing noise: silent resynchronization inside the decoder.
//! - Link transport faults: logged, decoder reset, bounded backoff,
//!   cycle continues.
//! - Storage append failure: logged and counted; does not suppress the
//!   publish attempt for the same record.
//! - Publish failure: logged and counted; never retried synchronously.
//! - Stop signal: observed between cycles, so shutdown latency is bounded
//!   by one sample's processing time. `Stopped` is terminal.
//!
//! Sink outcomes never feed back into filter or window state, which are
//! updated purely from the decoded raw sample.

#[cfg(feature = "std")]
use core::sync::atomic::{AtomicBool, Ordering};

use crate::{
    errors::{ConfigError, PipelineError},
    fault::SigmaClassifier,
    filter::SmoothingFilter,
    frame::{FrameDecoder, DEFAULT_HEADER},
    link::ByteLink,
    record::SampleRecord,
    stats::SlidingStats,
    time::TimeSource,
    traits::{PublishSink, StorageSink},
};

#[cfg(feature = "std")]
use std::time::Duration;

/// Idle wait when the link has nothing to offer, to avoid a hot spin
#[cfg(feature = "std")]
const IDLE_WAIT: Duration = Duration::from_millis(2);

/// Backoff after a link transport fault, to avoid busy-looping against a
/// dead link
#[cfg(feature = "std")]
const LINK_BACKOFF: Duration = Duration::from_millis(50);

/// Driver state machine: running, or terminally stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    Running,
    Stopped,
}

/// Static pipeline configuration, fixed for the process lifetime
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Channel id stamped into every record
    pub channel: u16,
    /// IIR smoothing coefficient in [0, 1]
    pub alpha: f64,
    /// Statistics window size in samples
    pub window: usize,
    /// Frame header byte on the wire
    pub header: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            alpha: 0.5,
            window: 64,
            header: DEFAULT_HEADER,
        }
    }
}

/// Counters exposed by the driver for operator visibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineMetrics {
    /// Records fully assembled and dispatched
    pub records: u64,
    /// Storage appends that failed (records lost to storage only)
    pub storage_failures: u64,
    /// Publishes that failed (no retry by design)
    pub publish_failures: u64,
    /// Link transport faults survived
    pub link_faults: u64,
}

/// The acquisition-to-publish pipeline driver
///
/// Owns the byte link, both sinks, the clock, and all per-sample stage
/// state for the process lifetime; nothing else touches them. Fields are
/// declared so that drop order releases the publisher, then storage, then
/// the link: the reverse of acquisition order at startup.
pub struct Pipeline<L, S, P, C>
where
    L: ByteLink,
    S: StorageSink,
    P: PublishSink,
    C: TimeSource,
{
    publisher: P,
    storage: S,
    link: L,
    clock: C,
    decoder: FrameDecoder,
    filter: SmoothingFilter,
    stats: SlidingStats,
    classifier: SigmaClassifier,
    channel: u16,
    state: DriverState,
    metrics: PipelineMetrics,
}

impl<L, S, P, C> Pipeline<L, S, P, C>
where
    L: ByteLink,
    S: StorageSink,
    P: PublishSink,
    C: TimeSource,
{
    /// Build a pipeline over already-opened resources
    ///
    /// Resource acquisition (opening the link, the store, the broker
    /// connection) happens before this call and aborts startup on failure;
    /// only stage configuration can be rejected here.
    pub fn new(
        config: PipelineConfig,
        link: L,
        storage: S,
        publisher: P,
        clock: C,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            publisher,
            storage,
            link,
            clock,
            decoder: FrameDecoder::with_header(config.header),
            filter: SmoothingFilter::new(config.alpha)?,
            stats: SlidingStats::with_window(config.window)?,
            classifier: SigmaClassifier::new(),
            channel: config.channel,
            state: DriverState::Running,
            metrics: PipelineMetrics::default(),
        })
    }

    /// Run one cycle: try to decode a sample and, if one arrives, process
    /// and dispatch it
    ///
    /// Returns:
    /// - `Ok(record)` - a sample was decoded and dispatched to both sinks
    /// - `Err(nb::Error::WouldBlock)` - no sample this cycle
    /// - `Err(nb::Error::Other(_))` - link transport fault, or the driver
    ///   is stopped
    pub fn poll(&mut self) -> nb::Result<SampleRecord, PipelineError<L::Error>> {
        if self.state == DriverState::Stopped {
            return Err(nb::Error::Other(PipelineError::Stopped));
        }

        let raw = self
            .decoder
            .poll_sample(&mut self.link)
            .map_err(|e| e.map(PipelineError::Link))?;

        Ok(self.process(raw))
    }

    /// Run the per-sample stages in fixed order, then dispatch
    /// storage-first
    fn process(&mut self, raw: u16) -> SampleRecord {
        let filtered = self.filter.apply(raw as f64);
        let stats = self.stats.observe(raw);
        let fault = self.classifier.classify(raw, stats.mean, stats.sigma);

        let record = SampleRecord::assemble(
            self.clock.now(),
            self.channel,
            raw,
            filtered,
            stats,
            fault,
        );

        self.metrics.records += 1;

        // Storage first: its failures are more consequential, and they
        // must not suppress the publish attempt.
        if let Err(e) = self.storage.append(&record) {
            self.metrics.storage_failures += 1;
            log::warn!("storage append failed: {}", e);
        }

        if let Err(e) = self.publisher.publish(&record) {
            self.metrics.publish_failures += 1;
            log::warn!("publish failed: {}", e);
        }

        record
    }

    /// Cycle until the stop flag is raised, then transition to the
    /// terminal stopped state
    ///
    /// The flag is checked between cycles; blocking inside a cycle is
    /// bounded by the link's read timeout. Returns the final counters.
    #[cfg(feature = "std")]
    pub fn run(&mut self, stop: &AtomicBool) -> Result<PipelineMetrics, PipelineError<L::Error>> {
        if self.state == DriverState::Stopped {
            return Err(PipelineError::Stopped);
        }

        log::info!(
            "pipeline running: channel={} window={} alpha={}",
            self.channel,
            self.stats.capacity(),
            self.filter.alpha()
        );

        while !stop.load(Ordering::Relaxed) {
            match self.poll() {
                Ok(record) => {
                    log::trace!(
                        "record: raw={} filtered={:.3} mean={:.3} sigma={:.3} fault={}",
                        record.raw,
                        record.filtered,
                        record.mean,
                        record.sigma,
                        record.fault
                    );
                }
                Err(nb::Error::WouldBlock) => {
                    std::thread::sleep(IDLE_WAIT);
                }
                Err(nb::Error::Other(PipelineError::Stopped)) => break,
                Err(nb::Error::Other(PipelineError::Link(e))) => {
                    self.metrics.link_faults += 1;
                    log::warn!("byte link fault: {}; resynchronizing", e);
                    // Bytes read before the fault cannot be trusted to
                    // belong to one frame.
                    self.decoder.reset();
                    if let Err(e) = self.link.discard_input() {
                        log::warn!("discarding link input failed: {}", e);
                    }
                    std::thread::sleep(LINK_BACKOFF);
                }
            }
        }

        self.state = DriverState::Stopped;
        log::info!(
            "pipeline stopped: {} records, {} storage failures, {} publish failures, {} link faults",
            self.metrics.records,
            self.metrics.storage_failures,
            self.metrics.publish_failures,
            self.metrics.link_faults
        );

        Ok(self.metrics)
    }

    /// Transition to the terminal stopped state without running
    pub fn stop(&mut self) {
        self.state = DriverState::Stopped;
    }

    /// Check whether the driver has reached its terminal state
    pub fn is_stopped(&self) -> bool {
        self.state == DriverState::Stopped
    }

    /// Counters accumulated so far
    pub fn metrics(&self) -> PipelineMetrics {
        self.metrics
    }
}
