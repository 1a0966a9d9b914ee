//! Sink traits at the pipeline's dispatch seam
//!
//! The driver dispatches every assembled record to a storage sink and a
//! publish sink. These traits keep the core free of any concrete transport;
//! the adapters in `sigflow-connectors` implement them over SQLite and
//! MQTT, and tests implement them over plain vectors.
//!
//! Failure semantics differ by sink and are part of the contract:
//! storage is a durable append whose failures matter (they are logged and
//! counted, and the record is lost to storage only), publishing is
//! fire-and-forget and never retried synchronously. Neither failure halts
//! the cycle or touches filter/window state.

use crate::record::SampleRecord;
use core::fmt;

/// Durable, append-only record store
///
/// `append` must be safe to retry: a duplicate row caused by a retry is
/// acceptable, exactly-once delivery is a non-goal. Records are appended
/// in arrival order, one call per record.
pub trait StorageSink {
    /// Sink failure type
    type Error: fmt::Display;

    /// Append one record
    fn append(&mut self, record: &SampleRecord) -> Result<(), Self::Error>;
}

/// Best-effort record publisher
///
/// No delivery guarantee. Implementations must be bounded: a slow or dead
/// broker fails the call rather than stalling the acquisition cycle.
pub trait PublishSink {
    /// Sink failure type
    type Error: fmt::Display;

    /// Publish one record, fire-and-forget
    fn publish(&mut self, record: &SampleRecord) -> Result<(), Self::Error>;
}
