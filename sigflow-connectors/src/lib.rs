//! I/O Adapters for the Sigflow Acquisition Pipeline
//!
//! ## Overview
//!
//! This crate binds the transport-agnostic pipeline in `sigflow-core` to
//! real devices and services. Each adapter lives behind its own feature
//! gate so deployments only compile the backends they use:
//!
//! | Adapter | Feature  | Backend      | Pipeline seam      |
//! |---------|----------|--------------|--------------------|
//! | Serial  | `serial` | `serialport` | `ByteLink`         |
//! | SQLite  | `sqlite` | `rusqlite`   | `StorageSink`      |
//! | MQTT    | `mqtt`   | `rumqttc`    | `PublishSink`      |
//!
//! ## Failure Semantics
//!
//! All three adapters open their resource eagerly in their constructor,
//! so a missing serial device, an unwritable database path, or an
//! unreachable broker fails the process at startup rather than
//! mid-acquisition. After startup the adapters follow the pipeline's
//! per-sink contract:
//!
//! - Serial read timeouts surface as `nb::Error::WouldBlock`, not as
//!   faults; only transport errors reach the pipeline driver.
//! - SQLite appends are synchronous and report failure per record.
//! - MQTT publishes are fire-and-forget: the publish is handed to the
//!   client's queue and failures are reported without retry.

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(feature = "serial")]
pub mod serial;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "mqtt")]
pub mod mqtt;

#[cfg(feature = "serial")]
pub use serial::{SerialConfig, SerialError, SerialLink};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteError, SqliteStore, Summary};

#[cfg(feature = "mqtt")]
pub use mqtt::{MqttConfig, MqttError, MqttPublisher};

/// Counters common to all adapters, for operator visibility
#[derive(Debug, Default, Clone, Copy)]
pub struct ConnectionStats {
    /// Messages or records handed off successfully
    pub sent: u64,
    /// Messages or records that failed at hand-off
    pub failed: u64,
    /// Payload bytes handed off successfully
    pub bytes_sent: u64,
}

impl ConnectionStats {
    /// Record a successful hand-off of `bytes` payload bytes
    pub fn record_sent(&mut self, bytes: usize) {
        self.sent += 1;
        self.bytes_sent += bytes as u64;
    }

    /// Record a failed hand-off
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }
}
