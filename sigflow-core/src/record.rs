//! Sample Record Schema
//!
//! One immutable record per decoded frame, combining the raw sample with
//! every derived metric as they existed at that instant. Records are the
//! unit handed to both sinks and the shape persisted and published, so the
//! field set is an explicit, versioned schema rather than an ad hoc
//! payload:
//!
//! | field     | type | meaning                                   |
//! |-----------|------|-------------------------------------------|
//! | timestamp | f64  | wall-clock seconds at assembly            |
//! | channel   | u16  | fixed channel id of this process instance |
//! | raw       | u16  | decoded 12-bit sample                     |
//! | filtered  | f64  | IIR-smoothed output                       |
//! | mean      | f64  | post-append window mean                   |
//! | sigma     | f64  | post-append population std deviation      |
//! | fault     | bool | 3-sigma anomaly flag                      |
//!
//! Schema evolution appends fields, never removes or renames them; bump
//! [`SCHEMA_VERSION`] on any change.

use crate::stats::WindowStats;
use crate::time::Timestamp;

/// Version of the record field set
pub const SCHEMA_VERSION: u16 = 1;

/// One enriched sample, immutable after assembly
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleRecord {
    /// Wall-clock seconds at assembly time
    pub timestamp: f64,
    /// Channel id, fixed per process instance
    pub channel: u16,
    /// Decoded raw sample (0..=4095)
    pub raw: u16,
    /// Smoothed value from the streaming filter
    pub filtered: f64,
    /// Window mean including this sample
    pub mean: f64,
    /// Window population standard deviation including this sample
    pub sigma: f64,
    /// True if the sample deviated anomalously from the baseline
    pub fault: bool,
}

impl SampleRecord {
    /// Assemble a record from the per-sample stage outputs
    ///
    /// Pure composition: no I/O, no error conditions. `timestamp_ms` is
    /// converted to the schema's wall-clock seconds here, in one place.
    pub fn assemble(
        timestamp_ms: Timestamp,
        channel: u16,
        raw: u16,
        filtered: f64,
        stats: WindowStats,
        fault: bool,
    ) -> Self {
        Self {
            timestamp: timestamp_ms as f64 / 1000.0,
            channel,
            raw,
            filtered,
            mean: stats.mean,
            sigma: stats.sigma,
            fault,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> SampleRecord {
        SampleRecord::assemble(
            1_700_000_000_500,
            3,
            768,
            384.0,
            WindowStats {
                mean: 768.0,
                sigma: 0.0,
            },
            false,
        )
    }

    #[test]
    fn assembles_seconds_from_milliseconds() {
        let record = sample_record();
        assert_eq!(record.timestamp, 1_700_000_000.5);
        assert_eq!(record.channel, 3);
        assert_eq!(record.raw, 768);
        assert_eq!(record.filtered, 384.0);
        assert!(!record.fault);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_with_schema_field_names() {
        let record = sample_record();
        let json = serde_json::to_value(record).unwrap();

        for field in ["timestamp", "channel", "raw", "filtered", "mean", "sigma", "fault"] {
            assert!(json.get(field).is_some(), "missing field {}", field);
        }
        assert_eq!(json["raw"], 768);
        assert_eq!(json["fault"], false);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn round_trips_through_json() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: SampleRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
