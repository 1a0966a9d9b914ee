//! Serial port byte link
//!
//! Adapts a platform serial device to the pipeline's `ByteLink` seam.
//! Reads are single-byte with a bounded timeout so the pipeline driver
//! keeps control of its own cycle: a quiet line surfaces as
//! `nb::Error::WouldBlock`, never as an error.

use std::io::{self, Read};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};
use sigflow_core::ByteLink;
use thiserror::Error;

/// Errors from the serial byte link
#[derive(Debug, Error)]
pub enum SerialError {
    /// The device could not be opened at startup
    #[error("failed to open serial device {path}: {source}")]
    Open {
        /// Device path that was tried
        path: String,
        /// Underlying port error
        #[source]
        source: serialport::Error,
    },

    /// Transport fault while reading
    #[error("serial I/O error: {0}")]
    Io(#[from] io::Error),

    /// Port-level fault (buffer control, settings)
    #[error("serial port error: {0}")]
    Port(#[from] serialport::Error),
}

/// Serial device configuration
#[derive(Debug, Clone)]
pub struct SerialConfig {
    path: String,
    baud_rate: u32,
    timeout: Duration,
}

impl SerialConfig {
    /// Configuration for the device at `path`, with 115200 baud and a
    /// one second read timeout
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: 115_200,
            timeout: Duration::from_millis(1000),
        }
    }

    /// Set the line speed
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the per-read timeout; expiry reads as "no byte yet", not as
    /// a fault
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Open the device with this configuration
    pub fn open(self) -> Result<SerialLink, SerialError> {
        SerialLink::open(self)
    }
}

/// A byte link over an open serial device
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    path: String,
}

impl SerialLink {
    /// Open the configured device, failing fast if it is absent
    pub fn open(config: SerialConfig) -> Result<Self, SerialError> {
        let port = serialport::new(&config.path, config.baud_rate)
            .timeout(config.timeout)
            .open()
            .map_err(|source| SerialError::Open {
                path: config.path.clone(),
                source,
            })?;

        log::info!(
            "serial link open: {} @ {} baud, {:?} read timeout",
            config.path,
            config.baud_rate,
            config.timeout
        );

        Ok(Self {
            port,
            path: config.path,
        })
    }

    /// Device path this link was opened on
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl ByteLink for SerialLink {
    type Error = SerialError;

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(1) => Ok(byte[0]),
            // A zero-length read means the timeout expired quietly
            Ok(_) => Err(nb::Error::WouldBlock),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Err(nb::Error::WouldBlock),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(SerialError::Io(e))),
        }
    }

    fn discard_input(&mut self) -> Result<(), Self::Error> {
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = SerialConfig::new("/dev/ttyUSB0");
        assert_eq!(config.path, "/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.timeout, Duration::from_millis(1000));
    }

    #[test]
    fn config_builder_overrides() {
        let config = SerialConfig::new("/dev/ttyACM1")
            .baud_rate(9600)
            .timeout(Duration::from_millis(250));
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.timeout, Duration::from_millis(250));
    }

    #[test]
    fn missing_device_fails_at_open() {
        let result = SerialConfig::new("/dev/does-not-exist-sigflow").open();
        match result {
            Err(SerialError::Open { path, .. }) => {
                assert_eq!(path, "/dev/does-not-exist-sigflow");
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("open of a missing device must fail"),
        }
    }
}
