//! Daemon configuration
//!
//! Configuration is loaded from:
//! 1. A TOML file (optional; by default `sigflow.toml` if present)
//! 2. Environment variables prefixed with `SIGFLOW_`
//!
//! Environment variables override the file, with `__` separating nested
//! keys. Example: `SIGFLOW_LINK__DEVICE=/dev/ttyACM0`.
//!
//! Every field has a default, so the daemon starts with no configuration
//! at all against the conventional local setup.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use sigflow_core::{PipelineConfig, DEFAULT_HEADER, MAX_WINDOW};

/// Top-level daemon configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EtlConfig {
    /// Serial link settings
    #[serde(default)]
    pub link: LinkConfig,
    /// Per-channel processing settings
    #[serde(default)]
    pub processing: ProcessingConfig,
    /// SQLite storage settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// MQTT publish settings
    #[serde(default)]
    pub mqtt: MqttSection,
}

/// Serial link settings
#[derive(Debug, Clone, Deserialize)]
pub struct LinkConfig {
    /// Serial device path
    #[serde(default = "default_device")]
    pub device: String,
    /// Line speed
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Per-read timeout in milliseconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
    /// Frame header byte
    #[serde(default = "default_header")]
    pub header: u8,
}

/// Per-channel processing settings
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingConfig {
    /// Channel id stamped into every record
    #[serde(default)]
    pub channel: u16,
    /// IIR smoothing coefficient in [0, 1]
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Sliding statistics window in samples
    #[serde(default = "default_window")]
    pub window: usize,
}

/// SQLite storage settings
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Database file path
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

/// MQTT publish settings
#[derive(Debug, Clone, Deserialize)]
pub struct MqttSection {
    /// Broker hostname
    #[serde(default = "default_mqtt_host")]
    pub host: String,
    /// Broker port
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    /// Publish topic
    #[serde(default = "default_mqtt_topic")]
    pub topic: String,
    /// MQTT client id
    #[serde(default = "default_client_id")]
    pub client_id: String,
}

fn default_device() -> String {
    "/dev/ttyUSB0".into()
}

fn default_baud_rate() -> u32 {
    115_200
}

fn default_read_timeout() -> u64 {
    1000
}

fn default_header() -> u8 {
    DEFAULT_HEADER
}

fn default_alpha() -> f64 {
    0.5
}

fn default_window() -> usize {
    64
}

fn default_database() -> PathBuf {
    PathBuf::from("data/signals.db")
}

fn default_mqtt_host() -> String {
    "localhost".into()
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_mqtt_topic() -> String {
    "factory/signal".into()
}

fn default_client_id() -> String {
    "sigflow-etl".into()
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout(),
            header: default_header(),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            alpha: default_alpha(),
            window: default_window(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
        }
    }
}

impl Default for MqttSection {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            topic: default_mqtt_topic(),
            client_id: default_client_id(),
        }
    }
}

impl EtlConfig {
    /// Load configuration from a TOML file and `SIGFLOW_` environment
    /// variables
    ///
    /// A missing file is not an error; the environment and defaults
    /// still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("SIGFLOW_").split("__"))
            .extract()
    }

    /// Validate ranges the type system cannot express
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.processing.alpha) {
            return Err(format!(
                "processing.alpha must be in [0, 1], got {}",
                self.processing.alpha
            ));
        }
        if self.processing.window == 0 || self.processing.window > MAX_WINDOW {
            return Err(format!(
                "processing.window must be in 1..={}, got {}",
                MAX_WINDOW, self.processing.window
            ));
        }
        if self.link.read_timeout_ms == 0 {
            return Err("link.read_timeout_ms must be nonzero".into());
        }
        if self.mqtt.topic.is_empty() {
            return Err("mqtt.topic must not be empty".into());
        }
        Ok(())
    }

    /// The pipeline view of this configuration
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            channel: self.processing.channel,
            alpha: self.processing.alpha,
            window: self.processing.window,
            header: self.link.header,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_any_input() {
        figment::Jail::expect_with(|_| {
            let config = EtlConfig::load_from("missing.toml")?;
            assert_eq!(config.link.device, "/dev/ttyUSB0");
            assert_eq!(config.link.baud_rate, 115_200);
            assert_eq!(config.link.header, 0xA5);
            assert_eq!(config.processing.alpha, 0.5);
            assert_eq!(config.processing.window, 64);
            assert_eq!(config.storage.database, PathBuf::from("data/signals.db"));
            assert_eq!(config.mqtt.host, "localhost");
            assert_eq!(config.mqtt.port, 1883);
            assert_eq!(config.mqtt.topic, "factory/signal");
            assert!(config.validate().is_ok());
            Ok(())
        });
    }

    #[test]
    fn toml_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "sigflow.toml",
                r#"
                [link]
                device = "/dev/ttyACM2"
                baud_rate = 57600

                [processing]
                channel = 3
                window = 128

                [mqtt]
                topic = "plant/a/signal"
                "#,
            )?;

            let config = EtlConfig::load_from("sigflow.toml")?;
            assert_eq!(config.link.device, "/dev/ttyACM2");
            assert_eq!(config.link.baud_rate, 57_600);
            assert_eq!(config.processing.channel, 3);
            assert_eq!(config.processing.window, 128);
            assert_eq!(config.mqtt.topic, "plant/a/signal");
            // Untouched sections keep their defaults
            assert_eq!(config.processing.alpha, 0.5);
            assert_eq!(config.mqtt.port, 1883);
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "sigflow.toml",
                r#"
                [link]
                device = "/dev/ttyUSB1"
                "#,
            )?;
            jail.set_env("SIGFLOW_LINK__DEVICE", "/dev/ttyS9");
            jail.set_env("SIGFLOW_PROCESSING__ALPHA", "0.9");

            let config = EtlConfig::load_from("sigflow.toml")?;
            assert_eq!(config.link.device, "/dev/ttyS9");
            assert_eq!(config.processing.alpha, 0.9);
            Ok(())
        });
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut config = EtlConfig::load_from("missing.toml").unwrap();
        config.processing.alpha = 1.5;
        assert!(config.validate().is_err());

        config.processing.alpha = 0.5;
        config.processing.window = 0;
        assert!(config.validate().is_err());

        config.processing.window = MAX_WINDOW + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn pipeline_view_carries_processing_settings() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SIGFLOW_PROCESSING__CHANNEL", "5");
            jail.set_env("SIGFLOW_LINK__HEADER", "90");

            let config = EtlConfig::load_from("missing.toml")?;
            let pipeline = config.pipeline();
            assert_eq!(pipeline.channel, 5);
            assert_eq!(pipeline.header, 90);
            assert_eq!(pipeline.window, 64);
            Ok(())
        });
    }
}
