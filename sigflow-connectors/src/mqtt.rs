//! MQTT publish sink
//!
//! Fire-and-forget record publishing over MQTT. Records are serialized
//! to JSON and handed to the client's outgoing queue at QoS 0; a failed
//! hand-off is the caller's signal, and no retry is attempted. Delivery
//! to downstream consumers is explicitly not guaranteed.
//!
//! Connectivity is probed once at construction with a plain TCP dial so
//! a mistyped broker address fails the daemon at startup. After that the
//! background event loop owns reconnection: broker outages during
//! acquisition are logged and ride out on the client's own retry.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use rumqttc::{Client, ClientError, Connection, MqttOptions, QoS};
use sigflow_core::{PublishSink, SampleRecord};
use thiserror::Error;

use crate::ConnectionStats;

/// Outgoing queue capacity; at QoS 0 a full queue drops the publish
const QUEUE_CAPACITY: usize = 64;

/// Errors from the MQTT publisher
#[derive(Debug, Error)]
pub enum MqttError {
    /// The broker did not answer a TCP dial at startup
    #[error("mqtt broker {addr} is unreachable: {source}")]
    Unreachable {
        /// Broker address that was dialed
        addr: String,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// The broker address did not resolve
    #[error("mqtt broker address {0} did not resolve")]
    BadAddress(String),

    /// The client rejected the publish (queue full, disconnected)
    #[error("mqtt publish failed: {0}")]
    Client(#[from] ClientError),

    /// The record could not be serialized
    #[error("record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// MQTT broker and topic configuration
#[derive(Debug, Clone)]
pub struct MqttConfig {
    host: String,
    port: u16,
    topic: String,
    client_id: String,
    keep_alive: Duration,
}

impl MqttConfig {
    /// Configuration for the broker at `host:port`, publishing to
    /// `factory/signal` with a 60 second keep-alive
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            topic: "factory/signal".into(),
            client_id: "sigflow-etl".into(),
            keep_alive: Duration::from_secs(60),
        }
    }

    /// Set the publish topic
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Set the MQTT client id
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Set the keep-alive interval
    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Connect to the broker with this configuration
    pub fn connect(self) -> Result<MqttPublisher, MqttError> {
        MqttPublisher::connect(self)
    }
}

/// A fire-and-forget publish sink over MQTT
pub struct MqttPublisher {
    client: Client,
    topic: String,
    stats: ConnectionStats,
}

impl MqttPublisher {
    /// Probe the broker, then start the client and its background event
    /// loop
    pub fn connect(config: MqttConfig) -> Result<Self, MqttError> {
        let addr = format!("{}:{}", config.host, config.port);
        probe_broker(&addr)?;

        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(config.keep_alive);

        let (client, connection) = Client::new(options, QUEUE_CAPACITY);
        spawn_event_loop(connection);

        log::info!(
            "mqtt publisher connected: {} topic={} client_id={}",
            addr,
            config.topic,
            config.client_id
        );

        Ok(Self {
            client,
            topic: config.topic,
            stats: ConnectionStats::default(),
        })
    }

    /// Topic this publisher emits on
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Hand-off counters for this publisher
    pub fn stats(&self) -> ConnectionStats {
        self.stats
    }
}

impl PublishSink for MqttPublisher {
    type Error = MqttError;

    fn publish(&mut self, record: &SampleRecord) -> Result<(), Self::Error> {
        let payload = serde_json::to_vec(record)?;
        let bytes = payload.len();
        match self
            .client
            .try_publish(&self.topic, QoS::AtMostOnce, false, payload)
        {
            Ok(()) => {
                self.stats.record_sent(bytes);
                Ok(())
            }
            Err(e) => {
                self.stats.record_failure();
                Err(MqttError::Client(e))
            }
        }
    }
}

/// Fail fast on an unreachable broker; after startup the event loop
/// owns reconnection
fn probe_broker(addr: &str) -> Result<(), MqttError> {
    let resolved = addr
        .to_socket_addrs()
        .map_err(|source| MqttError::Unreachable {
            addr: addr.to_string(),
            source,
        })?
        .next()
        .ok_or_else(|| MqttError::BadAddress(addr.to_string()))?;

    TcpStream::connect_timeout(&resolved, Duration::from_secs(5))
        .map_err(|source| MqttError::Unreachable {
            addr: addr.to_string(),
            source,
        })?;
    Ok(())
}

/// Drain the client's event loop on a background thread for the process
/// lifetime; broker hiccups are logged, not propagated
fn spawn_event_loop(mut connection: Connection) {
    let spawned = std::thread::Builder::new()
        .name("mqtt-event-loop".into())
        .spawn(move || {
            for event in connection.iter() {
                match event {
                    Ok(event) => log::trace!("mqtt event: {:?}", event),
                    Err(e) => {
                        log::warn!("mqtt connection error: {}; retrying", e);
                        std::thread::sleep(Duration::from_secs(1));
                    }
                }
            }
        });
    if let Err(e) = spawned {
        log::error!("failed to spawn mqtt event loop: {}", e);
    }
}
