//! Sigflow acquisition daemon
//!
//! Reads framed sensor samples from a serial device, runs the smoothing,
//! statistics, and fault classification stages, and dispatches each
//! record to SQLite (durable) and MQTT (fire-and-forget). Runs until
//! interrupted; Ctrl-C stops the pipeline cleanly between samples.
//!
//! All three resources are opened before the first sample is processed,
//! so a missing device, unwritable database, or unreachable broker fails
//! the process immediately with a nonzero exit.

mod config;

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use sigflow_connectors::{MqttConfig, MqttError, SerialConfig, SerialError, SqliteError, SqliteStore};
use sigflow_core::{ConfigError, Pipeline, PipelineError, SystemClock};

use config::EtlConfig;

/// Serial sensor acquisition daemon
#[derive(Parser, Debug)]
#[command(name = "sigflow-etl", version, about)]
struct Args {
    /// Path to the TOML configuration file (optional; environment
    /// variables and defaults apply regardless)
    #[arg(short, long, default_value = "sigflow.toml")]
    config: String,
}

/// Fatal daemon errors; everything here aborts startup or ends the run
#[derive(Debug, Error)]
enum EtlError {
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("pipeline configuration rejected: {0}")]
    PipelineConfig(#[from] ConfigError),

    #[error(transparent)]
    Serial(#[from] SerialError),

    #[error(transparent)]
    Storage(#[from] SqliteError),

    #[error(transparent)]
    Mqtt(#[from] MqttError),

    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), EtlError> {
    let args = Args::parse();

    let config = EtlConfig::load_from(&args.config)?;
    config.validate().map_err(EtlError::Invalid)?;

    // Resource acquisition order: link, storage, broker. Any failure
    // here is fatal before a single sample is read.
    let link = SerialConfig::new(&config.link.device)
        .baud_rate(config.link.baud_rate)
        .timeout(Duration::from_millis(config.link.read_timeout_ms))
        .open()?;

    let storage = SqliteStore::open(&config.storage.database)?;

    let publisher = MqttConfig::new(&config.mqtt.host, config.mqtt.port)
        .topic(&config.mqtt.topic)
        .client_id(&config.mqtt.client_id)
        .connect()?;

    let mut pipeline = Pipeline::new(config.pipeline(), link, storage, publisher, SystemClock)?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        log::info!("stop requested");
        stop_flag.store(true, Ordering::Relaxed);
    })?;

    log::info!(
        "acquiring from {} -> {} and mqtt://{}:{}/{}",
        config.link.device,
        config.storage.database.display(),
        config.mqtt.host,
        config.mqtt.port,
        config.mqtt.topic
    );

    match pipeline.run(&stop) {
        Ok(metrics) => {
            log::info!("shutdown complete after {} records", metrics.records);
            Ok(())
        }
        Err(PipelineError::Stopped) => Ok(()),
        Err(PipelineError::Link(e)) => Err(e.into()),
    }
}
