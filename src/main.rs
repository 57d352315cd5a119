//! CLI entry point for tf-sensors
//!
//! Loads configuration, connects to the bus, then discovers and polls
//! sensors until Ctrl-C.
//!
//! # Usage
//!
//! ```bash
//! tfsensors --simulate --sink log --interval-ms 500
//! tfsensors --config config/tfsensors.toml --log-level debug
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tf_core::{BusTransport, ConfigProvider, TelemetrySink};
use tf_hardware::SensorService;
use tf_sensors::config::{Settings, SinkKind, DEFAULT_CONFIG_PATH};
use tf_sensors::sink::{JsonLinesSink, LogSink};
use tf_sensors::{simulation, tracing_setup};
use tracing::info;

#[derive(Parser)]
#[command(name = "tfsensors")]
#[command(about = "Publishes normalized telemetry from brick bus sensors", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Bus daemon host
    #[arg(long)]
    host: Option<String>,

    /// Bus daemon port
    #[arg(long)]
    port: Option<u16>,

    /// Polling interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Telemetry sink
    #[arg(long, value_enum)]
    sink: Option<CliSink>,

    /// Serve modules from the simulated bus
    #[arg(long)]
    simulate: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CliSink {
    Json,
    Log,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(host) = &self.host {
            settings.bus.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.bus.port = port;
        }
        if let Some(interval_ms) = self.interval_ms {
            settings.polling.interval_ms = interval_ms;
        }
        if let Some(level) = &self.log_level {
            settings.application.log_level = level.clone();
        }
        if let Some(sink) = self.sink {
            settings.sink.kind = match sink {
                CliSink::Json => SinkKind::Json,
                CliSink::Log => SinkKind::Log,
            };
        }
        if self.simulate && settings.simulation.is_none() {
            settings.simulation = Some(simulation::default_bench());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    cli.apply(&mut settings);
    settings.validate().context("invalid configuration")?;

    tracing_setup::init_from_settings(&settings).map_err(anyhow::Error::msg)?;

    let Some(simulated) = &settings.simulation else {
        bail!(
            "no bus transport available: the daemon wire protocol is not built in; \
             run with --simulate or add a [simulation] section"
        );
    };
    let bus: Arc<dyn BusTransport> = Arc::new(simulation::build_bus(simulated)?);

    let sink: Arc<dyn TelemetrySink> = match settings.sink.kind {
        SinkKind::Json => Arc::new(JsonLinesSink::stdout()),
        SinkKind::Log => Arc::new(LogSink::new()),
    };
    let provider: Arc<dyn ConfigProvider> = Arc::new(settings.provider()?);

    let mut service = SensorService::new(settings.service_config(), bus, sink, provider);
    service
        .start()
        .await
        .context("could not connect to the bus daemon")?;

    service
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Could not listen for Ctrl-C: {}", e);
            }
        })
        .await?;

    info!("Stopped");
    Ok(())
}
