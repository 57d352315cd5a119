//! Sensor Service
//!
//! Owns the registry and both dispatchers and runs them on one task:
//!
//! ```text
//! loop {
//!     select! {
//!         shutdown          => break,
//!         event = bus_rx    => discovery.handle_event(&mut registry, event),
//!         _ = interval.tick => polling.publish_all(&mut registry),
//!     }
//! }
//! registry.destroy_all();
//! bus.disconnect();
//! ```
//!
//! Bus callbacks are marshaled onto this loop through an unbounded channel,
//! so a discovery step and a polling pass never overlap and the registry
//! needs no lock.

use crate::discovery::DiscoveryDispatcher;
use crate::polling::{CycleReport, PollingDispatcher};
use crate::registry::SensorRegistry;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tf_core::{
    BusEvent, BusTransport, ConfigProvider, HandleOptions, SensorError, SensorResult,
    TelemetrySink,
};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Daemon port used when none (or a reserved one) is configured.
pub const DEFAULT_PORT: u16 = 4223;

/// Daemon host used when none is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// Ports at or below this value are replaced with [`DEFAULT_PORT`].
const RESERVED_PORT_LIMIT: u16 = 1000;

/// Bus daemon address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusAddress {
    /// Daemon host name
    pub host: String,
    /// Daemon port
    pub port: u16,
}

impl BusAddress {
    /// Build an address, substituting defaults for an empty host or a port
    /// at or below 1000.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            host: if host.is_empty() {
                DEFAULT_HOST.to_string()
            } else {
                host
            },
            port: if port <= RESERVED_PORT_LIMIT {
                DEFAULT_PORT
            } else {
                port
            },
        }
    }
}

impl Default for BusAddress {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

/// Runtime settings of the service loop.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bus daemon address
    pub address: BusAddress,
    /// Cadence of `publish_all`
    pub poll_interval: Duration,
    /// Bound on each handle read
    pub read_timeout: Duration,
    /// Options applied when opening handles
    pub handle_options: HandleOptions,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            address: BusAddress::default(),
            poll_interval: Duration::from_millis(100),
            read_timeout: Duration::from_millis(250),
            handle_options: HandleOptions::default(),
        }
    }
}

/// Discovery plus polling over one bus connection.
pub struct SensorService {
    config: ServiceConfig,
    bus: Arc<dyn BusTransport>,
    registry: SensorRegistry,
    discovery: DiscoveryDispatcher,
    polling: PollingDispatcher,
    events: Option<mpsc::UnboundedReceiver<BusEvent>>,
    disconnected: bool,
}

impl SensorService {
    /// Service over `bus`, publishing to `sink`.
    pub fn new(
        config: ServiceConfig,
        bus: Arc<dyn BusTransport>,
        sink: Arc<dyn TelemetrySink>,
        provider: Arc<dyn ConfigProvider>,
    ) -> Self {
        let registry = SensorRegistry::new(sink.clone());
        let discovery = DiscoveryDispatcher::new(bus.clone(), provider, config.handle_options);
        let polling = PollingDispatcher::new(sink, config.read_timeout);
        Self {
            config,
            bus,
            registry,
            discovery,
            polling,
            events: None,
            disconnected: false,
        }
    }

    /// Runtime settings.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Live descriptors.
    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    /// Register for bus events, then connect.
    ///
    /// # Errors
    /// Connection failure is fatal; the service must not be run afterwards.
    pub async fn start(&mut self) -> SensorResult<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.bus.register_receiver(tx);
        self.events = Some(rx);

        let address = &self.config.address;
        info!(host = %address.host, port = address.port, "Connecting to bus daemon");
        if let Err(e) = self.bus.connect(&address.host, address.port).await {
            error!(host = %address.host, port = address.port, "Could not connect: {}", e);
            self.events = None;
            return Err(e);
        }
        Ok(())
    }

    /// Handle every bus event already queued, without waiting.
    ///
    /// Returns the number of events handled.
    pub async fn process_pending_events(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let event = match self.events.as_mut().map(|rx| rx.try_recv()) {
                Some(Ok(event)) => event,
                _ => break,
            };
            self.dispatch(event).await;
            handled += 1;
        }
        handled
    }

    /// Run one polling pass.
    pub async fn poll_once(&mut self) -> CycleReport {
        self.polling.publish_all(&mut self.registry).await
    }

    async fn dispatch(&mut self, event: BusEvent) {
        if let Err(e) = self.discovery.handle_event(&mut self.registry, event).await {
            warn!("Discovery step failed: {}", e);
        }
    }

    /// Run until `shutdown` resolves or the bus event channel closes, then
    /// tear down.
    ///
    /// # Errors
    /// [`SensorError::Configuration`] if called before a successful
    /// [`Self::start`].
    pub async fn run<F>(&mut self, shutdown: F) -> SensorResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        let mut events = self.events.take().ok_or_else(|| {
            SensorError::Configuration("sensor service run before start".to_string())
        })?;

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(
            interval_ms = self.config.poll_interval.as_millis() as u64,
            "Sensor service running"
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => self.dispatch(event).await,
                    None => {
                        warn!("Bus event channel closed, stopping");
                        break;
                    }
                },
                _ = ticker.tick() => {
                    let report = self.polling.publish_all(&mut self.registry).await;
                    if report.failed > 0 {
                        debug!(failed = report.failed, published = report.published, "Cycle had failures");
                    }
                }
            }
        }

        self.shutdown().await
    }

    /// Destroy every descriptor, then disconnect the bus once.
    ///
    /// Safe to call repeatedly.
    pub async fn shutdown(&mut self) -> SensorResult<()> {
        let released = self.registry.destroy_all().await;
        if self.disconnected {
            return Ok(());
        }
        self.disconnected = true;
        self.events = None;
        info!(released, "Disconnecting from bus daemon");
        self.bus.disconnect().await
    }
}
