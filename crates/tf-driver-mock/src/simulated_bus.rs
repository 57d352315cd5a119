//! Simulated bus transport.
//!
//! Behaves like a bus daemon connection with a fixed set of attached
//! modules:
//!
//! - `connect` emits `Connected { reason: Request }` to every registered
//!   receiver, or fails with a configured bus status
//! - `enumerate` emits one `Enumerate { Available }` per module
//! - `open` constructs a [`SimulatedHandle`] and records it for inspection
//!
//! Tests drive hot-plugging with [`SimulatedBus::attach`] and
//! [`SimulatedBus::detach`], and a daemon reconnect with
//! [`SimulatedBus::reconnect`].

use crate::simulated_module::{SimulatedHandle, SimulatedModule};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tf_core::{
    BusEvent, BusStatus, BusTransport, ConnectReason, EnumerationType, HandleOptions,
    HardwareType, SensorError, SensorHandle, SensorResult,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Default)]
struct BusState {
    modules: Vec<SimulatedModule>,
    receivers: Vec<mpsc::UnboundedSender<BusEvent>>,
    connected: Option<(String, u16)>,
    connect_failure: Option<BusStatus>,
    /// Every handle ever opened, in order
    handles: Vec<Arc<SimulatedHandle>>,
    open_counts: HashMap<String, u32>,
    enumerate_count: u32,
    disconnect_count: u32,
}

impl BusState {
    fn emit(&mut self, event: BusEvent) {
        self.receivers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// In-process stand-in for a bus daemon connection.
#[derive(Default)]
pub struct SimulatedBus {
    state: Mutex<BusState>,
}

impl SimulatedBus {
    /// Empty, disconnected bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus with `modules` attached from the start.
    pub fn with_modules(modules: impl IntoIterator<Item = SimulatedModule>) -> Self {
        let bus = Self::new();
        bus.state.lock().modules.extend(modules);
        bus
    }

    /// Make the next `connect` fail with `status`.
    pub fn fail_connect(&self, status: BusStatus) {
        self.state.lock().connect_failure = Some(status);
    }

    /// Attach a module; announces it if the bus is connected.
    pub fn attach(&self, module: SimulatedModule) {
        let mut state = self.state.lock();
        let event = BusEvent::enumerate(&module.uid, module.type_code, EnumerationType::Connected);
        state.modules.push(module);
        if state.connected.is_some() {
            state.emit(event);
        }
    }

    /// Detach a module; announces the disconnect if the bus is connected.
    pub fn detach(&self, uid: &str) -> Option<SimulatedModule> {
        let mut state = self.state.lock();
        let index = state.modules.iter().position(|m| m.uid == uid)?;
        let module = state.modules.remove(index);
        if state.connected.is_some() {
            state.emit(BusEvent::enumerate(
                &module.uid,
                module.type_code,
                EnumerationType::Disconnected,
            ));
        }
        Some(module)
    }

    /// Simulate the transport reconnecting on its own.
    pub fn reconnect(&self) {
        let mut state = self.state.lock();
        if state.connected.is_some() {
            state.emit(BusEvent::Connected {
                reason: ConnectReason::AutoReconnect,
            });
        }
    }

    /// Push an arbitrary event to the receivers.
    pub fn announce(&self, event: BusEvent) {
        self.state.lock().emit(event);
    }

    /// Drop every registered receiver, closing their channels.
    pub fn close_receivers(&self) {
        self.state.lock().receivers.clear();
    }

    /// Whether `connect` succeeded and no disconnect followed.
    pub fn is_connected(&self) -> bool {
        self.state.lock().connected.is_some()
    }

    /// Address of the last successful `connect`.
    pub fn connected_to(&self) -> Option<(String, u16)> {
        self.state.lock().connected.clone()
    }

    /// Handles opened for `uid`, oldest first.
    pub fn handles(&self, uid: &str) -> Vec<Arc<SimulatedHandle>> {
        self.state
            .lock()
            .handles
            .iter()
            .filter(|h| h.uid() == uid)
            .cloned()
            .collect()
    }

    /// Most recent handle opened for `uid`.
    pub fn handle(&self, uid: &str) -> Option<Arc<SimulatedHandle>> {
        self.handles(uid).pop()
    }

    /// Number of handles opened for `uid`.
    pub fn open_count(&self, uid: &str) -> u32 {
        self.state.lock().open_counts.get(uid).copied().unwrap_or(0)
    }

    /// Total `destroy` calls across every handle opened for `uid`.
    pub fn destroy_count(&self, uid: &str) -> u32 {
        self.handles(uid).iter().map(|h| h.destroy_calls()).sum()
    }

    /// Number of enumeration requests.
    pub fn enumerate_count(&self) -> u32 {
        self.state.lock().enumerate_count
    }

    /// Number of `disconnect` calls.
    pub fn disconnect_count(&self) -> u32 {
        self.state.lock().disconnect_count
    }
}

#[async_trait]
impl BusTransport for SimulatedBus {
    async fn connect(&self, host: &str, port: u16) -> SensorResult<()> {
        let mut state = self.state.lock();
        if let Some(status) = state.connect_failure.take() {
            return Err(SensorError::Connection {
                host: host.to_string(),
                port,
                status,
            });
        }
        info!(host, port, modules = state.modules.len(), "Simulated bus connected");
        state.connected = Some((host.to_string(), port));
        state.emit(BusEvent::Connected {
            reason: ConnectReason::Request,
        });
        Ok(())
    }

    async fn enumerate(&self) -> SensorResult<()> {
        let mut state = self.state.lock();
        if state.connected.is_none() {
            return Err(SensorError::Read {
                uid: String::new(),
                what: "enumeration",
                status: BusStatus::NotConnected,
            });
        }
        state.enumerate_count += 1;
        let events: Vec<_> = state
            .modules
            .iter()
            .map(|m| BusEvent::enumerate(&m.uid, m.type_code, EnumerationType::Available))
            .collect();
        debug!(count = events.len(), "Simulated enumeration");
        for event in events {
            state.emit(event);
        }
        Ok(())
    }

    fn register_receiver(&self, sender: mpsc::UnboundedSender<BusEvent>) {
        self.state.lock().receivers.push(sender);
    }

    async fn open(
        &self,
        uid: &str,
        hardware: HardwareType,
        options: &HandleOptions,
    ) -> SensorResult<Arc<dyn SensorHandle>> {
        let mut state = self.state.lock();
        let module = state
            .modules
            .iter()
            .find(|m| m.uid == uid)
            .cloned()
            .ok_or_else(|| SensorError::Handle {
                uid: uid.to_string(),
                message: "no such module on the bus".to_string(),
            })?;

        let handle = Arc::new(SimulatedHandle::open(module, hardware, *options));
        state.handles.push(handle.clone());
        *state.open_counts.entry(uid.to_string()).or_insert(0) += 1;
        Ok(handle)
    }

    async fn disconnect(&self) -> SensorResult<()> {
        let mut state = self.state.lock();
        state.disconnect_count += 1;
        state.connected = None;
        info!("Simulated bus disconnected");
        Ok(())
    }
}

impl std::fmt::Debug for SimulatedBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SimulatedBus")
            .field("modules", &state.modules.len())
            .field("connected", &state.connected)
            .finish()
    }
}
