//! Collaborator Interfaces
//!
//! This module defines the seams between the sensor core and the outside
//! world. The core consumes these traits; it never implements the bus wire
//! protocol or delivers telemetry itself.
//!
//! - [`BusTransport`]: connection to the bus daemon, enumeration, and handle
//!   construction for recognized hardware types
//! - [`SensorHandle`]: one live driver-level connection to a physical module
//! - [`TelemetrySink`]: receives normalized records per channel
//! - [`ConfigProvider`]: per-address topic override and parameters
//!
//! # Design
//!
//! Each trait:
//! - Is thread-safe (requires Send + Sync)
//! - Uses [`SensorResult`] for errors
//! - Is async where the operation may block on bus I/O (#[async_trait])
//!
//! # Example
//!
//! ```rust,ignore
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! bus.register_receiver(tx);
//! bus.connect("localhost", 4223).await?;
//!
//! while let Some(event) = rx.recv().await {
//!     if let BusEvent::Enumerate { uid, type_code, .. } = event {
//!         println!("{} announced type {}", uid, type_code);
//!     }
//! }
//! ```

use crate::error::SensorResult;
use crate::params::SensorConfig;
use crate::record::SensorRecord;
use crate::sample::{RawSample, SampleKind};
use crate::sensor::{HardwareType, SensorClass};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

// =============================================================================
// Bus Events
// =============================================================================

/// Why the bus connection was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectReason {
    /// Explicit connect call
    Request,
    /// Transport reconnected on its own
    AutoReconnect,
}

/// Why a module was announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumerationType {
    /// Answer to an enumeration request
    Available,
    /// Module was plugged in or powered up
    Connected,
    /// Module went away
    Disconnected,
}

impl EnumerationType {
    /// Both `Available` and `Connected` announce a new module.
    pub fn is_new(&self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}

/// Events delivered by the bus transport to its registered receiver.
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    /// The transport (re)connected to the daemon
    Connected { reason: ConnectReason },
    /// A module was announced or retracted
    Enumerate {
        /// Opaque bus-assigned address
        uid: String,
        /// Address of the module this one is attached to
        connected_uid: String,
        /// Port position on the parent module
        position: char,
        hardware_version: [u8; 3],
        firmware_version: [u8; 3],
        /// Numeric hardware type
        type_code: u16,
        enumeration_type: EnumerationType,
    },
}

impl BusEvent {
    /// Shorthand for an `Enumerate` event with only the fields the core uses.
    pub fn enumerate(
        uid: impl Into<String>,
        type_code: u16,
        enumeration_type: EnumerationType,
    ) -> Self {
        Self::Enumerate {
            uid: uid.into(),
            connected_uid: String::new(),
            position: '0',
            hardware_version: [1, 0, 0],
            firmware_version: [2, 0, 0],
            type_code,
            enumeration_type,
        }
    }
}

// =============================================================================
// Device Handle
// =============================================================================

/// Options applied by the transport when constructing a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandleOptions {
    /// IMU (variant A) orientation filter convergence speed
    pub imu_convergence_speed: u16,
}

/// Capability: Raw Device Reads
///
/// One live handle per physical module, constructed by [`BusTransport::open`].
///
/// # Contract
/// - `read` returns the sample matching `kind`, or [`crate::SensorError::Read`]
///   carrying the negative bus status
/// - `read` may block on bus I/O; callers bound it with a timeout
/// - `destroy` releases the driver object; callers invoke it exactly once
#[async_trait]
pub trait SensorHandle: Send + Sync {
    /// Bus address of the module.
    fn uid(&self) -> &str;

    /// Hardware type the handle was constructed for.
    fn hardware(&self) -> HardwareType;

    /// Read one raw sample.
    async fn read(&self, kind: SampleKind) -> SensorResult<RawSample>;

    /// Release the handle (LEDs off for IMUs, then driver teardown).
    async fn destroy(&self) -> SensorResult<()>;
}

// =============================================================================
// Bus Transport
// =============================================================================

/// Capability: Bus Connection and Discovery
///
/// # Contract
/// - Events are pushed to every receiver registered before they occur
/// - `enumerate` only requests an announcement burst; results arrive as
///   [`BusEvent::Enumerate`] events
/// - `open` constructs a handle for a recognized hardware type and applies
///   construction side effects (IMU LEDs, convergence speed)
/// - `disconnect` is called once, after every handle has been destroyed
#[async_trait]
pub trait BusTransport: Send + Sync {
    /// Connect to the bus daemon.
    async fn connect(&self, host: &str, port: u16) -> SensorResult<()>;

    /// Request that every module announce itself.
    async fn enumerate(&self) -> SensorResult<()>;

    /// Register the receiver for [`BusEvent`]s.
    fn register_receiver(&self, sender: mpsc::UnboundedSender<BusEvent>);

    /// Construct a handle for the module at `uid`.
    async fn open(
        &self,
        uid: &str,
        hardware: HardwareType,
        options: &HandleOptions,
    ) -> SensorResult<Arc<dyn SensorHandle>>;

    /// Close the connection.
    async fn disconnect(&self) -> SensorResult<()>;
}

// =============================================================================
// Telemetry Sink
// =============================================================================

/// Output channel binding, resolved once per descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel {
    topic: Arc<str>,
    class: SensorClass,
}

impl Channel {
    /// Channel on `topic` carrying records of `class`.
    pub fn new(topic: &str, class: SensorClass) -> Self {
        Self {
            topic: Arc::from(topic),
            class,
        }
    }

    /// Topic records are published on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Class of the records on this channel.
    pub fn class(&self) -> SensorClass {
        self.class
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.topic)
    }
}

/// Capability: Telemetry Delivery
///
/// # Contract
/// - `advertise` is called once per descriptor, at creation
/// - `publish` receives records only for advertised channels
/// - A failing `publish` affects only the record being published
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Resolve a channel for `topic`.
    fn advertise(&self, topic: &str, class: SensorClass) -> SensorResult<Channel>;

    /// Deliver one record.
    async fn publish(&self, channel: &Channel, record: SensorRecord) -> SensorResult<()>;
}

// =============================================================================
// Configuration Provider
// =============================================================================

/// Per-address configuration lookup.
pub trait ConfigProvider: Send + Sync {
    /// Configuration for the module at `uid`, if any.
    fn lookup(&self, uid: &str) -> Option<SensorConfig>;
}

impl ConfigProvider for HashMap<String, SensorConfig> {
    fn lookup(&self, uid: &str) -> Option<SensorConfig> {
        self.get(uid).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn test_enumeration_type_is_new() {
        assert!(EnumerationType::Available.is_new());
        assert!(EnumerationType::Connected.is_new());
        assert!(!EnumerationType::Disconnected.is_new());
    }

    #[test]
    fn test_map_provider_lookup() {
        let mut map = HashMap::new();
        let mut config = SensorConfig::default();
        config.params.insert("max", ParamValue::Float(2.5));
        map.insert("abc".to_string(), config.clone());

        assert_eq!(map.lookup("abc"), Some(config));
        assert_eq!(map.lookup("xyz"), None);
    }

    #[test]
    fn test_channel_accessors() {
        let channel = Channel::new("/tfsensors/imu1", SensorClass::Imu);
        assert_eq!(channel.topic(), "/tfsensors/imu1");
        assert_eq!(channel.class(), SensorClass::Imu);
        assert_eq!(channel.to_string(), "/tfsensors/imu1");
    }
}
