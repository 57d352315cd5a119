//! Simulated hardware for tf-sensors.
//!
//! Stands in for the bus daemon and the sensor modules behind it, so the
//! registry, discovery and polling can be exercised without hardware.
//!
//! - [`SimulatedBus`] - [`tf_core::BusTransport`] with attachable modules
//! - [`SimulatedModule`] / [`SimulatedHandle`] - per-module readings and
//!   injected failures
//! - [`RecordingSink`] - [`tf_core::TelemetrySink`] that keeps every record
//!
//! # Example
//!
//! ```rust,ignore
//! use tf_driver_mock::{ErrorConfig, ErrorScenario, SimulatedBus, SimulatedModule};
//! use tf_core::{BusStatus, HardwareType, SampleKind};
//!
//! let bus = SimulatedBus::with_modules([
//!     SimulatedModule::new("6wVE2R", HardwareType::ImuV2),
//!     SimulatedModule::new("dXj", HardwareType::Humidity).with_errors(ErrorConfig::scenario(
//!         ErrorScenario::Status {
//!             operation: SampleKind::Humidity,
//!             status: BusStatus::Timeout,
//!         },
//!     )),
//! ]);
//! ```

pub mod common;
mod recording_sink;
mod simulated_bus;
mod simulated_module;

pub use common::{ErrorConfig, ErrorScenario, Injection, MockMode, MockRng};
pub use recording_sink::RecordingSink;
pub use simulated_bus::SimulatedBus;
pub use simulated_module::{default_samples, SimulatedHandle, SimulatedModule};
