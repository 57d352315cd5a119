//! Sensor management for tf-sensors.
//!
//! This crate turns bus announcements into live sensor descriptors and turns
//! their raw readings into normalized telemetry on a periodic cycle.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  BusEvent   ┌─────────────────────┐  create/bind   ┌────────────────┐
//! │ BusTransport │ ──────────▶ │ DiscoveryDispatcher │ ─────────────▶ │ SensorRegistry │
//! └──────────────┘             └─────────────────────┘                └────────────────┘
//!                                                                             │ iterate
//!                                                                             ▼
//! ┌───────────────┐  publish   ┌────────────┐  raw sample   ┌──────────────────────────┐
//! │ TelemetrySink │ ◀───────── │ normalize  │ ◀──────────── │ PollingDispatcher        │
//! └───────────────┘            └────────────┘               └──────────────────────────┘
//! ```
//!
//! [`service::SensorService`] owns all of it and runs discovery and polling
//! on one task, so the registry needs no lock.

pub mod descriptor;
pub mod discovery;
pub mod normalize;
pub mod polling;
pub mod registry;
pub mod service;
pub mod topic;

pub use descriptor::{DescriptorId, PhysicalModule, SensorDescriptor};
pub use discovery::{
    construction_plan, DescriptorSpec, DiscoveryDispatcher, DiscoveryOutcome, IgnoreReason, Naming,
};
pub use polling::{CycleReport, PollingDispatcher};
pub use registry::SensorRegistry;
pub use service::{BusAddress, SensorService, ServiceConfig};
pub use topic::TopicNamer;
