//! # tf-sensors
//!
//! Discovers sensor modules on a brick bus, keeps one live descriptor per
//! sensor channel and publishes normalized telemetry on a fixed cadence.
//!
//! The library crates do the work:
//! - `tf-core`: shared types and the collaborator traits
//! - `tf-hardware`: registry, discovery, normalization, polling, service loop
//! - `tf-driver-mock`: simulated bus and recording sink
//!
//! This crate adds what a deployable binary needs on top:
//! - [`config`]: figment-based loading from TOML and the environment
//! - [`tracing_setup`]: subscriber initialization
//! - [`sink`]: JSON-lines, log and broadcast telemetry sinks
//! - [`simulation`]: simulated bus assembly from configuration

pub mod config;
pub mod simulation;
pub mod sink;
pub mod tracing_setup;

pub use config::{Settings, SinkKind};
pub use sink::{BroadcastSink, JsonLinesSink, LogSink, Published};
