//! Discovery Dispatcher
//!
//! Turns bus events into registry changes.
//!
//! - `Connected` requests an enumeration burst and changes nothing else.
//! - `Enumerate` with a new-module reason looks the type code up in
//!   [`construction_plan`], opens one handle through the [`BusTransport`],
//!   creates one descriptor per plan entry, then binds the module's
//!   configuration to all of them.
//! - `Enumerate` with the disconnected reason is ignored. Descriptors are only
//!   retired at shutdown.
//!
//! Re-announcements of a module that is already tracked (common after a bus
//! reconnect) are skipped before a handle is opened, so no handle leaks.
//!
//! A module is registered whole or not at all: if any descriptor of the plan
//! cannot be created, the ones already created are discarded and the handle
//! is destroyed before the error is returned.

use crate::descriptor::{DescriptorId, PhysicalModule};
use crate::registry::SensorRegistry;
use std::sync::Arc;
use tf_core::{
    BusEvent, BusTransport, ConfigProvider, EnumerationType, HandleOptions, HardwareType,
    SensorClass, SensorResult,
};
use tracing::{debug, error, info, warn};

// =============================================================================
// Construction Plan
// =============================================================================

/// How a descriptor's topic is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Naming {
    /// Use the configured topic if there is one, else generate
    Requested,
    /// Always generate
    Generated,
}

/// One descriptor to create for an announced module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorSpec {
    /// Class of the descriptor
    pub class: SensorClass,
    /// Hardware type the descriptor identifies as
    pub hardware: HardwareType,
    /// How its topic is chosen
    pub naming: Naming,
}

const fn single(class: SensorClass, hardware: HardwareType) -> DescriptorSpec {
    DescriptorSpec {
        class,
        hardware,
        naming: Naming::Requested,
    }
}

const IMU: &[DescriptorSpec] = &[single(SensorClass::Imu, HardwareType::Imu)];
const IMU_V2: &[DescriptorSpec] = &[
    single(SensorClass::Imu, HardwareType::ImuV2),
    DescriptorSpec {
        class: SensorClass::Magnetic,
        hardware: HardwareType::ImuV2Magnetic,
        naming: Naming::Generated,
    },
];
const AMBIENT_LIGHT: &[DescriptorSpec] = &[single(SensorClass::Light, HardwareType::AmbientLight)];
const AMBIENT_LIGHT_V2: &[DescriptorSpec] =
    &[single(SensorClass::Light, HardwareType::AmbientLightV2)];
const DISTANCE_IR: &[DescriptorSpec] = &[single(SensorClass::Range, HardwareType::DistanceIr)];
const DISTANCE_US: &[DescriptorSpec] = &[single(SensorClass::Range, HardwareType::DistanceUs)];
const HUMIDITY: &[DescriptorSpec] = &[single(SensorClass::Humidity, HardwareType::Humidity)];
const TEMPERATURE: &[DescriptorSpec] =
    &[single(SensorClass::Temperature, HardwareType::Temperature)];
const TEMPERATURE_IR: &[DescriptorSpec] =
    &[single(SensorClass::Temperature, HardwareType::TemperatureIr)];
const GPS: &[DescriptorSpec] = &[single(SensorClass::Gps, HardwareType::Gps)];
const DUAL_BUTTON: &[DescriptorSpec] = &[single(SensorClass::Misc, HardwareType::DualButton)];
const MOTION_DETECTOR: &[DescriptorSpec] =
    &[single(SensorClass::Misc, HardwareType::MotionDetector)];

/// Descriptors to create for a module of type `hardware`.
///
/// Empty for infrastructure modules and for the synthesized magnetometer type,
/// which the bus never announces.
pub fn construction_plan(hardware: HardwareType) -> &'static [DescriptorSpec] {
    match hardware {
        HardwareType::Master | HardwareType::ImuV2Magnetic => &[],
        HardwareType::Imu => IMU,
        HardwareType::ImuV2 => IMU_V2,
        HardwareType::AmbientLight => AMBIENT_LIGHT,
        HardwareType::AmbientLightV2 => AMBIENT_LIGHT_V2,
        HardwareType::DistanceIr => DISTANCE_IR,
        HardwareType::DistanceUs => DISTANCE_US,
        HardwareType::Humidity => HUMIDITY,
        HardwareType::Temperature => TEMPERATURE,
        HardwareType::TemperatureIr => TEMPERATURE_IR,
        HardwareType::Gps => GPS,
        HardwareType::DualButton => DUAL_BUTTON,
        HardwareType::MotionDetector => MOTION_DETECTOR,
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Why an event produced no descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The module left the bus
    Disconnected,
    /// The module is a brick or bridge, not a sensor
    Infrastructure,
    /// The type code is not recognized
    UnknownType,
    /// The module already has live descriptors
    AlreadyTracked,
}

/// Result of handling one bus event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// A `Connected` event triggered an enumeration request
    EnumerationRequested,
    /// Descriptors created from one `Enumerate` event
    Created(Vec<DescriptorId>),
    /// Nothing changed
    Ignored(IgnoreReason),
}

/// Applies bus events to a [`SensorRegistry`].
pub struct DiscoveryDispatcher {
    bus: Arc<dyn BusTransport>,
    config: Arc<dyn ConfigProvider>,
    options: HandleOptions,
}

impl DiscoveryDispatcher {
    /// Dispatcher opening handles on `bus` with `options`.
    pub fn new(
        bus: Arc<dyn BusTransport>,
        config: Arc<dyn ConfigProvider>,
        options: HandleOptions,
    ) -> Self {
        Self {
            bus,
            config,
            options,
        }
    }

    /// Handle one bus event.
    ///
    /// # Errors
    /// Failures requesting enumeration, opening a handle or advertising a
    /// channel. A module that fails part way leaves no descriptor behind.
    pub async fn handle_event(
        &self,
        registry: &mut SensorRegistry,
        event: BusEvent,
    ) -> SensorResult<DiscoveryOutcome> {
        match event {
            BusEvent::Connected { reason } => {
                debug!(?reason, "Bus connected, requesting enumeration");
                self.bus.enumerate().await?;
                Ok(DiscoveryOutcome::EnumerationRequested)
            }
            BusEvent::Enumerate {
                uid,
                type_code,
                enumeration_type,
                ..
            } => {
                self.handle_enumerate(registry, &uid, type_code, enumeration_type)
                    .await
            }
        }
    }

    async fn handle_enumerate(
        &self,
        registry: &mut SensorRegistry,
        uid: &str,
        type_code: u16,
        enumeration_type: EnumerationType,
    ) -> SensorResult<DiscoveryOutcome> {
        if !enumeration_type.is_new() {
            debug!(uid, type_code, "Ignoring disconnect announcement");
            return Ok(DiscoveryOutcome::Ignored(IgnoreReason::Disconnected));
        }

        let hardware = match HardwareType::from_code(type_code) {
            Some(hardware) if !hardware.is_synthesized() => hardware,
            _ => {
                warn!(uid, type_code, "Unknown device type, ignoring");
                return Ok(DiscoveryOutcome::Ignored(IgnoreReason::UnknownType));
            }
        };

        let plan = construction_plan(hardware);
        if plan.is_empty() {
            info!(uid, type_code, "Found {} module, not a sensor", hardware.name());
            return Ok(DiscoveryOutcome::Ignored(IgnoreReason::Infrastructure));
        }

        if registry.contains(uid, hardware) {
            debug!(uid, type_code, "Module already tracked, ignoring re-announcement");
            return Ok(DiscoveryOutcome::Ignored(IgnoreReason::AlreadyTracked));
        }

        info!(uid, type_code, "Found {} module", hardware.name());

        let handle = self.bus.open(uid, hardware, &self.options).await?;
        let module = PhysicalModule::new(handle);
        let config = self.config.lookup(uid);
        let requested = config.as_ref().and_then(|c| c.topic.as_deref());

        let mut created = Vec::with_capacity(plan.len());
        for spec in plan {
            let topic = match spec.naming {
                Naming::Requested => requested,
                Naming::Generated => None,
            };
            match registry.create(spec.class, spec.hardware, module.clone(), topic) {
                Ok(id) => created.push(id),
                Err(e) => {
                    warn!(uid, type_code, "Could not register {} module: {}", hardware.name(), e);
                    registry.discard(&created).await;
                    if let Err(release_err) = PhysicalModule::release(module).await {
                        error!(uid, type_code, "Failed to destroy device handle: {}", release_err);
                    }
                    return Err(e);
                }
            }
        }
        // Drop the local reference so descriptors are the only owners.
        drop(module);

        if let Some(config) = config {
            registry.bind_config(uid, &config.params);
        }

        Ok(DiscoveryOutcome::Created(created))
    }
}
