//! Simulated bus assembly for running without hardware.

use crate::config::{SimulatedModuleConfig, SimulationConfig};
use tf_core::{HardwareType, SensorError, SensorResult};
use tf_driver_mock::{SimulatedBus, SimulatedModule};
use tracing::info;

/// Modules served when simulation is requested without a `[simulation]` section.
pub fn default_bench() -> SimulationConfig {
    let modules = [
        ("6wVE2R", HardwareType::IMU_V2),
        ("62Bous", HardwareType::GPS),
        ("dXj", HardwareType::HUMIDITY),
        ("Tf8", HardwareType::TEMPERATURE),
        ("yCA", HardwareType::AMBIENT_LIGHT_V2),
        ("kbQ", HardwareType::DISTANCE_US),
        ("6jDaVE", HardwareType::MASTER),
    ]
    .into_iter()
    .map(|(uid, type_code)| SimulatedModuleConfig {
        uid: uid.to_string(),
        type_code,
    })
    .collect();

    SimulationConfig {
        seed: None,
        mode: "instant".to_string(),
        modules,
    }
}

/// Build a simulated bus populated from `config`.
///
/// Each module gets its own jitter stream; with a seed the whole bench is
/// reproducible.
pub fn build_bus(config: &SimulationConfig) -> SensorResult<SimulatedBus> {
    let mode = config.mock_mode()?;
    let modules = config
        .modules
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let hardware = HardwareType::from_code(entry.type_code).ok_or_else(|| {
                SensorError::Configuration(format!(
                    "simulated module '{}' has unknown type code {}",
                    entry.uid, entry.type_code
                ))
            })?;
            let seed = config.seed.map(|s| s.wrapping_add(index as u64));
            Ok(SimulatedModule::new(entry.uid.clone(), hardware)
                .with_jitter(seed)
                .with_mode(mode))
        })
        .collect::<SensorResult<Vec<_>>>()?;

    info!(modules = modules.len(), ?mode, "Simulated bus ready");
    Ok(SimulatedBus::with_modules(modules))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_core::BusTransport;

    #[test]
    fn test_default_bench_is_valid() {
        let settings = crate::config::Settings {
            simulation: Some(default_bench()),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[tokio::test]
    async fn test_build_bus_serves_configured_modules() {
        let bus = build_bus(&default_bench()).unwrap();
        bus.connect("localhost", 4223).await.unwrap();
        assert!(bus.is_connected());
        assert_eq!(bus.open_count("6wVE2R"), 0);
    }

    #[test]
    fn test_unknown_type_code_rejected() {
        let config = SimulationConfig {
            seed: Some(1),
            mode: "instant".to_string(),
            modules: vec![SimulatedModuleConfig {
                uid: "x".to_string(),
                type_code: 1,
            }],
        };
        assert!(build_bus(&config).is_err());
    }
}
