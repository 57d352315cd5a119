//! Configuration loading using Figment
//!
//! Configuration is loaded from:
//! 1. a TOML file (base configuration, `config/tfsensors.toml` by default)
//! 2. environment variables prefixed with `TFSENSORS_`, nested keys split on
//!    `__` (e.g. `TFSENSORS_BUS__PORT=4280`)
//!
//! CLI flags are applied on top by the binary.
//!
//! # Example
//! ```no_run
//! use tf_sensors::config::Settings;
//!
//! let settings = Settings::load_from("config/tfsensors.toml")?;
//! settings.validate()?;
//! println!("bus at {}:{}", settings.bus.host, settings.bus.port);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::tracing_setup::OutputFormat;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;
use tf_core::{
    ConfigProvider, HandleOptions, HardwareType, SensorConfig, SensorError, SensorResult,
};
use tf_driver_mock::MockMode;
use tf_hardware::{BusAddress, ServiceConfig};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/tfsensors.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "TFSENSORS_";

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Application settings
    pub application: ApplicationConfig,
    /// Bus daemon connection
    pub bus: BusConfig,
    /// Polling cadence and read bound
    pub polling: PollingConfig,
    /// Telemetry output
    pub sink: SinkConfig,
    /// Per-address sensor entries, kept as raw tables until [`Settings::sensor_configs`]
    pub sensors: BTreeMap<String, toml::Table>,
    /// Modules served by the simulated bus
    pub simulation: Option<SimulationConfig>,
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

/// Bus daemon connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Daemon host name
    #[serde(default = "default_host")]
    pub host: String,
    /// Daemon port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Orientation filter convergence speed applied to IMU (variant A) handles
    #[serde(default)]
    pub imu_convergence_speed: u16,
}

/// Polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Interval between publish passes in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Bound on each handle read in milliseconds
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

/// Which telemetry sink the binary publishes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// JSON lines on stdout
    #[default]
    Json,
    /// `info` tracing events
    Log,
}

/// Telemetry sink settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink to publish to
    #[serde(default)]
    pub kind: SinkKind,
}

/// Simulated bus contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seed for read jitter and injected failures; unseeded when absent
    pub seed: Option<u64>,
    /// instant, realistic or chaos
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Modules present on the bus
    #[serde(default)]
    pub modules: Vec<SimulatedModuleConfig>,
}

/// One module on the simulated bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedModuleConfig {
    /// Bus address
    pub uid: String,
    /// Announced type code
    pub type_code: u16,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_host() -> String {
    tf_hardware::service::DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    tf_hardware::service::DEFAULT_PORT
}

fn default_interval_ms() -> u64 {
    100
}

fn default_read_timeout_ms() -> u64 {
    250
}

fn default_mode() -> String {
    "instant".to_string()
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            imu_convergence_speed: 0,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl Settings {
    /// Load configuration from [`DEFAULT_CONFIG_PATH`] and environment variables
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path.
    ///
    /// A missing file is not an error; defaults and the environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    /// The provider chain, exposed so callers can merge further overrides.
    pub fn figment<P: AsRef<Path>>(path: P) -> Figment {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> SensorResult<()> {
        if !VALID_LEVELS.contains(&self.application.log_level.to_lowercase().as_str()) {
            return Err(SensorError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                VALID_LEVELS.join(", ")
            )));
        }

        self.application
            .log_format
            .parse::<OutputFormat>()
            .map_err(SensorError::Configuration)?;

        if self.polling.interval_ms == 0 {
            return Err(SensorError::Configuration(
                "polling.interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.polling.read_timeout_ms == 0 {
            return Err(SensorError::Configuration(
                "polling.read_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if let Some(simulation) = &self.simulation {
            simulation.mock_mode()?;
            let mut uids = std::collections::HashSet::new();
            for module in &simulation.modules {
                let recognized = HardwareType::from_code(module.type_code)
                    .is_some_and(|hardware| !hardware.is_synthesized());
                if !recognized {
                    return Err(SensorError::Configuration(format!(
                        "simulated module '{}' has unknown type code {}",
                        module.uid, module.type_code
                    )));
                }
                if !uids.insert(&module.uid) {
                    return Err(SensorError::Configuration(format!(
                        "Duplicate simulated module uid: {}",
                        module.uid
                    )));
                }
            }
        }

        self.sensor_configs().map(|_| ())
    }

    /// Typed per-address entries, with parameter types checked.
    pub fn sensor_configs(&self) -> SensorResult<HashMap<String, SensorConfig>> {
        self.sensors
            .iter()
            .map(|(uid, table)| {
                let config = SensorConfig::from_table(table).map_err(|e| {
                    SensorError::Configuration(format!("sensors.{}: {}", uid, e))
                })?;
                Ok((uid.clone(), config))
            })
            .collect()
    }

    /// Configuration provider backed by the `[sensors]` tables.
    pub fn provider(&self) -> SensorResult<SensorTable> {
        Ok(SensorTable {
            entries: self.sensor_configs()?,
        })
    }

    /// Runtime settings for the sensor service.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            address: BusAddress::new(self.bus.host.clone(), self.bus.port),
            poll_interval: Duration::from_millis(self.polling.interval_ms),
            read_timeout: Duration::from_millis(self.polling.read_timeout_ms),
            handle_options: HandleOptions {
                imu_convergence_speed: self.bus.imu_convergence_speed,
            },
        }
    }
}

impl SimulationConfig {
    /// Parse the `mode` string.
    pub fn mock_mode(&self) -> SensorResult<MockMode> {
        match self.mode.to_lowercase().as_str() {
            "instant" => Ok(MockMode::Instant),
            "realistic" => Ok(MockMode::Realistic),
            "chaos" => Ok(MockMode::Chaos),
            other => Err(SensorError::Configuration(format!(
                "Invalid simulation mode '{}'. Must be one of: instant, realistic, chaos",
                other
            ))),
        }
    }
}

// =============================================================================
// Configuration Provider
// =============================================================================

/// Sensor entries loaded from configuration, keyed by module address.
#[derive(Debug, Clone, Default)]
pub struct SensorTable {
    entries: HashMap<String, SensorConfig>,
}

impl SensorTable {
    /// Number of configured modules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no module is configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConfigProvider for SensorTable {
    fn lookup(&self, uid: &str) -> Option<SensorConfig> {
        self.entries.get(uid).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tf_core::ParamValue;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(dir.path().join("absent.toml")).unwrap();

        assert_eq!(settings.application.log_level, "info");
        assert_eq!(settings.bus.port, 4223);
        assert_eq!(settings.polling.interval_ms, 100);
        assert_eq!(settings.sink.kind, SinkKind::Json);
        assert!(settings.simulation.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_full_file() {
        let file = write_config(
            r#"
[application]
log_level = "debug"
log_format = "json"

[bus]
host = "brickd"
port = 4280
imu_convergence_speed = 30

[polling]
interval_ms = 50
read_timeout_ms = 20

[sink]
kind = "log"

[sensors.6wVE2R]
topic = "/front/imu"
frame_id = "imu_link"

[sensors.dXj]
fov = 0.3
max = 2

[simulation]
seed = 7
mode = "realistic"
[[simulation.modules]]
uid = "6wVE2R"
type_code = 18
"#,
        );

        let settings = Settings::load_from(file.path()).unwrap();
        settings.validate().unwrap();
        assert_eq!(settings.sink.kind, SinkKind::Log);

        let service = settings.service_config();
        assert_eq!(service.address, BusAddress::new("brickd", 4280));
        assert_eq!(service.poll_interval, Duration::from_millis(50));
        assert_eq!(service.read_timeout, Duration::from_millis(20));
        assert_eq!(service.handle_options.imu_convergence_speed, 30);

        let provider = settings.provider().unwrap();
        assert_eq!(provider.len(), 2);
        let imu = provider.lookup("6wVE2R").unwrap();
        assert_eq!(imu.topic.as_deref(), Some("/front/imu"));
        assert_eq!(imu.params.frame_id(), Some("imu_link"));
        assert!(!imu.params.get("topic").is_set());
        let range = provider.lookup("dXj").unwrap();
        assert_eq!(range.params.get("max"), &ParamValue::Integer(2));
        assert!(provider.lookup("nope").is_none());

        let simulation = settings.simulation.unwrap();
        assert_eq!(simulation.seed, Some(7));
        assert_eq!(simulation.mock_mode().unwrap(), MockMode::Realistic);
        assert_eq!(simulation.modules[0].type_code, 18);
    }

    #[test]
    fn test_reserved_port_falls_back_to_default() {
        let file = write_config("[bus]\nhost = \"\"\nport = 80\n");
        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.service_config().address, BusAddress::default());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut settings = Settings::default();
        settings.application.log_level = "verbose".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut settings = Settings::default();
        settings.application.log_format = "xml".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut settings = Settings::default();
        settings.polling.interval_ms = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.polling.read_timeout_ms = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_array_parameter_rejected() {
        let file = write_config("[sensors.abc]\nfov = [1, 2]\n");
        let settings = Settings::load_from(file.path()).unwrap();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("sensors.abc"));
    }

    #[test]
    fn test_unknown_simulated_type_rejected() {
        let file = write_config(
            "[simulation]\n[[simulation.modules]]\nuid = \"x\"\ntype_code = 9999\n",
        );
        let settings = Settings::load_from(file.path()).unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_duplicate_simulated_uid_rejected() {
        let settings = Settings {
            simulation: Some(SimulationConfig {
                seed: None,
                mode: default_mode(),
                modules: vec![
                    SimulatedModuleConfig {
                        uid: "a".into(),
                        type_code: 27,
                    },
                    SimulatedModuleConfig {
                        uid: "a".into(),
                        type_code: 216,
                    },
                ],
            }),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_simulation_mode() {
        let simulation = SimulationConfig {
            mode: "turbo".into(),
            ..Default::default()
        };
        assert!(simulation.mock_mode().is_err());
    }
}
