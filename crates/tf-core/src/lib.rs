//! `tf-core`
//!
//! Core vocabulary for tf-sensors: the types shared between the sensor
//! registry, the bus transport and the telemetry sinks.
//!
//! ## Layers
//!
//! - **Bus Transport** ([`capabilities::BusTransport`]): announces modules and
//!   constructs device handles. External collaborator.
//! - **Device Handle** ([`capabilities::SensorHandle`]): typed raw reads from
//!   one physical module.
//! - **Telemetry Sink** ([`capabilities::TelemetrySink`]): receives normalized
//!   records per channel. External collaborator.
//!
//! ## Key Types
//!
//! - [`SensorClass`]: which normalizer and default topic prefix applies
//! - [`HardwareType`]: the closed set of recognized bus type codes
//! - [`RawSample`]: device-native readings, before unit conversion
//! - [`SensorRecord`]: normalized, unit-correct telemetry
//! - [`SensorError`]: error taxonomy with bus status codes

pub mod capabilities;
pub mod error;
pub mod params;
pub mod record;
pub mod sample;
pub mod sensor;

pub use capabilities::{
    BusEvent, BusTransport, Channel, ConfigProvider, ConnectReason, EnumerationType,
    HandleOptions, SensorHandle, TelemetrySink,
};
pub use error::{BusStatus, SensorError, SensorResult};
pub use params::{ParamValue, SensorConfig, SensorParams};
pub use record::{
    Covariance, Header, IlluminanceRecord, ImuRecord, MagneticFieldRecord, NavSatFixRecord,
    NavSatStatus, Quaternion, RadiationType, RangeRecord, RelativeHumidityRecord, SensorRecord,
    TemperatureRecord, Vector3, UNKNOWN_COVARIANCE,
};
pub use sample::{GpsFix, GpsStatus, ImuV1Sample, ImuV2Sample, RawSample, SampleKind};
pub use sensor::{HardwareType, SensorClass};
