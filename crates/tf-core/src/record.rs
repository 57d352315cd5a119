//! Normalized telemetry records.
//!
//! One record type per sensor class, all in SI units, each carrying a
//! [`Header`] with the descriptor's sequence number, capture time and frame
//! label. Field layout mirrors the standard robotics sensor messages so that
//! sinks can forward records without reshaping.

use crate::sensor::SensorClass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row-major 3×3 covariance.
pub type Covariance = [f64; 9];

/// All-zero covariance, meaning "unknown".
pub const UNKNOWN_COVARIANCE: Covariance = [0.0; 9];

/// Record header shared by all classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Per-descriptor sequence number
    pub seq: u32,
    /// Capture time, taken at read time
    pub stamp: DateTime<Utc>,
    /// Reference frame label
    pub frame_id: String,
}

/// Cartesian vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
}

impl Vector3 {
    /// Vector from its components.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Orientation quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quaternion {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component
    pub z: f64,
    /// Scalar component
    pub w: f64,
}

/// Orientation, angular velocity and linear acceleration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImuRecord {
    /// Stamp and frame
    pub header: Header,
    /// Orientation estimate
    pub orientation: Quaternion,
    /// Row-major 3x3 covariance of `orientation`
    pub orientation_covariance: Covariance,
    /// rad/s
    pub angular_velocity: Vector3,
    /// Row-major 3x3 covariance of `angular_velocity`
    pub angular_velocity_covariance: Covariance,
    /// m/s²
    pub linear_acceleration: Vector3,
    /// Row-major 3x3 covariance of `linear_acceleration`
    pub linear_acceleration_covariance: Covariance,
}

/// Magnetic field vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagneticFieldRecord {
    /// Stamp and frame
    pub header: Header,
    /// Tesla
    pub magnetic_field: Vector3,
    /// Row-major 3x3 covariance of `magnetic_field`
    pub magnetic_field_covariance: Covariance,
}

/// Fix status block of a [`NavSatFixRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavSatStatus {
    /// One of the `STATUS_*` values
    pub status: i8,
    /// Satellite system bit mask
    pub service: u16,
}

impl NavSatStatus {
    /// No position fix
    pub const STATUS_NO_FIX: i8 = -1;
    /// Unaugmented fix
    pub const STATUS_FIX: i8 = 0;
    /// Satellite-based augmentation
    pub const STATUS_SBAS_FIX: i8 = 1;
    /// Ground-based augmentation
    pub const STATUS_GBAS_FIX: i8 = 2;
    /// GPS service bit
    pub const SERVICE_GPS: u16 = 1;
}

/// Satellite position fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavSatFixRecord {
    /// Stamp and frame
    pub header: Header,
    /// Fix status
    pub status: NavSatStatus,
    /// Degrees
    pub latitude: f64,
    /// Degrees
    pub longitude: f64,
    /// Meters
    pub altitude: f64,
    /// Row-major 3x3 position covariance
    pub position_covariance: Covariance,
    /// How `position_covariance` was obtained
    pub position_covariance_type: u8,
}

impl NavSatFixRecord {
    /// Position covariance is unknown
    pub const COVARIANCE_TYPE_UNKNOWN: u8 = 0;
}

/// Relative humidity reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativeHumidityRecord {
    /// Stamp and frame
    pub header: Header,
    /// Fraction, 0.0 to 1.0
    pub relative_humidity: f64,
    /// 0 means unknown
    pub variance: f64,
}

/// Temperature reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRecord {
    /// Stamp and frame
    pub header: Header,
    /// Degrees Celsius
    pub temperature: f64,
    /// 0 means unknown
    pub variance: f64,
}

/// Ambient light reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlluminanceRecord {
    /// Stamp and frame
    pub header: Header,
    /// Lux
    pub illuminance: f64,
    /// 0 means unknown
    pub variance: f64,
}

/// Emitter type of a range sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiationType {
    /// Sonar
    Ultrasound,
    /// Infrared emitter
    Infrared,
}

impl RadiationType {
    /// Wire value of the radiation tag.
    pub fn code(&self) -> u8 {
        match self {
            Self::Ultrasound => 0,
            Self::Infrared => 1,
        }
    }
}

/// Distance reading with sensor geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeRecord {
    /// Stamp and frame
    pub header: Header,
    /// Emitter type
    pub radiation_type: RadiationType,
    /// Radians
    pub field_of_view: f64,
    /// Meters
    pub min_range: f64,
    /// Meters
    pub max_range: f64,
    /// Meters
    pub range: f64,
}

/// A normalized record of any class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SensorRecord {
    /// Orientation and motion
    Imu(ImuRecord),
    /// Magnetometer
    MagneticField(MagneticFieldRecord),
    /// GPS fix
    NavSatFix(NavSatFixRecord),
    /// Relative humidity
    RelativeHumidity(RelativeHumidityRecord),
    /// Temperature
    Temperature(TemperatureRecord),
    /// Ambient light
    Illuminance(IlluminanceRecord),
    /// Distance
    Range(RangeRecord),
}

impl SensorRecord {
    /// Header of the wrapped record.
    pub fn header(&self) -> &Header {
        match self {
            Self::Imu(r) => &r.header,
            Self::MagneticField(r) => &r.header,
            Self::NavSatFix(r) => &r.header,
            Self::RelativeHumidity(r) => &r.header,
            Self::Temperature(r) => &r.header,
            Self::Illuminance(r) => &r.header,
            Self::Range(r) => &r.header,
        }
    }

    /// Class of the descriptor that produced this record.
    pub fn class(&self) -> SensorClass {
        match self {
            Self::Imu(_) => SensorClass::Imu,
            Self::MagneticField(_) => SensorClass::Magnetic,
            Self::NavSatFix(_) => SensorClass::Gps,
            Self::RelativeHumidity(_) => SensorClass::Humidity,
            Self::Temperature(_) => SensorClass::Temperature,
            Self::Illuminance(_) => SensorClass::Light,
            Self::Range(_) => SensorClass::Range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Header {
        Header {
            seq: 7,
            stamp: Utc::now(),
            frame_id: "base_link".into(),
        }
    }

    #[test]
    fn test_record_class_and_header() {
        let record = SensorRecord::Temperature(TemperatureRecord {
            header: header(),
            temperature: 21.5,
            variance: 0.0,
        });
        assert_eq!(record.class(), SensorClass::Temperature);
        assert_eq!(record.header().seq, 7);
    }

    #[test]
    fn test_record_serializes_with_type_tag() {
        let record = SensorRecord::Range(RangeRecord {
            header: header(),
            radiation_type: RadiationType::Infrared,
            field_of_view: 0.01,
            min_range: 0.03,
            max_range: 0.4,
            range: 0.25,
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "range");
        assert_eq!(json["radiation_type"], "infrared");
        assert_eq!(json["header"]["frame_id"], "base_link");
    }
}
