//! Raw device samples.
//!
//! These are the device-native values a handle returns, before any unit
//! conversion. Integer widths follow what the modules put on the wire.

use serde::{Deserialize, Serialize};

/// Which read a normalizer requests from a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    /// Quaternion, angular velocity and acceleration in one sample
    Inertial,
    /// Magnetometer vector
    MagneticField,
    /// GPS fix quality and satellite counts
    GpsStatus,
    /// GPS coordinates, altitude and motion
    GpsFix,
    /// Relative humidity
    Humidity,
    /// Temperature
    Temperature,
    /// Ambient light
    Illuminance,
    /// Distance to target
    Distance,
}

impl SampleKind {
    /// Short label for log output and errors.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Inertial => "inertial data",
            Self::MagneticField => "magnetic field",
            Self::GpsStatus => "gps status",
            Self::GpsFix => "gps fix",
            Self::Humidity => "humidity",
            Self::Temperature => "temperature",
            Self::Illuminance => "illuminance",
            Self::Distance => "distance",
        }
    }
}

/// IMU brick (variant A) inertial sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImuV1Sample {
    /// Quaternion `[x, y, z, w]` as reported
    pub quaternion: [f32; 4],
    /// Acceleration in milli-g
    pub acceleration: [i16; 3],
    /// Magnetic field as reported by the all-data read
    pub magnetic_field: [i16; 3],
    /// Angular velocity in 1/14.375 deg/s
    pub angular_velocity: [i16; 3],
    /// Chip temperature in 1/100 deg C
    pub temperature: i16,
}

/// IMU brick 2.0 (variant B) inertial sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ImuV2Sample {
    /// Quaternion `[x, y, z, w]` in 1/16383
    pub quaternion: [i16; 4],
    /// Acceleration in 1/100 m/s²
    pub acceleration: [i16; 3],
    /// Angular velocity in 1/16 deg/s
    pub angular_velocity: [i16; 3],
}

/// GPS fix quality as reported by the status read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GpsStatus {
    /// 1 = no fix, 2 = 2D fix, 3 = 3D fix
    pub fix: u8,
    /// Satellites in view
    pub satellites_view: u8,
    /// Satellites used for the fix
    pub satellites_used: u8,
}

impl GpsStatus {
    /// No fix
    pub const FIX_NO_FIX: u8 = 1;
    /// 2D fix
    pub const FIX_2D_FIX: u8 = 2;
    /// 3D fix
    pub const FIX_3D_FIX: u8 = 3;

    /// Only a full 3D fix is publishable.
    pub fn is_3d_fix(&self) -> bool {
        self.fix == Self::FIX_3D_FIX
    }
}

/// GPS position sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GpsFix {
    /// Degrees * 1e6
    pub latitude: u32,
    /// 'N' or 'S'
    pub ns: char,
    /// Degrees * 1e6
    pub longitude: u32,
    /// 'E' or 'W'
    pub ew: char,
    /// Position dilution of precision, 1/100
    pub pdop: u16,
    /// Horizontal dilution of precision, 1/100
    pub hdop: u16,
    /// Vertical dilution of precision, 1/100
    pub vdop: u16,
    /// Estimated position error, centimeters
    pub epe: u16,
    /// Centimeters
    pub altitude: u32,
    /// Geoidal separation, centimeters
    pub geoidal_separation: u32,
    /// Course in 1/100 deg
    pub course: u32,
    /// Speed in 1/100 km/h
    pub speed: u32,
}

/// A raw reading returned by [`crate::SensorHandle::read`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawSample {
    /// IMU brick reading
    ImuV1(ImuV1Sample),
    /// IMU 2.0 reading
    ImuV2(ImuV2Sample),
    /// Magnetometer vector in device units (variant dependent)
    MagneticField { field: [i16; 3] },
    /// GPS fix quality
    GpsStatus(GpsStatus),
    /// GPS position
    GpsFix(GpsFix),
    /// Relative humidity in 1/10 %RH
    Humidity { value: u16 },
    /// Temperature in device units (variant dependent)
    Temperature { value: i16 },
    /// Illuminance in device units (variant dependent)
    Illuminance { value: u32 },
    /// Distance in millimeters
    Distance { value: u16 },
}

impl RawSample {
    /// The read kind that produces this sample.
    pub fn kind(&self) -> SampleKind {
        match self {
            Self::ImuV1(_) | Self::ImuV2(_) => SampleKind::Inertial,
            Self::MagneticField { .. } => SampleKind::MagneticField,
            Self::GpsStatus(_) => SampleKind::GpsStatus,
            Self::GpsFix(_) => SampleKind::GpsFix,
            Self::Humidity { .. } => SampleKind::Humidity,
            Self::Temperature { .. } => SampleKind::Temperature,
            Self::Illuminance { .. } => SampleKind::Illuminance,
            Self::Distance { .. } => SampleKind::Distance,
        }
    }
}
