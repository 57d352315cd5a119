//! Sensor classes and recognized hardware types.
//!
//! A physical module announces itself on the bus with a numeric type code.
//! [`HardwareType`] is the closed set of codes this system understands, and
//! [`SensorClass`] is the logical channel kind a descriptor publishes as.
//! Several hardware types map onto the same class (ambient and infrared
//! temperature both publish as [`SensorClass::Temperature`]).

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Sensor Class
// =============================================================================

/// Logical class of a published sensor channel.
///
/// Determines which normalizer handles a descriptor and which prefix the
/// topic namer uses for generated topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorClass {
    /// Ambient or object temperature
    Temperature,
    /// Relative humidity
    Humidity,
    /// Illuminance
    Light,
    /// Orientation, angular velocity and linear acceleration
    Imu,
    /// Distance to target
    Range,
    /// Satellite position fix
    Gps,
    /// Magnetic field vector
    Magnetic,
    /// Modules that are tracked but never published (buttons, motion detectors)
    Misc,
}

impl SensorClass {
    /// All classes, in declaration order.
    pub const ALL: [SensorClass; 8] = [
        SensorClass::Temperature,
        SensorClass::Humidity,
        SensorClass::Light,
        SensorClass::Imu,
        SensorClass::Range,
        SensorClass::Gps,
        SensorClass::Magnetic,
        SensorClass::Misc,
    ];

    /// Word used in generated topic names, `None` for classes without a channel.
    pub fn topic_word(&self) -> Option<&'static str> {
        match self {
            Self::Gps => Some("gps"),
            Self::Humidity => Some("humidity"),
            Self::Imu => Some("imu"),
            Self::Light => Some("illuminance"),
            Self::Magnetic => Some("magnetic"),
            Self::Range => Some("range"),
            Self::Temperature => Some("temperature"),
            Self::Misc => None,
        }
    }

    /// Whether descriptors of this class publish records.
    pub fn is_published(&self) -> bool {
        self.topic_word().is_some()
    }

    /// Stable index into per-class tables.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for SensorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Light => "light",
            Self::Imu => "imu",
            Self::Range => "range",
            Self::Gps => "gps",
            Self::Magnetic => "magnetic",
            Self::Misc => "misc",
        };
        write!(f, "{}", label)
    }
}

// =============================================================================
// Hardware Types
// =============================================================================

/// Recognized hardware type codes.
///
/// Codes match the identifiers the bus daemon reports in enumeration events.
/// [`HardwareType::ImuV2Magnetic`] is synthesized locally for the second
/// descriptor of a combined IMU 2.0 module and never appears on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardwareType {
    /// Master brick (bus bridge, not a sensor)
    Master,
    /// IMU brick, variant A
    Imu,
    /// IMU brick 2.0, variant B (combined inertial + magnetometer)
    ImuV2,
    /// Ambient light bricklet, lux/10
    AmbientLight,
    /// Infrared distance bricklet
    DistanceIr,
    /// Humidity bricklet
    Humidity,
    /// Ambient temperature bricklet
    Temperature,
    /// Infrared object temperature bricklet
    TemperatureIr,
    /// GPS bricklet
    Gps,
    /// Ultrasonic distance bricklet
    DistanceUs,
    /// Dual button bricklet
    DualButton,
    /// Motion detector bricklet
    MotionDetector,
    /// Ambient light bricklet 2.0, lux/100
    AmbientLightV2,
    /// Magnetometer channel of an IMU 2.0 (synthesized)
    ImuV2Magnetic,
}

impl HardwareType {
    /// Master brick type code.
    pub const MASTER: u16 = 13;
    /// IMU brick type code.
    pub const IMU: u16 = 16;
    /// IMU brick 2.0 type code.
    pub const IMU_V2: u16 = 18;
    /// Ambient light bricklet type code.
    pub const AMBIENT_LIGHT: u16 = 21;
    /// Infrared distance bricklet type code.
    pub const DISTANCE_IR: u16 = 25;
    /// Humidity bricklet type code.
    pub const HUMIDITY: u16 = 27;
    /// Temperature bricklet type code.
    pub const TEMPERATURE: u16 = 216;
    /// Infrared temperature bricklet type code.
    pub const TEMPERATURE_IR: u16 = 217;
    /// GPS bricklet type code.
    pub const GPS: u16 = 222;
    /// Ultrasonic distance bricklet type code.
    pub const DISTANCE_US: u16 = 229;
    /// Dual button bricklet type code.
    pub const DUAL_BUTTON: u16 = 230;
    /// Motion detector bricklet type code.
    pub const MOTION_DETECTOR: u16 = 233;
    /// Ambient light bricklet 2.0 type code.
    pub const AMBIENT_LIGHT_V2: u16 = 259;
    /// Internal type code of the IMU 2.0 magnetometer descriptor.
    pub const IMU_V2_MAGNETIC: u16 = 400;

    /// All recognized hardware types.
    pub const ALL: [HardwareType; 14] = [
        HardwareType::Master,
        HardwareType::Imu,
        HardwareType::ImuV2,
        HardwareType::AmbientLight,
        HardwareType::DistanceIr,
        HardwareType::Humidity,
        HardwareType::Temperature,
        HardwareType::TemperatureIr,
        HardwareType::Gps,
        HardwareType::DistanceUs,
        HardwareType::DualButton,
        HardwareType::MotionDetector,
        HardwareType::AmbientLightV2,
        HardwareType::ImuV2Magnetic,
    ];

    /// Numeric type code.
    pub fn code(&self) -> u16 {
        match self {
            Self::Master => Self::MASTER,
            Self::Imu => Self::IMU,
            Self::ImuV2 => Self::IMU_V2,
            Self::AmbientLight => Self::AMBIENT_LIGHT,
            Self::DistanceIr => Self::DISTANCE_IR,
            Self::Humidity => Self::HUMIDITY,
            Self::Temperature => Self::TEMPERATURE,
            Self::TemperatureIr => Self::TEMPERATURE_IR,
            Self::Gps => Self::GPS,
            Self::DistanceUs => Self::DISTANCE_US,
            Self::DualButton => Self::DUAL_BUTTON,
            Self::MotionDetector => Self::MOTION_DETECTOR,
            Self::AmbientLightV2 => Self::AMBIENT_LIGHT_V2,
            Self::ImuV2Magnetic => Self::IMU_V2_MAGNETIC,
        }
    }

    /// Look up a type code. Returns `None` for unknown codes.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.code() == code)
    }

    /// Sensor class of the descriptor built for this type.
    ///
    /// `None` for infrastructure modules that never produce a descriptor.
    pub fn class(&self) -> Option<SensorClass> {
        match self {
            Self::Master => None,
            Self::Imu | Self::ImuV2 => Some(SensorClass::Imu),
            Self::AmbientLight | Self::AmbientLightV2 => Some(SensorClass::Light),
            Self::DistanceIr | Self::DistanceUs => Some(SensorClass::Range),
            Self::Humidity => Some(SensorClass::Humidity),
            Self::Temperature | Self::TemperatureIr => Some(SensorClass::Temperature),
            Self::Gps => Some(SensorClass::Gps),
            Self::DualButton | Self::MotionDetector => Some(SensorClass::Misc),
            Self::ImuV2Magnetic => Some(SensorClass::Magnetic),
        }
    }

    /// Infrastructure modules are recognized but never tracked.
    pub fn is_infrastructure(&self) -> bool {
        self.class().is_none()
    }

    /// Whether this code is only ever produced locally.
    pub fn is_synthesized(&self) -> bool {
        matches!(self, Self::ImuV2Magnetic)
    }

    /// Human-readable name used in log output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Master => "Master",
            Self::Imu => "IMU",
            Self::ImuV2 => "IMU 2.0",
            Self::AmbientLight => "Ambient Light",
            Self::DistanceIr => "Distance IR",
            Self::Humidity => "Humidity",
            Self::Temperature => "Temperature",
            Self::TemperatureIr => "Temperature IR",
            Self::Gps => "GPS",
            Self::DistanceUs => "Distance US",
            Self::DualButton => "Dual Button",
            Self::MotionDetector => "Motion Detector",
            Self::AmbientLightV2 => "Ambient Light 2.0",
            Self::ImuV2Magnetic => "IMU 2.0 Magnetometer",
        }
    }
}

impl fmt::Display for HardwareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}
