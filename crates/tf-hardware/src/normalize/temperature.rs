//! Temperature normalization (device units to degrees Celsius).

use tf_core::{HardwareType, Header, TemperatureRecord};

/// Divisor from device units to degrees Celsius.
pub fn scale(hardware: HardwareType) -> f64 {
    match hardware {
        HardwareType::TemperatureIr => 10.0,
        _ => 100.0,
    }
}

/// Build a temperature record from a raw reading.
pub fn from_raw(hardware: HardwareType, value: i16, header: Header) -> TemperatureRecord {
    TemperatureRecord {
        header,
        temperature: f64::from(value) / scale(hardware),
        variance: 0.0,
    }
}
