//! Humidity normalization.

use tf_core::{Header, RelativeHumidityRecord};

/// Raw humidity (1/10 %RH) to a relative fraction.
pub fn from_raw(value: u16, header: Header) -> RelativeHumidityRecord {
    RelativeHumidityRecord {
        header,
        relative_humidity: f64::from(value) / 1000.0,
        variance: 0.0,
    }
}
