//! Ambient light normalization (device units to lux).

use tf_core::{HardwareType, Header, IlluminanceRecord};

/// Divisor from device units to lux.
pub fn scale(hardware: HardwareType) -> f64 {
    match hardware {
        HardwareType::AmbientLightV2 => 100.0,
        _ => 10.0,
    }
}

/// Build an illuminance record from a raw reading.
pub fn from_raw(hardware: HardwareType, value: u32, header: Header) -> IlluminanceRecord {
    IlluminanceRecord {
        header,
        illuminance: f64::from(value) / scale(hardware),
        variance: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn header() -> Header {
        Header {
            seq: 1,
            stamp: Utc::now(),
            frame_id: "base_link".into(),
        }
    }

    #[test]
    fn test_v1_tenths_keep_fraction() {
        assert_eq!(from_raw(HardwareType::AmbientLight, 1234, header()).illuminance, 123.4);
        assert_eq!(from_raw(HardwareType::AmbientLight, 5, header()).illuminance, 0.5);
    }

    #[test]
    fn test_v2_hundredths() {
        let record = from_raw(HardwareType::AmbientLightV2, 123_456, header());
        assert_eq!(record.illuminance, 1234.56);
        assert_eq!(record.variance, 0.0);
    }
}
