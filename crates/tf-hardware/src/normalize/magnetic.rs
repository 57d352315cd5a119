//! Magnetometer normalization (device units to Tesla).

use tf_core::{Covariance, HardwareType, Header, MagneticFieldRecord, Vector3};

/// Fixed per-entry covariance: known, low confidence.
pub const MAGNETIC_COVARIANCE: Covariance = [0.01; 9];

/// Divisor from device units to Tesla.
///
/// The IMU 2.0 reports microtesla; the original IMU brick reports nanotesla
/// scaled by ten.
pub fn scale(hardware: HardwareType) -> f64 {
    match hardware {
        HardwareType::ImuV2 | HardwareType::ImuV2Magnetic => 1e6,
        _ => 1e7,
    }
}

/// Build a magnetic field record from a raw vector.
pub fn from_raw(hardware: HardwareType, field: [i16; 3], header: Header) -> MagneticFieldRecord {
    let divisor = scale(hardware);
    MagneticFieldRecord {
        header,
        magnetic_field: Vector3::new(
            f64::from(field[0]) / divisor,
            f64::from(field[1]) / divisor,
            f64::from(field[2]) / divisor,
        ),
        magnetic_field_covariance: MAGNETIC_COVARIANCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn header() -> Header {
        Header {
            seq: 3,
            stamp: Utc::now(),
            frame_id: "imu_link".into(),
        }
    }

    #[test]
    fn test_imu_v2_microtesla() {
        let record = from_raw(HardwareType::ImuV2Magnetic, [48, -20, 5], header());
        assert_eq!(record.magnetic_field.x, 48.0 / 1e6);
        assert_eq!(record.magnetic_field.y, -20.0 / 1e6);
        assert_eq!(record.magnetic_field.z, 5.0 / 1e6);
        assert_eq!(record.magnetic_field_covariance, [0.01; 9]);
    }

    #[test]
    fn test_imu_v1_scale() {
        let record = from_raw(HardwareType::Imu, [480, 0, -1], header());
        assert_eq!(record.magnetic_field.x, 480.0 / 1e7);
        assert_eq!(record.magnetic_field.z, -1.0 / 1e7);
        assert_eq!(record.header.frame_id, "imu_link");
    }

    #[test]
    fn test_small_readings_are_not_truncated() {
        let record = from_raw(HardwareType::ImuV2Magnetic, [1, 1, 1], header());
        assert!(record.magnetic_field.x > 0.0);
    }
}
