//! GPS normalization.
//!
//! Only a 3D fix is published. Coordinates are reported as unsigned
//! fixed-point magnitudes; the hemisphere characters are not applied.

use tf_core::{GpsFix, Header, NavSatFixRecord, NavSatStatus, UNKNOWN_COVARIANCE};

/// Fixed-point scale of latitude and longitude.
pub const COORDINATE_SCALE: f64 = 1_000_000.0;

/// Altitude is reported in centimeters.
pub const ALTITUDE_SCALE: f64 = 100.0;

/// Build a fix record from a 3D fix sample.
pub fn from_fix(fix: &GpsFix, header: Header) -> NavSatFixRecord {
    NavSatFixRecord {
        header,
        status: NavSatStatus {
            status: NavSatStatus::STATUS_SBAS_FIX,
            service: NavSatStatus::SERVICE_GPS,
        },
        latitude: f64::from(fix.latitude) / COORDINATE_SCALE,
        longitude: f64::from(fix.longitude) / COORDINATE_SCALE,
        altitude: f64::from(fix.altitude) / ALTITUDE_SCALE,
        position_covariance: UNKNOWN_COVARIANCE,
        position_covariance_type: NavSatFixRecord::COVARIANCE_TYPE_UNKNOWN,
    }
}
