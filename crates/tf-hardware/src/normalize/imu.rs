//! Inertial normalization for both IMU variants.
//!
//! Output follows REP 103 axes. Each variant has its own quaternion remap and
//! sign flips; the covariances are all-zero ("unknown") for both.

use std::f64::consts::PI;
use tf_core::{Header, ImuRecord, ImuV1Sample, ImuV2Sample, Quaternion, Vector3, UNKNOWN_COVARIANCE};

/// Standard gravity used by the IMU brick firmware (m/s² per g).
pub const GRAVITY: f64 = 9.80605;

/// Variant A angular velocity resolution (LSB per deg/s).
pub const V1_GYRO_LSB_PER_DEG: f64 = 14.375;

/// Variant B angular velocity resolution (LSB per deg/s).
pub const V2_GYRO_LSB_PER_DEG: f64 = 16.0;

/// Variant B quaternion scale.
pub const V2_QUATERNION_SCALE: f64 = 16383.0;

fn deg_to_rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

fn vector(raw: [i16; 3], convert: impl Fn(f64) -> f64) -> Vector3 {
    Vector3::new(
        convert(f64::from(raw[0])),
        convert(f64::from(raw[1])),
        convert(f64::from(raw[2])),
    )
}

fn record(header: Header, orientation: Quaternion, angular: Vector3, linear: Vector3) -> ImuRecord {
    ImuRecord {
        header,
        orientation,
        orientation_covariance: UNKNOWN_COVARIANCE,
        angular_velocity: angular,
        angular_velocity_covariance: UNKNOWN_COVARIANCE,
        linear_acceleration: linear,
        linear_acceleration_covariance: UNKNOWN_COVARIANCE,
    }
}

/// IMU brick (variant A).
pub fn from_v1(sample: &ImuV1Sample, header: Header) -> ImuRecord {
    let [x, y, z, w] = sample.quaternion.map(f64::from);
    let orientation = Quaternion {
        x: w,
        y: -z,
        z: y,
        w: -x,
    };
    let angular = vector(sample.angular_velocity, |raw| {
        deg_to_rad(raw / V1_GYRO_LSB_PER_DEG)
    });
    let linear = vector(sample.acceleration, |raw| (raw / 1000.0) * GRAVITY);
    record(header, orientation, angular, linear)
}

/// IMU brick 2.0 (variant B).
pub fn from_v2(sample: &ImuV2Sample, header: Header) -> ImuRecord {
    // Components are single precision on the device side.
    let [x, y, z, w] = sample
        .quaternion
        .map(|q| f64::from((f64::from(q) / V2_QUATERNION_SCALE) as f32));
    let orientation = Quaternion {
        x: -z,
        y,
        z: x,
        w: -w,
    };
    let angular = vector(sample.angular_velocity, |raw| {
        deg_to_rad(raw / V2_GYRO_LSB_PER_DEG)
    });
    let linear = vector(sample.acceleration, |raw| raw / 100.0);
    record(header, orientation, angular, linear)
}
