//! Reading Normalizers
//!
//! One submodule per sensor class, each a set of pure functions from a raw
//! device sample plus a [`Header`] to a normalized record. [`sample`] is the
//! impure front: it performs the reads a class needs through the descriptor's
//! handle, each bounded by a timeout, and routes the result to the right
//! normalizer.
//!
//! | Class | Reads | Normalizer |
//! |-------|-------|------------|
//! | Imu | inertial | [`imu::from_v1`] / [`imu::from_v2`] |
//! | Magnetic | magnetic field | [`magnetic::from_raw`] |
//! | Gps | status, then fix if 3D | [`gps::from_fix`] |
//! | Humidity | humidity | [`humidity::from_raw`] |
//! | Temperature | temperature | [`temperature::from_raw`] |
//! | Light | illuminance | [`illuminance::from_raw`] |
//! | Range | distance | [`range::from_raw`] |
//!
//! The header is built after the reads complete, carrying the descriptor's
//! next sequence number. The caller commits that number only when a record
//! comes back.

pub mod gps;
pub mod humidity;
pub mod illuminance;
pub mod imu;
pub mod magnetic;
pub mod range;
pub mod temperature;

use crate::descriptor::SensorDescriptor;
use chrono::Utc;
use std::time::Duration;
use tf_core::{RawSample, SampleKind, SensorClass, SensorError, SensorRecord, SensorResult};
use tracing::debug;

/// Why a cycle produced no record without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    /// GPS fix quality below 3D
    NoFix { fix: u8 },
    /// Class never publishes
    NotPublished,
}

/// Result of sampling one descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Sampled {
    /// A record ready to publish
    Record(SensorRecord),
    /// Nothing to publish this cycle
    Suppressed(Suppression),
}

/// Read one raw sample through the descriptor's handle, bounded by `timeout`.
async fn read(
    descriptor: &SensorDescriptor,
    kind: SampleKind,
    timeout: Duration,
) -> SensorResult<RawSample> {
    match tokio::time::timeout(timeout, descriptor.handle().read(kind)).await {
        Ok(result) => result,
        Err(_) => Err(SensorError::Timeout {
            uid: descriptor.uid().to_string(),
            what: kind.label(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

fn unexpected(descriptor: &SensorDescriptor, kind: SampleKind) -> SensorError {
    SensorError::UnexpectedSample {
        uid: descriptor.uid().to_string(),
        what: kind.label(),
    }
}

/// Read and normalize one descriptor.
///
/// # Errors
/// Read failures, timeouts and samples of the wrong shape. None of them
/// change the descriptor.
pub async fn sample(descriptor: &SensorDescriptor, timeout: Duration) -> SensorResult<Sampled> {
    let hardware = descriptor.hardware();

    let record = match descriptor.class() {
        SensorClass::Misc => return Ok(Sampled::Suppressed(Suppression::NotPublished)),
        SensorClass::Imu => {
            let kind = SampleKind::Inertial;
            let raw = read(descriptor, kind, timeout).await?;
            let header = descriptor.next_header(Utc::now());
            match raw {
                RawSample::ImuV1(sample) => SensorRecord::Imu(imu::from_v1(&sample, header)),
                RawSample::ImuV2(sample) => SensorRecord::Imu(imu::from_v2(&sample, header)),
                _ => return Err(unexpected(descriptor, kind)),
            }
        }
        SensorClass::Magnetic => {
            let kind = SampleKind::MagneticField;
            match read(descriptor, kind, timeout).await? {
                RawSample::MagneticField { field } => SensorRecord::MagneticField(
                    magnetic::from_raw(hardware, field, descriptor.next_header(Utc::now())),
                ),
                _ => return Err(unexpected(descriptor, kind)),
            }
        }
        SensorClass::Gps => {
            let status = match read(descriptor, SampleKind::GpsStatus, timeout).await? {
                RawSample::GpsStatus(status) => status,
                _ => return Err(unexpected(descriptor, SampleKind::GpsStatus)),
            };
            if !status.is_3d_fix() {
                debug!(uid = descriptor.uid(), fix = status.fix, "No 3D fix, skipping");
                return Ok(Sampled::Suppressed(Suppression::NoFix { fix: status.fix }));
            }
            match read(descriptor, SampleKind::GpsFix, timeout).await? {
                RawSample::GpsFix(fix) => {
                    SensorRecord::NavSatFix(gps::from_fix(&fix, descriptor.next_header(Utc::now())))
                }
                _ => return Err(unexpected(descriptor, SampleKind::GpsFix)),
            }
        }
        SensorClass::Humidity => {
            let kind = SampleKind::Humidity;
            match read(descriptor, kind, timeout).await? {
                RawSample::Humidity { value } => SensorRecord::RelativeHumidity(
                    humidity::from_raw(value, descriptor.next_header(Utc::now())),
                ),
                _ => return Err(unexpected(descriptor, kind)),
            }
        }
        SensorClass::Temperature => {
            let kind = SampleKind::Temperature;
            match read(descriptor, kind, timeout).await? {
                RawSample::Temperature { value } => SensorRecord::Temperature(
                    temperature::from_raw(hardware, value, descriptor.next_header(Utc::now())),
                ),
                _ => return Err(unexpected(descriptor, kind)),
            }
        }
        SensorClass::Light => {
            let kind = SampleKind::Illuminance;
            match read(descriptor, kind, timeout).await? {
                RawSample::Illuminance { value } => SensorRecord::Illuminance(
                    illuminance::from_raw(hardware, value, descriptor.next_header(Utc::now())),
                ),
                _ => return Err(unexpected(descriptor, kind)),
            }
        }
        SensorClass::Range => {
            let kind = SampleKind::Distance;
            match read(descriptor, kind, timeout).await? {
                RawSample::Distance { value } => SensorRecord::Range(range::from_raw(
                    hardware,
                    descriptor.params(),
                    value,
                    descriptor.next_header(Utc::now()),
                )),
                _ => return Err(unexpected(descriptor, kind)),
            }
        }
    };

    Ok(Sampled::Record(record))
}
