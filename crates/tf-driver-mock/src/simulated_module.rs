//! Simulated sensor modules and their handles.
//!
//! A [`SimulatedModule`] describes what the simulated bus announces: an
//! address, a hardware type, the raw samples each read returns, and the
//! errors to inject. [`SimulatedHandle`] is the [`SensorHandle`] the bus
//! hands out for it.

use crate::common::{ErrorConfig, Injection, MockMode, MockRng};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tf_core::{
    GpsFix, GpsStatus, HandleOptions, HardwareType, ImuV1Sample, ImuV2Sample, RawSample,
    SampleKind, SensorError, SensorHandle, SensorResult,
};
use tracing::{debug, trace};

// =============================================================================
// Default Samples
// =============================================================================

/// Plausible resting readings for a module of type `hardware`.
pub fn default_samples(hardware: HardwareType) -> Vec<RawSample> {
    match hardware {
        HardwareType::Imu => vec![
            RawSample::ImuV1(ImuV1Sample {
                quaternion: [0.0, 0.0, 0.0, 1.0],
                acceleration: [0, 0, 1000],
                magnetic_field: [210, -35, 400],
                angular_velocity: [0, 0, 0],
                temperature: 2350,
            }),
            RawSample::MagneticField {
                field: [210, -35, 400],
            },
        ],
        HardwareType::ImuV2 => vec![
            RawSample::ImuV2(ImuV2Sample {
                quaternion: [0, 0, 0, 16383],
                acceleration: [0, 0, 981],
                angular_velocity: [0, 0, 0],
            }),
            RawSample::MagneticField { field: [21, -3, 40] },
        ],
        HardwareType::AmbientLight => vec![RawSample::Illuminance { value: 3_205 }],
        HardwareType::AmbientLightV2 => vec![RawSample::Illuminance { value: 32_050 }],
        HardwareType::DistanceIr => vec![RawSample::Distance { value: 250 }],
        HardwareType::DistanceUs => vec![RawSample::Distance { value: 1_200 }],
        HardwareType::Humidity => vec![RawSample::Humidity { value: 455 }],
        HardwareType::Temperature => vec![RawSample::Temperature { value: 2_150 }],
        HardwareType::TemperatureIr => vec![RawSample::Temperature { value: 215 }],
        HardwareType::Gps => vec![
            RawSample::GpsStatus(GpsStatus {
                fix: GpsStatus::FIX_3D_FIX,
                satellites_view: 9,
                satellites_used: 7,
            }),
            RawSample::GpsFix(GpsFix {
                latitude: 52_520_008,
                ns: 'N',
                longitude: 13_404_954,
                ew: 'E',
                altitude: 3_450,
                ..Default::default()
            }),
        ],
        HardwareType::Master
        | HardwareType::DualButton
        | HardwareType::MotionDetector
        | HardwareType::ImuV2Magnetic => Vec::new(),
    }
}

fn jittered(sample: RawSample, rng: &MockRng) -> RawSample {
    fn nudge_u16(v: u16, rng: &MockRng) -> u16 {
        (i32::from(v) + rng.jitter(2)).clamp(0, i32::from(u16::MAX)) as u16
    }
    fn nudge_i16(v: i16, rng: &MockRng) -> i16 {
        (i32::from(v) + rng.jitter(2)).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
    }

    match sample {
        RawSample::Humidity { value } => RawSample::Humidity {
            value: nudge_u16(value, rng),
        },
        RawSample::Temperature { value } => RawSample::Temperature {
            value: nudge_i16(value, rng),
        },
        RawSample::Distance { value } => RawSample::Distance {
            value: nudge_u16(value, rng),
        },
        RawSample::Illuminance { value } => RawSample::Illuminance {
            value: value.saturating_add_signed(rng.jitter(2)),
        },
        RawSample::MagneticField { field } => RawSample::MagneticField {
            field: field.map(|v| nudge_i16(v, rng)),
        },
        RawSample::ImuV2(mut imu) => {
            imu.acceleration = imu.acceleration.map(|v| nudge_i16(v, rng));
            imu.angular_velocity = imu.angular_velocity.map(|v| nudge_i16(v, rng));
            RawSample::ImuV2(imu)
        }
        other => other,
    }
}

// =============================================================================
// Simulated Module
// =============================================================================

/// A module served by the simulated bus.
#[derive(Debug, Clone)]
pub struct SimulatedModule {
    /// Bus address
    pub uid: String,
    /// Announced type code
    pub type_code: u16,
    samples: HashMap<SampleKind, RawSample>,
    /// Injected read failures
    pub errors: ErrorConfig,
    /// Read latency profile
    pub mode: MockMode,
    jitter: Option<Arc<MockRng>>,
}

impl SimulatedModule {
    /// Module of a recognized type with its default readings.
    pub fn new(uid: impl Into<String>, hardware: HardwareType) -> Self {
        let mut module = Self::with_type_code(uid, hardware.code());
        for sample in default_samples(hardware) {
            module = module.with_sample(sample);
        }
        module
    }

    /// Module announcing an arbitrary type code, with no readings.
    pub fn with_type_code(uid: impl Into<String>, type_code: u16) -> Self {
        Self {
            uid: uid.into(),
            type_code,
            samples: HashMap::new(),
            errors: ErrorConfig::none(),
            mode: MockMode::Instant,
            jitter: None,
        }
    }

    /// Set the sample returned for its read kind.
    pub fn with_sample(mut self, sample: RawSample) -> Self {
        self.samples.insert(sample.kind(), sample);
        self
    }

    /// Replace the injected failures.
    pub fn with_errors(mut self, errors: ErrorConfig) -> Self {
        self.errors = errors;
        self
    }

    /// Set the latency profile; lossy profiles also inject failures.
    pub fn with_mode(mut self, mode: MockMode) -> Self {
        self.mode = mode;
        if mode.failure_rate() > 0.0 {
            let seed = self.jitter.as_ref().map(|rng| rng.next_u64());
            self.errors = ErrorConfig::random_failures_seeded(mode.failure_rate(), seed);
        }
        self
    }

    /// Perturb numeric readings by a couple of device units on every read.
    pub fn with_jitter(mut self, seed: Option<u64>) -> Self {
        self.jitter = Some(Arc::new(MockRng::new(seed)));
        self
    }

    /// Hardware type, if the code is recognized.
    pub fn hardware(&self) -> Option<HardwareType> {
        HardwareType::from_code(self.type_code)
    }

    /// Sample returned for `kind`, if any.
    pub fn sample(&self, kind: SampleKind) -> Option<&RawSample> {
        self.samples.get(&kind)
    }
}

// =============================================================================
// Simulated Handle
// =============================================================================

/// Handle to a [`SimulatedModule`], constructed by the simulated bus.
#[derive(Debug)]
pub struct SimulatedHandle {
    module: SimulatedModule,
    hardware: HardwareType,
    options: HandleOptions,
    leds_on: AtomicBool,
    destroyed: AtomicBool,
    destroy_calls: AtomicU32,
    reads: AtomicU32,
}

impl SimulatedHandle {
    pub(crate) fn open(module: SimulatedModule, hardware: HardwareType, options: HandleOptions) -> Self {
        let leds = matches!(hardware, HardwareType::Imu | HardwareType::ImuV2);
        if leds {
            debug!(uid = %module.uid, convergence = options.imu_convergence_speed, "IMU LEDs on");
        }
        Self {
            module,
            hardware,
            options,
            leds_on: AtomicBool::new(leds),
            destroyed: AtomicBool::new(false),
            destroy_calls: AtomicU32::new(0),
            reads: AtomicU32::new(0),
        }
    }

    /// Whether the IMU status LEDs are currently on.
    pub fn leds_on(&self) -> bool {
        self.leds_on.load(Ordering::SeqCst)
    }

    /// Convergence speed applied at construction (IMU variant A only).
    pub fn convergence_speed(&self) -> Option<u16> {
        (self.hardware == HardwareType::Imu).then_some(self.options.imu_convergence_speed)
    }

    /// Whether `destroy` has been called.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Number of times `destroy` was called.
    pub fn destroy_calls(&self) -> u32 {
        self.destroy_calls.load(Ordering::SeqCst)
    }

    /// Number of reads attempted.
    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SensorHandle for SimulatedHandle {
    fn uid(&self) -> &str {
        &self.module.uid
    }

    fn hardware(&self) -> HardwareType {
        self.hardware
    }

    async fn read(&self, kind: SampleKind) -> SensorResult<RawSample> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let uid = &self.module.uid;

        if self.is_destroyed() {
            return Err(SensorError::Handle {
                uid: uid.clone(),
                message: "read after destroy".to_string(),
            });
        }

        if self.module.errors.check_operation(uid, kind)? == Injection::Stall {
            trace!(uid = %uid, what = kind.label(), "Stalling read");
            futures::future::pending::<()>().await;
        }

        let latency = self.module.mode.read_latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let sample = self
            .module
            .sample(kind)
            .copied()
            .ok_or_else(|| SensorError::Unsupported {
                uid: uid.clone(),
                what: kind.label(),
            })?;

        Ok(match &self.module.jitter {
            Some(rng) => jittered(sample, rng),
            None => sample,
        })
    }

    async fn destroy(&self) -> SensorResult<()> {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
        if self.leds_on.swap(false, Ordering::SeqCst) {
            debug!(uid = %self.module.uid, "IMU LEDs off");
        }
        self.destroyed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_humidity_read() {
        let module = SimulatedModule::new("hum", HardwareType::Humidity);
        let handle = SimulatedHandle::open(module, HardwareType::Humidity, HandleOptions::default());
        assert_eq!(
            handle.read(SampleKind::Humidity).await.unwrap(),
            RawSample::Humidity { value: 455 }
        );
        assert_eq!(handle.reads(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_read() {
        let module = SimulatedModule::new("btn", HardwareType::DualButton);
        let handle = SimulatedHandle::open(module, HardwareType::DualButton, HandleOptions::default());
        assert!(matches!(
            handle.read(SampleKind::Distance).await,
            Err(SensorError::Unsupported { .. })
        ));
    }

    #[tokio::test]
    async fn test_imu_leds_follow_lifecycle() {
        let options = HandleOptions {
            imu_convergence_speed: 30,
        };
        let module = SimulatedModule::new("imu", HardwareType::Imu);
        let handle = SimulatedHandle::open(module, HardwareType::Imu, options);
        assert!(handle.leds_on());
        assert_eq!(handle.convergence_speed(), Some(30));

        handle.destroy().await.unwrap();
        assert!(!handle.leds_on());
        assert!(handle.is_destroyed());
        assert!(handle.read(SampleKind::Inertial).await.is_err());
    }

    #[tokio::test]
    async fn test_jitter_stays_close() {
        let module = SimulatedModule::new("t", HardwareType::Temperature).with_jitter(Some(3));
        let handle = SimulatedHandle::open(module, HardwareType::Temperature, HandleOptions::default());
        for _ in 0..20 {
            match handle.read(SampleKind::Temperature).await.unwrap() {
                RawSample::Temperature { value } => assert!((2_148..=2_152).contains(&value)),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_gps_defaults_have_3d_fix() {
        let module = SimulatedModule::new("gps", HardwareType::Gps);
        match module.sample(SampleKind::GpsStatus) {
            Some(RawSample::GpsStatus(status)) => assert!(status.is_3d_fix()),
            other => panic!("unexpected {:?}", other),
        }
    }
}
