//! Device descriptors and physical modules.
//!
//! A [`SensorDescriptor`] is one publishable channel. A [`PhysicalModule`]
//! owns the driver handle of one piece of hardware and is shared, via `Arc`,
//! by every descriptor built from it. The combined IMU 2.0 is the case that
//! needs sharing: its inertial and magnetometer descriptors read the same
//! handle.
//!
//! Descriptors are the only owners of a module's `Arc`. Releasing a
//! descriptor gives its reference back; the last release destroys the
//! handle, exactly once.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tf_core::{Channel, HardwareType, Header, SensorClass, SensorHandle, SensorParams, SensorResult};
use tracing::{debug, info};

/// Frame label used until a `frame_id` parameter is bound.
pub const DEFAULT_FRAME: &str = "base_link";

/// Nominal poll rate recorded on each descriptor (Hz). Not consulted.
pub const DEFAULT_RATE_HZ: u8 = 10;

/// Registry-unique descriptor identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId(pub u64);

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Physical Module
// =============================================================================

/// One piece of hardware and its live handle.
pub struct PhysicalModule {
    uid: String,
    handle: Arc<dyn SensorHandle>,
}

impl PhysicalModule {
    /// Wrap a freshly opened handle.
    pub fn new(handle: Arc<dyn SensorHandle>) -> Arc<Self> {
        Arc::new(Self {
            uid: handle.uid().to_string(),
            handle,
        })
    }

    /// Bus address.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Hardware type the handle was opened for.
    pub fn hardware(&self) -> HardwareType {
        self.handle.hardware()
    }

    /// The shared device handle.
    pub fn handle(&self) -> &dyn SensorHandle {
        self.handle.as_ref()
    }

    /// Give back one reference.
    ///
    /// Destroys the handle if this was the last reference and returns whether
    /// it did. `Arc::into_inner` hands the module to exactly one caller, so the
    /// handle cannot be destroyed twice.
    pub async fn release(module: Arc<Self>) -> SensorResult<bool> {
        match Arc::into_inner(module) {
            Some(module) => {
                info!(uid = %module.uid, hardware = %module.hardware(), "Destroying device handle");
                module.handle.destroy().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl fmt::Debug for PhysicalModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicalModule")
            .field("uid", &self.uid)
            .field("hardware", &self.hardware())
            .finish()
    }
}

// =============================================================================
// Sensor Descriptor
// =============================================================================

/// One logical sensor channel.
#[derive(Debug)]
pub struct SensorDescriptor {
    id: DescriptorId,
    uid: String,
    class: SensorClass,
    hardware: HardwareType,
    module: Arc<PhysicalModule>,
    sequence: u32,
    params: SensorParams,
    frame: String,
    topic: Option<String>,
    channel: Option<Channel>,
    rate_hz: u8,
}

impl SensorDescriptor {
    pub(crate) fn new(
        id: DescriptorId,
        class: SensorClass,
        hardware: HardwareType,
        module: Arc<PhysicalModule>,
        topic: Option<String>,
        channel: Option<Channel>,
    ) -> Self {
        Self {
            id,
            uid: module.uid().to_string(),
            class,
            hardware,
            module,
            sequence: 0,
            params: SensorParams::new(),
            frame: DEFAULT_FRAME.to_string(),
            topic,
            channel,
            rate_hz: DEFAULT_RATE_HZ,
        }
    }

    /// Registry-assigned identifier.
    pub fn id(&self) -> DescriptorId {
        self.id
    }

    /// Bus address.
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Sensor class.
    pub fn class(&self) -> SensorClass {
        self.class
    }

    /// Hardware type of this descriptor. For the IMU 2.0 magnetometer this is
    /// the synthesized type, not the module's.
    pub fn hardware(&self) -> HardwareType {
        self.hardware
    }

    /// Type code this descriptor identifies as.
    pub fn type_code(&self) -> u16 {
        self.hardware.code()
    }

    /// Shared physical module.
    pub fn module(&self) -> &Arc<PhysicalModule> {
        &self.module
    }

    /// Handle of the shared module.
    pub fn handle(&self) -> &dyn SensorHandle {
        self.module.handle()
    }

    /// Sequence number of the last emitted record (0 before the first).
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Bound configuration parameters.
    pub fn params(&self) -> &SensorParams {
        &self.params
    }

    /// Frame label stamped on records.
    pub fn frame(&self) -> &str {
        &self.frame
    }

    /// Topic, for publishing classes.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Advertised channel, for publishing classes.
    pub fn channel(&self) -> Option<&Channel> {
        self.channel.as_ref()
    }

    /// Nominal sampling rate.
    pub fn rate_hz(&self) -> u8 {
        self.rate_hz
    }

    /// Whether this descriptor matches the identity triple.
    pub fn matches(&self, uid: &str, class: SensorClass, type_code: u16) -> bool {
        self.uid == uid && self.class == class && self.type_code() == type_code
    }

    /// Replace the bound parameters; a string `frame_id` overrides the frame.
    pub fn bind_params(&mut self, params: SensorParams) {
        if let Some(frame) = params.frame_id() {
            self.frame = frame.to_string();
        }
        debug!(uid = %self.uid, class = %self.class, params = params.len(), frame = %self.frame, "Bound parameters");
        self.params = params;
    }

    /// Header for the next record, without consuming a sequence number.
    pub fn next_header(&self, stamp: DateTime<Utc>) -> Header {
        Header {
            seq: self.sequence.wrapping_add(1),
            stamp,
            frame_id: self.frame.clone(),
        }
    }

    /// Consume the sequence number handed out by [`Self::next_header`].
    pub fn advance_sequence(&mut self) -> u32 {
        self.sequence = self.sequence.wrapping_add(1);
        self.sequence
    }

    pub(crate) fn into_module(self) -> Arc<PhysicalModule> {
        self.module
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tf_core::{ParamValue, RawSample, SampleKind, SensorError};

    struct CountingHandle {
        destroyed: Arc<AtomicU32>,
    }

    #[async_trait]
    impl SensorHandle for CountingHandle {
        fn uid(&self) -> &str {
            "imu2"
        }

        fn hardware(&self) -> HardwareType {
            HardwareType::ImuV2
        }

        async fn read(&self, kind: SampleKind) -> SensorResult<RawSample> {
            Err(SensorError::Unsupported {
                uid: "imu2".into(),
                what: kind.label(),
            })
        }

        async fn destroy(&self) -> SensorResult<()> {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn module(counter: &Arc<AtomicU32>) -> Arc<PhysicalModule> {
        PhysicalModule::new(Arc::new(CountingHandle {
            destroyed: counter.clone(),
        }))
    }

    #[tokio::test]
    async fn test_last_release_destroys_once() {
        let destroyed = Arc::new(AtomicU32::new(0));
        let first = module(&destroyed);
        let second = first.clone();

        assert!(!PhysicalModule::release(first).await.unwrap());
        assert_eq!(destroyed.load(Ordering::SeqCst), 0);

        assert!(PhysicalModule::release(second).await.unwrap());
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sequence_starts_at_zero_and_header_peeks() {
        let destroyed = Arc::new(AtomicU32::new(0));
        let mut descriptor = SensorDescriptor::new(
            DescriptorId(1),
            SensorClass::Imu,
            HardwareType::ImuV2,
            module(&destroyed),
            Some("/imu".into()),
            None,
        );
        assert_eq!(descriptor.sequence(), 0);

        let stamp = Utc::now();
        assert_eq!(descriptor.next_header(stamp).seq, 1);
        assert_eq!(descriptor.next_header(stamp).seq, 1);
        assert_eq!(descriptor.advance_sequence(), 1);
        assert_eq!(descriptor.next_header(stamp).seq, 2);
        assert_eq!(descriptor.next_header(stamp).frame_id, DEFAULT_FRAME);
    }

    #[test]
    fn test_frame_id_override() {
        let destroyed = Arc::new(AtomicU32::new(0));
        let mut descriptor = SensorDescriptor::new(
            DescriptorId(1),
            SensorClass::Magnetic,
            HardwareType::ImuV2Magnetic,
            module(&destroyed),
            None,
            None,
        );

        descriptor.bind_params(SensorParams::new().with("frame_id", ParamValue::Integer(3)));
        assert_eq!(descriptor.frame(), DEFAULT_FRAME);

        descriptor.bind_params(
            SensorParams::new().with("frame_id", ParamValue::String("imu_link".into())),
        );
        assert_eq!(descriptor.frame(), "imu_link");
        assert_eq!(descriptor.type_code(), 400);
        assert!(descriptor.matches("imu2", SensorClass::Magnetic, 400));
        assert!(!descriptor.matches("imu2", SensorClass::Imu, 400));
    }
}
