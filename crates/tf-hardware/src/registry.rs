//! Device Registry
//!
//! Owns the live [`SensorDescriptor`]s in insertion order. The registry is
//! the only place descriptors are created or destroyed, and it holds the
//! [`TopicNamer`] so that generated topic names stay unique for the lifetime
//! of the process.
//!
//! The registry has no interior locking. It is owned by the sensor service
//! loop, which marshals bus events and poll ticks onto one task, so every
//! operation here runs to completion before the next one starts.

use crate::descriptor::{DescriptorId, PhysicalModule, SensorDescriptor};
use crate::topic::TopicNamer;
use std::sync::Arc;
use tf_core::{HardwareType, SensorClass, SensorError, SensorParams, SensorResult, TelemetrySink};
use tracing::{debug, error, info};

/// Collection of live descriptors.
pub struct SensorRegistry {
    descriptors: Vec<SensorDescriptor>,
    namer: TopicNamer,
    sink: Arc<dyn TelemetrySink>,
    next_id: u64,
}

impl SensorRegistry {
    /// Empty registry advertising on `sink`.
    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self {
            descriptors: Vec::new(),
            namer: TopicNamer::new(),
            sink,
            next_id: 1,
        }
    }

    /// Create a descriptor for `module`.
    ///
    /// Publishing classes get a topic (the requested one, or a generated one
    /// when `requested_topic` is `None` or empty) and a channel advertised on
    /// the sink. [`SensorClass::Misc`] descriptors get neither, and the namer
    /// is not consulted for them.
    ///
    /// # Errors
    /// - [`SensorError::AlreadyRegistered`] if a descriptor with the same
    ///   address, class and type code is live
    /// - any error from [`TelemetrySink::advertise`]
    pub fn create(
        &mut self,
        class: SensorClass,
        hardware: HardwareType,
        module: Arc<PhysicalModule>,
        requested_topic: Option<&str>,
    ) -> SensorResult<DescriptorId> {
        let uid = module.uid().to_string();
        if self.find(&uid, class, hardware.code()).is_some() {
            return Err(SensorError::AlreadyRegistered {
                uid,
                class,
                type_code: hardware.code(),
            });
        }

        let requested = requested_topic.filter(|t| !t.is_empty());
        let topic = if class.is_published() {
            match requested {
                Some(topic) => Some(topic.to_string()),
                None => self.namer.peek(class),
            }
        } else {
            None
        };

        // The generated number is only consumed once the sink accepts it.
        let channel = match &topic {
            Some(topic) => Some(self.sink.advertise(topic, class)?),
            None => None,
        };
        if topic.is_some() && requested.is_none() {
            self.namer.commit(class);
        }

        let id = DescriptorId(self.next_id);
        self.next_id += 1;

        info!(
            uid = %uid,
            class = %class,
            type_code = hardware.code(),
            topic = topic.as_deref().unwrap_or("-"),
            "Created sensor descriptor {}",
            id
        );

        self.descriptors.push(SensorDescriptor::new(
            id, class, hardware, module, topic, channel,
        ));
        Ok(id)
    }

    /// Apply `params` to every live descriptor at `uid`.
    ///
    /// Returns how many descriptors were updated; zero is not an error.
    pub fn bind_config(&mut self, uid: &str, params: &SensorParams) -> usize {
        let mut bound = 0;
        for descriptor in self.descriptors.iter_mut().filter(|d| d.uid() == uid) {
            descriptor.bind_params(params.clone());
            bound += 1;
        }
        if bound == 0 {
            debug!(uid, "No live descriptor to bind configuration to");
        }
        bound
    }

    /// Remove every descriptor at `uid`, releasing their handle references.
    ///
    /// Returns the number of descriptors removed. A failing handle destroy is
    /// logged; the descriptor is removed regardless.
    pub async fn destroy(&mut self, uid: &str) -> usize {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.descriptors)
            .into_iter()
            .partition(|d| d.uid() == uid);
        self.descriptors = kept;

        let count = removed.len();
        Self::release_all(removed).await;
        count
    }

    /// Remove the descriptors in `ids`, releasing their handle references.
    ///
    /// Unknown ids are skipped. Returns the number of descriptors removed.
    pub async fn discard(&mut self, ids: &[DescriptorId]) -> usize {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.descriptors)
            .into_iter()
            .partition(|d| ids.contains(&d.id()));
        self.descriptors = kept;

        let count = removed.len();
        Self::release_all(removed).await;
        count
    }

    /// Remove every descriptor. Idempotent.
    pub async fn destroy_all(&mut self) -> usize {
        let removed = std::mem::take(&mut self.descriptors);
        let count = removed.len();
        if count > 0 {
            info!(count, "Releasing all sensor descriptors");
        }
        Self::release_all(removed).await;
        count
    }

    async fn release_all(descriptors: Vec<SensorDescriptor>) {
        for descriptor in descriptors {
            let uid = descriptor.uid().to_string();
            let class = descriptor.class();
            debug!(uid = %uid, class = %class, "Releasing descriptor {}", descriptor.id());
            if let Err(e) = PhysicalModule::release(descriptor.into_module()).await {
                error!(uid = %uid, class = %class, "Failed to destroy device handle: {}", e);
            }
        }
    }

    /// Whether a descriptor for `uid` built from `hardware` is live.
    ///
    /// Matches on the module's hardware type, so the synthesized magnetometer
    /// descriptor of an IMU 2.0 counts as built from [`HardwareType::ImuV2`].
    pub fn contains(&self, uid: &str, hardware: HardwareType) -> bool {
        self.descriptors
            .iter()
            .any(|d| d.uid() == uid && d.module().hardware() == hardware)
    }

    /// Look up a descriptor by its identity triple.
    pub fn find(&self, uid: &str, class: SensorClass, type_code: u16) -> Option<&SensorDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.matches(uid, class, type_code))
    }

    /// Descriptor with the given id, if live.
    pub fn get(&self, id: DescriptorId) -> Option<&SensorDescriptor> {
        self.descriptors.iter().find(|d| d.id() == id)
    }

    /// Live descriptors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SensorDescriptor> {
        self.descriptors.iter()
    }

    /// Mutable access to live descriptors in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SensorDescriptor> {
        self.descriptors.iter_mut()
    }

    /// Visit every live descriptor in insertion order.
    pub fn for_each<F>(&mut self, f: F)
    where
        F: FnMut(&mut SensorDescriptor),
    {
        self.descriptors.iter_mut().for_each(f);
    }

    /// Number of live descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// True when no descriptor is live.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Topic counters shared by every descriptor.
    pub fn namer(&self) -> &TopicNamer {
        &self.namer
    }

    /// Sink the registry advertises channels on.
    pub fn sink(&self) -> &Arc<dyn TelemetrySink> {
        &self.sink
    }
}

impl std::fmt::Debug for SensorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorRegistry")
            .field("descriptors", &self.descriptors)
            .field("namer", &self.namer)
            .finish()
    }
}
