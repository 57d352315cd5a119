//! Polling Dispatcher
//!
//! One `publish_all` pass visits every live descriptor in insertion order,
//! samples it through [`normalize::sample`](crate::normalize::sample), and
//! publishes the record on the descriptor's channel. Every per-descriptor
//! failure is logged and counted; none of them stops the pass.
//!
//! Descriptors are sampled one after another. Each read is bounded by the
//! read timeout, so a stuck module delays the cycle by at most that much.

use crate::normalize::{self, Sampled, Suppression};
use crate::registry::SensorRegistry;
use std::sync::Arc;
use std::time::Duration;
use tf_core::TelemetrySink;
use tracing::{error, trace};

/// Outcome counts of one polling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    /// Descriptors that emitted a record
    pub published: usize,
    /// Descriptors deliberately skipped (no 3D fix, class never publishes)
    pub suppressed: usize,
    /// Descriptors whose read, normalization or publish failed
    pub failed: usize,
}

impl CycleReport {
    /// Number of descriptors visited.
    pub fn visited(&self) -> usize {
        self.published + self.suppressed + self.failed
    }
}

/// Drives one sampling pass over a registry.
pub struct PollingDispatcher {
    sink: Arc<dyn TelemetrySink>,
    read_timeout: Duration,
}

impl PollingDispatcher {
    /// Dispatcher publishing to `sink`.
    pub fn new(sink: Arc<dyn TelemetrySink>, read_timeout: Duration) -> Self {
        Self { sink, read_timeout }
    }

    /// Bound on each handle read.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Sample and publish every live descriptor once.
    pub async fn publish_all(&self, registry: &mut SensorRegistry) -> CycleReport {
        let mut report = CycleReport::default();

        for descriptor in registry.iter_mut() {
            let record = match normalize::sample(descriptor, self.read_timeout).await {
                Ok(Sampled::Record(record)) => record,
                Ok(Sampled::Suppressed(reason)) => {
                    if let Suppression::NoFix { fix } = reason {
                        trace!(uid = descriptor.uid(), fix, "GPS record suppressed");
                    }
                    report.suppressed += 1;
                    continue;
                }
                Err(e) => {
                    error!(uid = descriptor.uid(), class = %descriptor.class(), "Could not sample device: {}", e);
                    report.failed += 1;
                    continue;
                }
            };

            descriptor.advance_sequence();

            let Some(channel) = descriptor.channel() else {
                // Only Misc descriptors lack a channel, and they never sample.
                report.suppressed += 1;
                continue;
            };

            match self.sink.publish(channel, record).await {
                Ok(()) => report.published += 1,
                Err(e) => {
                    error!(uid = descriptor.uid(), topic = %channel, "Could not publish record: {}", e);
                    report.failed += 1;
                }
            }
        }

        trace!(
            published = report.published,
            suppressed = report.suppressed,
            failed = report.failed,
            "Polling cycle complete"
        );
        report
    }
}
