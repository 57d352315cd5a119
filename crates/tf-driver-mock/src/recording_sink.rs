//! Telemetry sink that keeps everything it is given.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use tf_core::{Channel, SensorClass, SensorError, SensorRecord, SensorResult, TelemetrySink};

/// Records advertised channels and published records for inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    channels: Mutex<Vec<Channel>>,
    records: Mutex<Vec<(String, SensorRecord)>>,
    failing: Mutex<HashSet<String>>,
    rejected_prefixes: Mutex<Vec<String>>,
}

impl RecordingSink {
    /// Sink that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every publish on `topic` from now on.
    pub fn fail_topic(&self, topic: impl Into<String>) {
        self.failing.lock().insert(topic.into());
    }

    /// Reject every advertise whose topic starts with `prefix`.
    pub fn fail_advertise(&self, prefix: impl Into<String>) {
        self.rejected_prefixes.lock().push(prefix.into());
    }

    /// Accept advertises again.
    pub fn accept_advertise(&self) {
        self.rejected_prefixes.lock().clear();
    }

    /// Advertised topics in order.
    pub fn topics(&self) -> Vec<String> {
        self.channels
            .lock()
            .iter()
            .map(|c| c.topic().to_string())
            .collect()
    }

    /// Advertised channels in order.
    pub fn channels(&self) -> Vec<Channel> {
        self.channels.lock().clone()
    }

    /// All `(topic, record)` pairs in publish order.
    pub fn records(&self) -> Vec<(String, SensorRecord)> {
        self.records.lock().clone()
    }

    /// Records published on `topic`.
    pub fn records_for(&self, topic: &str) -> Vec<SensorRecord> {
        self.records
            .lock()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// Number of published records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// True when nothing has been published.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Forget published records; channels stay advertised.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

#[async_trait]
impl TelemetrySink for RecordingSink {
    fn advertise(&self, topic: &str, class: SensorClass) -> SensorResult<Channel> {
        let rejected = self
            .rejected_prefixes
            .lock()
            .iter()
            .any(|prefix| topic.starts_with(prefix.as_str()));
        if rejected {
            return Err(SensorError::Sink {
                topic: topic.to_string(),
                message: "advertise rejected".to_string(),
            });
        }
        let channel = Channel::new(topic, class);
        self.channels.lock().push(channel.clone());
        Ok(channel)
    }

    async fn publish(&self, channel: &Channel, record: SensorRecord) -> SensorResult<()> {
        if self.failing.lock().contains(channel.topic()) {
            return Err(SensorError::Sink {
                topic: channel.topic().to_string(),
                message: "publish rejected".to_string(),
            });
        }
        self.records
            .lock()
            .push((channel.topic().to_string(), record));
        Ok(())
    }
}
