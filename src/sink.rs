//! Concrete telemetry sinks.
//!
//! - [`JsonLinesSink`]: one `{"topic": ..., "record": ...}` object per line
//! - [`LogSink`]: every record as an `info` tracing event
//! - [`BroadcastSink`]: in-process fan-out over `tokio::sync::broadcast`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::Write;
use tf_core::{Channel, SensorClass, SensorError, SensorRecord, SensorResult, TelemetrySink};
use tokio::sync::{broadcast, Mutex};
use tracing::info;

/// One published record with its channel topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Published {
    /// Channel topic
    pub topic: String,
    /// Published record
    pub record: SensorRecord,
}

#[derive(Serialize)]
struct Line<'a> {
    topic: &'a str,
    record: &'a SensorRecord,
}

fn encode(channel: &Channel, record: &SensorRecord) -> SensorResult<String> {
    serde_json::to_string(&Line {
        topic: channel.topic(),
        record,
    })
    .map_err(|e| SensorError::Sink {
        topic: channel.topic().to_string(),
        message: e.to_string(),
    })
}

// =============================================================================
// JSON Lines
// =============================================================================

/// Writes each record as a single JSON line.
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl JsonLinesSink<std::io::Stdout> {
    /// Sink writing to standard output.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Sink writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer, e.g. to inspect a buffer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W: Write + Send> TelemetrySink for JsonLinesSink<W> {
    fn advertise(&self, topic: &str, class: SensorClass) -> SensorResult<Channel> {
        info!(topic, %class, "Advertised channel");
        Ok(Channel::new(topic, class))
    }

    async fn publish(&self, channel: &Channel, record: SensorRecord) -> SensorResult<()> {
        let line = encode(channel, &record)?;
        let mut writer = self.writer.lock().await;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }
}

// =============================================================================
// Log
// =============================================================================

/// Emits each record as a structured `info` event.
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    /// Log sink.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TelemetrySink for LogSink {
    fn advertise(&self, topic: &str, class: SensorClass) -> SensorResult<Channel> {
        info!(topic, %class, "Advertised channel");
        Ok(Channel::new(topic, class))
    }

    async fn publish(&self, channel: &Channel, record: SensorRecord) -> SensorResult<()> {
        let header = record.header();
        let payload = encode(channel, &record)?;
        info!(
            topic = channel.topic(),
            seq = header.seq,
            frame_id = %header.frame_id,
            record = %payload,
            "Telemetry"
        );
        Ok(())
    }
}

// =============================================================================
// Broadcast
// =============================================================================

/// Fans records out to every in-process subscriber.
///
/// Publishing with no subscribers is not an error; lagging subscribers lose
/// the oldest records.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<Published>,
}

impl BroadcastSink {
    /// Sink buffering up to `capacity` records per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// New receiver of every later record.
    pub fn subscribe(&self) -> broadcast::Receiver<Published> {
        self.sender.subscribe()
    }

    /// Number of live receivers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl TelemetrySink for BroadcastSink {
    fn advertise(&self, topic: &str, class: SensorClass) -> SensorResult<Channel> {
        Ok(Channel::new(topic, class))
    }

    async fn publish(&self, channel: &Channel, record: SensorRecord) -> SensorResult<()> {
        // Err only means nobody is listening right now
        let _ = self.sender.send(Published {
            topic: channel.topic().to_string(),
            record,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_core::{Header, RelativeHumidityRecord, TemperatureRecord};

    fn header(seq: u32) -> Header {
        Header {
            seq,
            stamp: chrono::Utc::now(),
            frame_id: "base_link".to_string(),
        }
    }

    fn humidity(seq: u32) -> SensorRecord {
        SensorRecord::RelativeHumidity(RelativeHumidityRecord {
            header: header(seq),
            relative_humidity: 0.455,
            variance: 0.0,
        })
    }

    #[tokio::test]
    async fn test_json_lines_one_object_per_record() {
        let sink = JsonLinesSink::new(Vec::new());
        let channel = sink
            .advertise("/tfsensors/humidity1", SensorClass::Humidity)
            .unwrap();

        sink.publish(&channel, humidity(1)).await.unwrap();
        sink.publish(&channel, humidity(2)).await.unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Published = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.topic, "/tfsensors/humidity1");
        assert_eq!(first.record.header().seq, 1);
        assert_eq!(first.record.class(), SensorClass::Humidity);

        let value: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(value["record"]["type"], "relative_humidity");
        assert_eq!(value["record"]["relative_humidity"], 0.455);
    }

    #[tokio::test]
    async fn test_log_sink_accepts_records() {
        let sink = LogSink::new();
        let channel = sink
            .advertise("/tfsensors/temperature1", SensorClass::Temperature)
            .unwrap();
        let record = SensorRecord::Temperature(TemperatureRecord {
            header: header(1),
            temperature: 21.5,
            variance: 0.0,
        });
        assert!(sink.publish(&channel, record).await.is_ok());
    }

    #[tokio::test]
    async fn test_broadcast_fans_out() {
        let sink = BroadcastSink::new(8);
        let channel = sink
            .advertise("/tfsensors/humidity1", SensorClass::Humidity)
            .unwrap();

        // No subscribers yet
        sink.publish(&channel, humidity(1)).await.unwrap();

        let mut a = sink.subscribe();
        let mut b = sink.subscribe();
        assert_eq!(sink.subscriber_count(), 2);
        sink.publish(&channel, humidity(2)).await.unwrap();

        for rx in [&mut a, &mut b] {
            let published = rx.recv().await.unwrap();
            assert_eq!(published.topic, "/tfsensors/humidity1");
            assert_eq!(published.record.header().seq, 2);
        }
    }
}
