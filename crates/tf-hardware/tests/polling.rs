//! Polling dispatcher behavior: normalization, suppression and failures.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;
use std::time::Duration;
use tf_core::{
    BusEvent, BusStatus, ConfigProvider, EnumerationType, GpsStatus, HandleOptions, HardwareType,
    ImuV2Sample, ParamValue, RadiationType, RawSample, SampleKind, SensorConfig, SensorRecord,
};
use tf_driver_mock::{ErrorConfig, ErrorScenario, RecordingSink, SimulatedBus, SimulatedModule};
use tf_hardware::{CycleReport, DiscoveryDispatcher, PollingDispatcher, SensorRegistry};

struct Fixture {
    sink: Arc<RecordingSink>,
    registry: SensorRegistry,
    polling: PollingDispatcher,
}

async fn discover(
    modules: Vec<SimulatedModule>,
    config: HashMap<String, SensorConfig>,
    read_timeout: Duration,
) -> Fixture {
    let announcements: Vec<_> = modules
        .iter()
        .map(|m| BusEvent::enumerate(&m.uid, m.type_code, EnumerationType::Available))
        .collect();
    let bus = Arc::new(SimulatedBus::with_modules(modules));
    let sink = Arc::new(RecordingSink::new());
    let provider: Arc<dyn ConfigProvider> = Arc::new(config);
    let mut registry = SensorRegistry::new(sink.clone());
    let discovery = DiscoveryDispatcher::new(bus, provider, HandleOptions::default());

    for event in announcements {
        discovery.handle_event(&mut registry, event).await.unwrap();
    }

    Fixture {
        polling: PollingDispatcher::new(sink.clone(), read_timeout),
        sink,
        registry,
    }
}

async fn simple(modules: Vec<SimulatedModule>) -> Fixture {
    discover(modules, HashMap::new(), Duration::from_millis(100)).await
}

#[tokio::test]
async fn every_class_publishes_its_record() {
    let mut f = simple(vec![
        SimulatedModule::new("imu", HardwareType::ImuV2),
        SimulatedModule::new("gps", HardwareType::Gps),
        SimulatedModule::new("hum", HardwareType::Humidity),
        SimulatedModule::new("tmp", HardwareType::Temperature),
        SimulatedModule::new("lux", HardwareType::AmbientLightV2),
        SimulatedModule::new("rng", HardwareType::DistanceIr),
    ])
    .await;

    let report = f.polling.publish_all(&mut f.registry).await;
    assert_eq!(
        report,
        CycleReport {
            published: 7,
            suppressed: 0,
            failed: 0
        }
    );

    let kinds: Vec<_> = f
        .sink
        .records()
        .into_iter()
        .map(|(topic, record)| (topic, record.class()))
        .collect();
    assert_eq!(kinds.len(), 7);
    assert_eq!(kinds[0].0, "/tfsensors/imu1");
    assert_eq!(kinds[1].0, "/tfsensors/magnetic1");
    assert_eq!(kinds[2].0, "/tfsensors/gps1");

    match &f.sink.records_for("/tfsensors/humidity1")[0] {
        SensorRecord::RelativeHumidity(r) => assert_eq!(r.relative_humidity, 455.0 / 1000.0),
        other => panic!("unexpected {:?}", other),
    }
    match &f.sink.records_for("/tfsensors/temperature1")[0] {
        SensorRecord::Temperature(r) => assert_eq!(r.temperature, 21.5),
        other => panic!("unexpected {:?}", other),
    }
    match &f.sink.records_for("/tfsensors/illuminance1")[0] {
        SensorRecord::Illuminance(r) => assert_eq!(r.illuminance, 320.5),
        other => panic!("unexpected {:?}", other),
    }
    match &f.sink.records_for("/tfsensors/range1")[0] {
        SensorRecord::Range(r) => {
            assert_eq!(r.radiation_type, RadiationType::Infrared);
            assert_eq!(r.range, 0.25);
            assert_eq!(r.max_range, 0.4);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn sequence_starts_at_one_and_advances_per_record() {
    let mut f = simple(vec![SimulatedModule::new("hum", HardwareType::Humidity)]).await;

    for _ in 0..3 {
        f.polling.publish_all(&mut f.registry).await;
    }

    let seqs: Vec<_> = f
        .sink
        .records_for("/tfsensors/humidity1")
        .iter()
        .map(|r| r.header().seq)
        .collect();
    assert_eq!(seqs, vec![1, 2, 3]);
    assert_eq!(f.registry.iter().next().unwrap().sequence(), 3);
}

#[tokio::test]
async fn imu_v2_formulas_survive_the_pipeline() {
    let module = SimulatedModule::new("imu", HardwareType::ImuV2).with_sample(RawSample::ImuV2(
        ImuV2Sample {
            quaternion: [0, 0, 0, 16383],
            acceleration: [100, -200, 981],
            angular_velocity: [16, 32, -48],
        },
    ));
    let mut f = simple(vec![module]).await;
    f.polling.publish_all(&mut f.registry).await;

    let SensorRecord::Imu(imu) = &f.sink.records_for("/tfsensors/imu1")[0] else {
        panic!("expected an IMU record");
    };
    assert_eq!(imu.angular_velocity.x, (16.0 / 16.0) * PI / 180.0);
    assert_eq!(imu.angular_velocity.z, (-48.0 / 16.0) * PI / 180.0);
    assert_eq!(imu.linear_acceleration.x, 1.0);
    assert_eq!(imu.linear_acceleration.y, -2.0);
    assert_eq!(imu.orientation.w, -1.0);
    assert_eq!(imu.orientation_covariance, [0.0; 9]);

    let SensorRecord::MagneticField(mag) = &f.sink.records_for("/tfsensors/magnetic1")[0] else {
        panic!("expected a magnetic record");
    };
    assert_eq!(mag.magnetic_field.x, 21.0 / 1e6);
    assert_eq!(mag.magnetic_field_covariance, [0.01; 9]);
}

#[tokio::test]
async fn gps_without_3d_fix_emits_nothing() {
    for fix in [GpsStatus::FIX_NO_FIX, GpsStatus::FIX_2D_FIX, 0, 4] {
        let module = SimulatedModule::new("gps", HardwareType::Gps).with_sample(
            RawSample::GpsStatus(GpsStatus {
                fix,
                ..Default::default()
            }),
        );
        let mut f = simple(vec![module]).await;

        let report = f.polling.publish_all(&mut f.registry).await;
        assert_eq!(report.suppressed, 1, "fix {}", fix);
        assert!(f.sink.is_empty());
        assert_eq!(f.registry.iter().next().unwrap().sequence(), 0);
    }
}

#[tokio::test]
async fn gps_with_3d_fix_publishes_unsigned_coordinates() {
    let mut f = simple(vec![SimulatedModule::new("gps", HardwareType::Gps)]).await;
    f.polling.publish_all(&mut f.registry).await;

    let SensorRecord::NavSatFix(fix) = &f.sink.records_for("/tfsensors/gps1")[0] else {
        panic!("expected a fix");
    };
    assert_eq!(fix.latitude, 52_520_008.0 / 1_000_000.0);
    assert_eq!(fix.longitude, 13_404_954.0 / 1_000_000.0);
    assert_eq!(fix.altitude, 34.5);
    assert_eq!(fix.position_covariance_type, 0);
}

#[tokio::test]
async fn read_failure_skips_only_that_descriptor() {
    let failing = SimulatedModule::new("bad", HardwareType::Temperature).with_errors(
        ErrorConfig::scenario(ErrorScenario::Status {
            operation: SampleKind::Temperature,
            status: BusStatus::Timeout,
        }),
    );
    let mut f = simple(vec![
        SimulatedModule::new("hum", HardwareType::Humidity),
        failing,
        SimulatedModule::new("lux", HardwareType::AmbientLight),
    ])
    .await;

    let report = f.polling.publish_all(&mut f.registry).await;
    assert_eq!(report.published, 2);
    assert_eq!(report.failed, 1);
    assert!(f.sink.records_for("/tfsensors/temperature1").is_empty());
    assert_eq!(f.sink.records_for("/tfsensors/humidity1").len(), 1);
    assert_eq!(f.sink.records_for("/tfsensors/illuminance1").len(), 1);

    // The failing descriptor stays live and is retried next cycle.
    let report = f.polling.publish_all(&mut f.registry).await;
    assert_eq!(report.failed, 1);
    assert_eq!(f.registry.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn stalled_read_times_out() {
    let stalled = SimulatedModule::new("stuck", HardwareType::DistanceUs).with_errors(
        ErrorConfig::scenario(ErrorScenario::Stall {
            operation: SampleKind::Distance,
        }),
    );
    let mut f = discover(
        vec![stalled, SimulatedModule::new("hum", HardwareType::Humidity)],
        HashMap::new(),
        Duration::from_millis(50),
    )
    .await;

    let report = f.polling.publish_all(&mut f.registry).await;
    assert_eq!(report.failed, 1);
    assert_eq!(report.published, 1);
    assert_eq!(f.sink.records_for("/tfsensors/humidity1").len(), 1);
}

#[tokio::test]
async fn sink_failure_is_counted_and_absorbed() {
    let mut f = simple(vec![
        SimulatedModule::new("a", HardwareType::Humidity),
        SimulatedModule::new("b", HardwareType::Humidity),
    ])
    .await;
    f.sink.fail_topic("/tfsensors/humidity1");

    let report = f.polling.publish_all(&mut f.registry).await;
    assert_eq!(report.failed, 1);
    assert_eq!(report.published, 1);
    assert_eq!(f.sink.records_for("/tfsensors/humidity2").len(), 1);
}

#[tokio::test]
async fn range_parameters_override_individual_fields() {
    let mut config = HashMap::new();
    let mut entry = SensorConfig::default();
    entry.params.insert("max", ParamValue::Float(2.5));
    config.insert("us".to_string(), entry);

    let mut f = discover(
        vec![SimulatedModule::new("us", HardwareType::DistanceUs)],
        config,
        Duration::from_millis(100),
    )
    .await;
    f.polling.publish_all(&mut f.registry).await;

    let SensorRecord::Range(range) = &f.sink.records_for("/tfsensors/range1")[0] else {
        panic!("expected a range record");
    };
    assert_eq!(range.radiation_type, RadiationType::Ultrasound);
    assert_eq!(range.max_range, 2.5);
    assert_eq!(range.min_range, 0.02);
    assert_eq!(range.field_of_view, 0.2617);
    assert_eq!(range.range, 1.2);
}

#[tokio::test]
async fn misc_descriptors_are_suppressed() {
    let mut f = simple(vec![
        SimulatedModule::new("btn", HardwareType::DualButton),
        SimulatedModule::new("hum", HardwareType::Humidity),
    ])
    .await;

    let report = f.polling.publish_all(&mut f.registry).await;
    assert_eq!(report.suppressed, 1);
    assert_eq!(report.published, 1);
    assert_eq!(report.visited(), 2);
}
