//! Sensor service lifecycle: connect, discover, poll, shut down.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tf_core::{BusStatus, ConfigProvider, HardwareType, SensorConfig, SensorError};
use tf_driver_mock::{RecordingSink, SimulatedBus, SimulatedModule};
use tf_hardware::{BusAddress, SensorService, ServiceConfig};

fn service(bus: &Arc<SimulatedBus>, sink: &Arc<RecordingSink>) -> SensorService {
    let provider: Arc<dyn ConfigProvider> = Arc::new(HashMap::<String, SensorConfig>::new());
    let config = ServiceConfig {
        address: BusAddress::new("", 80),
        poll_interval: Duration::from_millis(10),
        ..Default::default()
    };
    SensorService::new(config, bus.clone(), sink.clone(), provider)
}

#[test]
fn bus_address_defaults() {
    assert_eq!(BusAddress::new("", 0), BusAddress::new("localhost", 4223));
    assert_eq!(BusAddress::new("daemon", 1000).port, 4223);
    assert_eq!(BusAddress::new("daemon", 1001).port, 1001);
    assert_eq!(BusAddress::new("daemon", 4280).host, "daemon");
}

#[tokio::test]
async fn start_discovers_modules_through_the_event_queue() {
    let bus = Arc::new(SimulatedBus::with_modules([
        SimulatedModule::new("imu", HardwareType::ImuV2),
        SimulatedModule::new("hum", HardwareType::Humidity),
        SimulatedModule::with_type_code("master", HardwareType::MASTER),
    ]));
    let sink = Arc::new(RecordingSink::new());
    let mut service = service(&bus, &sink);

    service.start().await.unwrap();
    assert_eq!(bus.connected_to(), Some(("localhost".to_string(), 4223)));

    // Connected triggers enumeration, whose announcements land in the same
    // drain.
    assert_eq!(service.process_pending_events().await, 4);
    assert_eq!(service.process_pending_events().await, 0);
    assert_eq!(service.registry().len(), 3);

    let report = service.poll_once().await;
    assert_eq!(report.published, 3);
}

#[tokio::test]
async fn connection_failure_is_fatal() {
    let bus = Arc::new(SimulatedBus::new());
    bus.fail_connect(BusStatus::NoConnect);
    let sink = Arc::new(RecordingSink::new());
    let mut service = service(&bus, &sink);

    let err = service.start().await.unwrap_err();
    assert!(matches!(
        err,
        SensorError::Connection {
            status: BusStatus::NoConnect,
            ..
        }
    ));
    assert!(service.run(std::future::ready(())).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn run_polls_until_shutdown_then_tears_down_once() {
    let bus = Arc::new(SimulatedBus::with_modules([
        SimulatedModule::new("imu", HardwareType::ImuV2),
        SimulatedModule::new("btn", HardwareType::DualButton),
    ]));
    let sink = Arc::new(RecordingSink::new());
    let mut service = service(&bus, &sink);
    service.start().await.unwrap();

    service
        .run(tokio::time::sleep(Duration::from_millis(55)))
        .await
        .unwrap();

    assert!(!sink.records_for("/tfsensors/imu1").is_empty());
    assert_eq!(
        sink.records_for("/tfsensors/imu1").len(),
        sink.records_for("/tfsensors/magnetic1").len()
    );

    assert!(service.registry().is_empty());
    assert_eq!(bus.destroy_count("imu"), 1);
    assert_eq!(bus.destroy_count("btn"), 1);
    assert_eq!(bus.disconnect_count(), 1);
    assert!(!bus.handle("imu").unwrap().leds_on());

    service.shutdown().await.unwrap();
    assert_eq!(bus.disconnect_count(), 1);
    assert_eq!(bus.destroy_count("imu"), 1);
}

#[tokio::test]
async fn closed_event_channel_ends_the_loop() {
    let bus = Arc::new(SimulatedBus::with_modules([SimulatedModule::new(
        "hum",
        HardwareType::Humidity,
    )]));
    let sink = Arc::new(RecordingSink::new());
    let mut service = service(&bus, &sink);
    service.start().await.unwrap();
    service.process_pending_events().await;
    assert_eq!(service.registry().len(), 1);
    bus.close_receivers();

    service.run(std::future::pending()).await.unwrap();

    assert_eq!(bus.destroy_count("hum"), 1);
    assert_eq!(bus.disconnect_count(), 1);
}

#[tokio::test]
async fn hot_plugged_module_is_picked_up() {
    let bus = Arc::new(SimulatedBus::new());
    let sink = Arc::new(RecordingSink::new());
    let mut service = service(&bus, &sink);
    service.start().await.unwrap();
    service.process_pending_events().await;

    bus.attach(SimulatedModule::new("lux", HardwareType::AmbientLight));
    service.process_pending_events().await;
    assert_eq!(service.registry().len(), 1);

    bus.reconnect();
    service.process_pending_events().await;
    assert_eq!(service.registry().len(), 1);
    assert_eq!(bus.open_count("lux"), 1);

    service.shutdown().await.unwrap();
}
