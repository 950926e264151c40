//! Integration tests for the heartbeat → sample → send-opportunity → notify
//! pipeline, driven through the AppService ports.

use crate::mock_hw::{MockSensor, MockTransport, RecordingSink, TransportCall};

use accelbeacon::app::events::AppEvent;
use accelbeacon::app::ports::{DriverError, TransportEvent};
use accelbeacon::app::service::AppService;
use accelbeacon::config::DeviceConfig;
use accelbeacon::error::CommsError;
use accelbeacon::gatt::{CCCD_HANDLE, ConnHandle, VALUE_HANDLE, WriteRequest};
use accelbeacon::sample::{RawAxes, Sample};

const H: ConnHandle = ConnHandle(0x0040);
const REFERENCE: &[u8] = br#"{"x":10.000000,"y":-10.000000,"z":5.000000}"#;

fn reference_sensor() -> MockSensor {
    MockSensor::fixed(RawAxes { x: 320, y: -320, z: 160 })
}

fn make_app(sensor: &mut MockSensor) -> (AppService, MockTransport, RecordingSink) {
    let mut app = AppService::new(&DeviceConfig::default());
    let mut sink = RecordingSink::new();
    app.start(sensor, &mut sink);
    (app, MockTransport::new(), sink)
}

fn write_cccd(app: &mut AppService, handle: ConnHandle, value: u16, sink: &mut RecordingSink) {
    let data = value.to_le_bytes();
    let req = WriteRequest {
        handle,
        attribute: CCCD_HANDLE,
        transaction_mode: 0,
        offset: 0,
        data: &data,
    };
    app.on_write(&req, sink);
}

// ── Scenario 1: reference reading ─────────────────────────────

#[test]
fn boot_sample_serialises_reference_reading() {
    let mut sensor = reference_sensor();
    let (app, _tx, sink) = make_app(&mut sensor);

    assert_eq!(
        app.store().latest(),
        Some(Sample { x: 10.0, y: -10.0, z: 5.0 })
    );
    assert_eq!(app.payload(), REFERENCE);
    assert!(matches!(sink.events.last(), Some(AppEvent::Started { sampled: true })));
}

#[test]
fn boot_sample_failure_is_not_fatal() {
    let mut sensor = MockSensor::failing(DriverError::Timeout);
    let (app, _tx, sink) = make_app(&mut sensor);
    assert!(app.payload().is_empty());
    assert!(matches!(sink.events.last(), Some(AppEvent::Started { sampled: false })));
}

// ── Scenario 2: enable → tick → request → send-ready → notify ─

#[test]
fn subscribed_tick_requests_then_notifies_once() {
    let mut sensor = reference_sensor();
    let (mut app, mut tx, mut sink) = make_app(&mut sensor);

    write_cccd(&mut app, H, 0x0001, &mut sink);
    app.on_heartbeat(&mut sensor, &mut tx, &mut sink);
    assert_eq!(tx.calls, vec![TransportCall::Request(H)]);

    app.on_send_ready(H, &mut tx, &mut sink);
    assert_eq!(tx.notifications(), vec![(H, VALUE_HANDLE, REFERENCE.to_vec())]);
    assert_eq!(app.counters().notifications_sent, 1);
}

#[test]
fn notify_carries_the_latest_sample() {
    let mut sensor = reference_sensor().then(Ok(RawAxes { x: 32, y: 32, z: 32 }));
    let (mut app, mut tx, mut sink) = make_app(&mut sensor);

    write_cccd(&mut app, H, 0x0001, &mut sink);
    app.on_heartbeat(&mut sensor, &mut tx, &mut sink);
    app.on_send_ready(H, &mut tx, &mut sink);

    let (_, _, payload) = &tx.notifications()[0];
    assert_eq!(payload.as_slice(), br#"{"x":1.000000,"y":1.000000,"z":1.000000}"#);
}

// ── Scenario 3: disable → tick → nothing ──────────────────────

#[test]
fn disabled_tick_requests_nothing() {
    let mut sensor = reference_sensor();
    let (mut app, mut tx, mut sink) = make_app(&mut sensor);

    write_cccd(&mut app, H, 0x0000, &mut sink);
    app.on_heartbeat(&mut sensor, &mut tx, &mut sink);
    assert!(tx.calls.is_empty());
    // Not subscribed: no sampling either.
    assert_eq!(sensor.reads, 1);
}

#[test]
fn enable_then_disable_stops_requests() {
    let mut sensor = reference_sensor();
    let (mut app, mut tx, mut sink) = make_app(&mut sensor);

    write_cccd(&mut app, H, 0x0001, &mut sink);
    app.on_heartbeat(&mut sensor, &mut tx, &mut sink);
    app.on_send_ready(H, &mut tx, &mut sink);
    write_cccd(&mut app, H, 0x0000, &mut sink);
    app.on_heartbeat(&mut sensor, &mut tx, &mut sink);

    assert_eq!(tx.requests(), vec![H]);
}

// ── Scenario 4: enable → disconnect → tick → nothing ──────────

#[test]
fn disconnect_cancels_subscription() {
    let mut sensor = reference_sensor();
    let (mut app, mut tx, mut sink) = make_app(&mut sensor);

    write_cccd(&mut app, H, 0x0001, &mut sink);
    app.on_transport_event(TransportEvent::Disconnected(H), &mut sink);
    app.on_heartbeat(&mut sensor, &mut tx, &mut sink);

    assert!(tx.calls.is_empty());
    assert!(!app.subscription().is_enabled());
    assert!(sink.events.contains(&AppEvent::SubscriptionCleared { handle: H }));
}

#[test]
fn send_ready_after_disconnect_is_dropped() {
    let mut sensor = reference_sensor();
    let (mut app, mut tx, mut sink) = make_app(&mut sensor);

    write_cccd(&mut app, H, 0x0001, &mut sink);
    app.on_heartbeat(&mut sensor, &mut tx, &mut sink);
    app.on_transport_event(TransportEvent::Disconnected(H), &mut sink);
    app.on_send_ready(H, &mut tx, &mut sink);

    assert!(tx.notifications().is_empty());
    assert!(!app.send_pending());
    assert!(sink.events.contains(&AppEvent::SendReadyDropped(H)));
}

#[test]
fn reconnect_resubscribes_cleanly() {
    let mut sensor = reference_sensor();
    let (mut app, mut tx, mut sink) = make_app(&mut sensor);
    let h2 = ConnHandle(0x0041);

    write_cccd(&mut app, H, 0x0001, &mut sink);
    app.on_heartbeat(&mut sensor, &mut tx, &mut sink);
    // Link drops with a request outstanding; its send-ready never comes.
    app.on_transport_event(TransportEvent::Disconnected(H), &mut sink);

    write_cccd(&mut app, h2, 0x0001, &mut sink);
    app.on_heartbeat(&mut sensor, &mut tx, &mut sink);
    app.on_send_ready(h2, &mut tx, &mut sink);

    assert_eq!(tx.requests(), vec![H, h2]);
    assert_eq!(tx.notifications().len(), 1);
    assert_eq!(tx.notifications()[0].0, h2);
}

// ── Failure paths ─────────────────────────────────────────────

#[test]
fn sampling_failure_keeps_previous_value_and_still_pushes() {
    let mut sensor = reference_sensor().then(Err(DriverError::Nack));
    let (mut app, mut tx, mut sink) = make_app(&mut sensor);

    write_cccd(&mut app, H, 0x0001, &mut sink);
    app.on_heartbeat(&mut sensor, &mut tx, &mut sink);
    app.on_send_ready(H, &mut tx, &mut sink);

    assert_eq!(tx.notifications()[0].2, REFERENCE);
    assert_eq!(app.counters().last_driver_error, Some(DriverError::Nack));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SampleFailed(_))), 1);
}

#[test]
fn notify_failure_is_reported_and_recoverable() {
    let mut sensor = reference_sensor();
    let (mut app, mut tx, mut sink) = make_app(&mut sensor);
    tx.fail_notify = Some(CommsError::NotifyFailed(-1));

    write_cccd(&mut app, H, 0x0001, &mut sink);
    app.on_heartbeat(&mut sensor, &mut tx, &mut sink);
    app.on_send_ready(H, &mut tx, &mut sink);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::NotifyFailed { .. })), 1);

    // Next beat asks again.
    tx.fail_notify = None;
    app.on_heartbeat(&mut sensor, &mut tx, &mut sink);
    assert_eq!(tx.requests(), vec![H, H]);
}

#[test]
fn diagnostics_emitted_on_cadence() {
    let mut sensor = reference_sensor();
    let config = DeviceConfig {
        diagnostics_every: 3,
        ..DeviceConfig::default()
    };
    let mut app = AppService::new(&config);
    let mut tx = MockTransport::new();
    let mut sink = RecordingSink::new();

    for _ in 0..7 {
        app.on_heartbeat(&mut sensor, &mut tx, &mut sink);
    }
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Diagnostics(_))), 2);
    assert_eq!(app.counters().heartbeats, 7);
}
