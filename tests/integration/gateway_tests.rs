//! Attribute access gateway: the read and write callback contracts.

use crate::mock_hw::{MockSensor, MockTransport, RecordingSink};

use accelbeacon::app::events::AppEvent;
use accelbeacon::app::service::AppService;
use accelbeacon::config::DeviceConfig;
use accelbeacon::events::DeviceEvent;
use accelbeacon::gatt::{ATT_SUCCESS, AttributeId, CCCD_HANDLE, ConnHandle, VALUE_HANDLE, WriteRequest};
use accelbeacon::sample::RawAxes;

const H: ConnHandle = ConnHandle(1);
const REFERENCE: &[u8] = br#"{"x":10.000000,"y":-10.000000,"z":5.000000}"#;

fn started_app() -> (AppService, MockSensor, RecordingSink) {
    let mut sensor = MockSensor::fixed(RawAxes { x: 320, y: -320, z: 160 });
    let mut sink = RecordingSink::new();
    let mut app = AppService::new(&DeviceConfig::default());
    app.start(&mut sensor, &mut sink);
    (app, sensor, sink)
}

fn write(attribute: AttributeId, data: &[u8]) -> WriteRequest<'_> {
    WriteRequest {
        handle: H,
        attribute,
        transaction_mode: 0,
        offset: 0,
        data,
    }
}

// ── Reads ─────────────────────────────────────────────────────

#[test]
fn size_probe_and_explicit_length_agree() {
    let (app, _, _) = started_app();
    assert_eq!(app.on_read(VALUE_HANDLE, 0, &mut []), REFERENCE.len());
    assert_eq!(app.value_len(VALUE_HANDLE), REFERENCE.len());
}

#[test]
fn long_read_in_mtu_chunks() {
    let (app, _, _) = started_app();
    let mut out = Vec::new();
    let mut chunk = [0u8; 22];
    loop {
        let n = app.on_read(VALUE_HANDLE, out.len(), &mut chunk);
        if n == 0 {
            break;
        }
        out.extend_from_slice(&chunk[..n]);
    }
    assert_eq!(out, REFERENCE);
}

#[test]
fn reads_are_idempotent_between_ticks() {
    let (app, _, _) = started_app();
    let mut a = [0u8; 64];
    let mut b = [0u8; 64];
    let na = app.on_read(VALUE_HANDLE, 5, &mut a);
    let nb = app.on_read(VALUE_HANDLE, 5, &mut b);
    assert_eq!(&a[..na], &b[..nb]);
    assert_eq!(&a[..na], &REFERENCE[5..]);
}

#[test]
fn read_of_cccd_or_unknown_returns_nothing() {
    let (app, _, _) = started_app();
    let mut buf = [0u8; 8];
    assert_eq!(app.on_read(CCCD_HANDLE, 0, &mut buf), 0);
    assert_eq!(app.on_read(AttributeId(0x0099), 0, &mut buf), 0);
}

// ── Writes ────────────────────────────────────────────────────

#[test]
fn value_write_is_accepted_and_ignored() {
    let (mut app, _, mut sink) = started_app();
    let before = sink.events.len();
    assert_eq!(app.on_write(&write(VALUE_HANDLE, &[0xDE, 0xAD]), &mut sink), ATT_SUCCESS);
    assert!(!app.subscription().is_enabled());
    assert_eq!(app.payload(), REFERENCE);
    assert_eq!(sink.events.len(), before);
}

#[test]
fn unknown_attribute_write_is_a_no_op() {
    let (mut app, _, mut sink) = started_app();
    assert_eq!(app.on_write(&write(AttributeId(0x0077), &[0x01, 0x00]), &mut sink), ATT_SUCCESS);
    assert!(!app.subscription().is_enabled());
}

#[test]
fn short_cccd_payload_is_zero_extended() {
    let (mut app, _, mut sink) = started_app();
    app.on_write(&write(CCCD_HANDLE, &[0x01]), &mut sink);
    assert!(app.subscription().is_enabled());
    app.on_write(&write(CCCD_HANDLE, &[]), &mut sink);
    assert!(!app.subscription().is_enabled());
}

#[test]
fn indications_alone_do_not_subscribe() {
    let (mut app, _, mut sink) = started_app();
    app.on_write(&write(CCCD_HANDLE, &[0x02, 0x00]), &mut sink);
    assert!(!app.subscription().is_enabled());
    assert!(sink.events.contains(&AppEvent::SubscriptionChanged {
        handle: H,
        enabled: false
    }));
}

// ── Queued dispatch ───────────────────────────────────────────

#[test]
fn queued_write_event_reaches_the_gateway() {
    let (mut app, mut sensor, mut sink) = started_app();
    let mut tx = MockTransport::new();

    let ev = DeviceEvent::write(H, CCCD_HANDLE, 0, 0, &[0x01, 0x00]);
    app.handle_event(ev, &mut sensor, &mut tx, &mut sink);
    app.handle_event(DeviceEvent::HeartbeatTick, &mut sensor, &mut tx, &mut sink);
    app.handle_event(DeviceEvent::SendReady(H), &mut sensor, &mut tx, &mut sink);

    assert_eq!(tx.requests(), vec![H]);
    assert_eq!(tx.notifications().len(), 1);
}
