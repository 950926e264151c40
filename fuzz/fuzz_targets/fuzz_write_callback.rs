//! Fuzz target: `AppService::on_write`
//!
//! Treats the input as a stream of peer writes (attribute selector, length,
//! bytes) and asserts that every write is acknowledged, that the
//! subscription flag tracks the last CCCD value exactly, and that the
//! published payload is never touched by a write.
//!
//! cargo fuzz run fuzz_write_callback

#![no_main]

use accelbeacon::app::events::AppEvent;
use accelbeacon::app::ports::EventSink;
use accelbeacon::app::service::AppService;
use accelbeacon::config::DeviceConfig;
use accelbeacon::events::DeviceEvent;
use accelbeacon::gatt::{
    ATT_SUCCESS, AttributeId, CCCD_HANDLE, ConnHandle, VALUE_HANDLE, WriteRequest, decode_cccd,
};
use libfuzzer_sys::fuzz_target;

struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let mut app = AppService::new(&DeviceConfig::default());
    let mut sink = NullSink;
    let before = app.payload().to_vec();

    let mut rest = data;
    while let [selector, len, tail @ ..] = rest {
        let n = usize::from(*len).min(tail.len());
        let (body, next) = tail.split_at(n);
        rest = next;

        let attribute = match selector % 3 {
            0 => VALUE_HANDLE,
            1 => CCCD_HANDLE,
            _ => AttributeId(u16::from(*selector)),
        };
        let handle = ConnHandle(u16::from(*len));

        // Go through the queued form too: it must truncate, never panic.
        let queued = DeviceEvent::write(handle, attribute, 0, 0, body);
        assert!(matches!(queued, DeviceEvent::Write { .. }));

        let req = WriteRequest {
            handle,
            attribute,
            transaction_mode: 0,
            offset: 0,
            data: body,
        };
        let enabled_before = app.subscription().is_enabled();
        assert_eq!(app.on_write(&req, &mut sink), ATT_SUCCESS);

        if attribute == CCCD_HANDLE {
            assert_eq!(app.subscription().is_enabled(), decode_cccd(body) == 0x0001);
        } else {
            assert_eq!(app.subscription().is_enabled(), enabled_before);
        }
    }

    assert_eq!(app.payload(), before.as_slice());
});
