//! Fuzz target: chunked value reads
//!
//! Feeds an arbitrary value, offset and buffer size into `read_blob` and
//! `PublishedValue::read`, and asserts that both return the same clipped
//! suffix of the value and that a zero-length buffer always reports the
//! full length.
//!
//! cargo fuzz run fuzz_blob_read

#![no_main]

use accelbeacon::gatt::{PublishedValue, read_blob};
use accelbeacon::sample::MAX_PAYLOAD_LEN;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let [o_lo, o_hi, cap, value @ ..] = data else {
        return;
    };
    let value = &value[..value.len().min(MAX_PAYLOAD_LEN)];
    let offset = usize::from(u16::from_le_bytes([*o_lo, *o_hi]));
    let mut buf = vec![0u8; usize::from(*cap)];

    let n = read_blob(value, offset, &mut buf);
    if buf.is_empty() {
        assert_eq!(n, value.len());
    } else {
        assert_eq!(n, buf.len().min(value.len().saturating_sub(offset)));
        assert_eq!(&buf[..n], &value[offset.min(value.len())..][..n]);
    }

    let published = PublishedValue::new();
    published.publish(value);
    assert_eq!(published.len(), value.len());
    let mut again = vec![0u8; buf.len()];
    assert_eq!(published.read(offset, &mut again), n);
    assert_eq!(again, buf);
});
