//! GATT attribute table identifiers and the blob-read rule.
//!
//! ## Attribute table
//!
//! | Handle | Attribute                         | Access                    |
//! |--------|-----------------------------------|---------------------------|
//! | 0x0001 | Primary service `0xFF10`          | —                         |
//! | 0x0002 | Characteristic declaration        | —                         |
//! | 0x0003 | Accelerometer value (`0xFF11`)    | Read · Write · Notify     |
//! | 0x0004 | Client characteristic config      | Read · Write              |
//!
//! The BLE adapter maps whatever handles the stack assigns at runtime onto
//! these logical ids; the core only ever matches against them.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::sample::MAX_PAYLOAD_LEN;

/// Logical attribute handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeId(pub u16);

/// Opaque identifier of one live peer link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnHandle(pub u16);

/// Characteristic value carrying the serialised sample.
pub const VALUE_HANDLE: AttributeId = AttributeId(0x0003);
/// Client characteristic configuration descriptor of [`VALUE_HANDLE`].
pub const CCCD_HANDLE: AttributeId = AttributeId(0x0004);

/// CCCD value that enables notifications.
pub const CCCD_NOTIFY: u16 = 0x0001;

/// ATT status returned by the write callback.
pub type AttStatus = u8;
/// The only status the write callback ever reports.
pub const ATT_SUCCESS: AttStatus = 0x00;

/// A peer write as delivered by the attribute server.
#[derive(Debug, Clone, Copy)]
pub struct WriteRequest<'a> {
    pub handle: ConnHandle,
    pub attribute: AttributeId,
    pub transaction_mode: u16,
    pub offset: u16,
    pub data: &'a [u8],
}

/// Serve a (possibly long) read of `value` into `buf`.
///
/// - `buf.is_empty()` is a size probe: returns `value.len()` without copying.
/// - otherwise copies `value[offset..]`, clipped to `buf.len()`, and returns
///   the number of bytes copied (0 when `offset >= value.len()`).
pub fn read_blob(value: &[u8], offset: usize, buf: &mut [u8]) -> usize {
    if buf.is_empty() {
        return value.len();
    }
    let Some(rest) = value.get(offset..) else {
        return 0;
    };
    let n = rest.len().min(buf.len());
    buf[..n].copy_from_slice(&rest[..n]);
    n
}

/// Decode a CCCD write: little-endian `u16`, missing bytes read as zero.
pub fn decode_cccd(data: &[u8]) -> u16 {
    let lo = data.first().copied().unwrap_or(0);
    let hi = data.get(1).copied().unwrap_or(0);
    u16::from_le_bytes([lo, hi])
}

// ───────────────────────────────────────────────────────────────
// Published snapshot for reads served outside the firmware loop
// ───────────────────────────────────────────────────────────────

/// Copy-on-write snapshot of the value attribute.
///
/// On ESP-IDF the read callback runs in the Bluetooth task while sampling
/// runs in the firmware loop. The loop republishes after every commit and
/// the callback reads under the same lock, so a reader never observes a
/// half-written payload.
pub struct PublishedValue {
    inner: Mutex<CriticalSectionRawMutex, RefCell<heapless::Vec<u8, MAX_PAYLOAD_LEN>>>,
}

impl PublishedValue {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(heapless::Vec::new())),
        }
    }

    /// Replace the snapshot; bytes beyond the payload bound are dropped.
    pub fn publish(&self, payload: &[u8]) {
        let n = payload.len().min(MAX_PAYLOAD_LEN);
        self.inner.lock(|cell| {
            let mut v = cell.borrow_mut();
            v.clear();
            // Cannot fail: `n` is within capacity.
            let _ = v.extend_from_slice(&payload[..n]);
        });
    }

    /// Blob-read the snapshot (same rule as [`read_blob`]).
    pub fn read(&self, offset: usize, buf: &mut [u8]) -> usize {
        self.inner.lock(|cell| read_blob(&cell.borrow(), offset, buf))
    }

    pub fn len(&self) -> usize {
        self.inner.lock(|cell| cell.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PublishedValue {
    fn default() -> Self {
        Self::new()
    }
}
