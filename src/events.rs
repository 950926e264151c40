//! Inbound device events.
//!
//! Events are produced by:
//! - the heartbeat (via its [`SchedulerDelegate`](crate::app::ports::SchedulerDelegate))
//! - Bluedroid GATTS callbacks (connect, disconnect, write, congestion)
//! - the transport adapter itself (synthesised send-ready)
//!
//! and consumed by the firmware loop, which hands them one at a time to
//! [`AppService::handle_event`](crate::app::service::AppService::handle_event).
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Heartbeat   │────▶│              │     │              │
//! │ BT task     │────▶│ EventQueue   │────▶│ Firmware loop│
//! │ (GATTS cb)  │     │ (embassy ch) │     │ (consumer)   │
//! │ BLE adapter │────▶│              │     │              │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;
use log::warn;

use crate::app::ports::TransportEvent;
use crate::gatt::{AttributeId, ConnHandle};

/// Maximum number of pending events.
pub const EVENT_QUEUE_DEPTH: usize = 16;

/// Bytes of a peer write carried across the queue. The configuration
/// attribute needs 2; longer value writes are truncated (they are only
/// hex-dumped).
pub const MAX_WRITE_CAPTURE: usize = 32;

/// Everything the firmware loop reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Heartbeat period elapsed.
    HeartbeatTick,
    /// Connection lifecycle change.
    Transport(TransportEvent),
    /// The transport can accept one notification on this link.
    SendReady(ConnHandle),
    /// A peer wrote an attribute.
    Write {
        handle: ConnHandle,
        attribute: AttributeId,
        transaction_mode: u16,
        offset: u16,
        data: Vec<u8, MAX_WRITE_CAPTURE>,
        /// Length of the original write before truncation.
        len: usize,
    },
}

impl DeviceEvent {
    /// Capture a write, truncating the payload to [`MAX_WRITE_CAPTURE`].
    pub fn write(
        handle: ConnHandle,
        attribute: AttributeId,
        transaction_mode: u16,
        offset: u16,
        bytes: &[u8],
    ) -> Self {
        let n = bytes.len().min(MAX_WRITE_CAPTURE);
        let mut data = Vec::new();
        // Cannot fail: `n` is within capacity.
        let _ = data.extend_from_slice(&bytes[..n]);
        Self::Write {
            handle,
            attribute,
            transaction_mode,
            offset,
            data,
            len: bytes.len(),
        }
    }
}

// ── Bounded MPSC queue ────────────────────────────────────────

/// Bounded event queue shared between the Bluetooth task and the loop.
pub struct EventQueue {
    inner: Channel<CriticalSectionRawMutex, DeviceEvent, EVENT_QUEUE_DEPTH>,
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            inner: Channel::new(),
        }
    }

    /// Push an event. Safe from any task; never blocks.
    /// Returns `false` if the queue is full (event dropped).
    pub fn push(&self, event: DeviceEvent) -> bool {
        match self.inner.try_send(event) {
            Ok(()) => true,
            Err(embassy_sync::channel::TrySendError::Full(ev)) => {
                warn!("Event queue full, dropping {:?}", ev);
                false
            }
        }
    }

    /// Pop the next event, `None` when empty.
    pub fn pop(&self) -> Option<DeviceEvent> {
        self.inner.try_receive().ok()
    }

    /// Drain all pending events into `handler` in FIFO order.
    ///
    /// Events pushed by `handler` itself are drained in the same call.
    pub fn drain(&self, mut handler: impl FnMut(DeviceEvent)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// The device-wide queue.
pub static EVENTS: EventQueue = EventQueue::new();

/// Push into [`EVENTS`].
pub fn push_event(event: DeviceEvent) -> bool {
    EVENTS.push(event)
}
