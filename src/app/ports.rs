//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (accelerometer, BLE transport, event sinks) implement
//! these traits. The [`AppService`](super::service::AppService) consumes
//! them via generics, so the domain core never touches the I2C bus or the
//! Bluetooth stack directly.

use core::fmt;

use crate::error::CommsError;
use crate::gatt::{AttributeId, ConnHandle};
use crate::sample::RawAxes;

// ───────────────────────────────────────────────────────────────
// Accelerometer port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain raw axis data.
pub trait AccelerometerPort {
    /// Configure the sensor and verify its identity.
    ///
    /// Failure here is fatal: the firmware halts instead of advertising.
    fn init(&mut self) -> Result<(), DriverError>;

    /// Read the three raw two's-complement axis registers.
    ///
    /// May block for at most the configured bus timeout.
    fn read_axes(&mut self) -> Result<RawAxes, DriverError>;
}

// ───────────────────────────────────────────────────────────────
// Transport port (driven adapter: domain → BLE stack)
// ───────────────────────────────────────────────────────────────

/// The push side of the wireless transport.
///
/// The domain never notifies speculatively: it first asks for a send
/// opportunity and pushes only when the transport answers with
/// [`DeviceEvent::SendReady`](crate::events::DeviceEvent::SendReady).
pub trait TransportPort {
    /// Ask the stack to signal when a notification can be queued on `handle`.
    fn request_send_opportunity(&mut self, handle: ConnHandle);

    /// Push `payload` as a notification of `attribute` to `handle`.
    fn notify(
        &mut self,
        handle: ConnHandle,
        attribute: AttributeId,
        payload: &[u8],
    ) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples heartbeat from event system)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the [`Heartbeat`](crate::scheduler::Heartbeat)
/// invokes when it fires.
///
/// The firmware loop implements this by pushing
/// [`DeviceEvent::HeartbeatTick`](crate::events::DeviceEvent::HeartbeatTick) into the
/// event queue; the heartbeat itself knows nothing about queues.
pub trait SchedulerDelegate {
    /// `fire_count` is the number of fires including this one.
    fn on_heartbeat(&mut self, fire_count: u64);
}

// ───────────────────────────────────────────────────────────────
// Transport events (inbound, lifecycle only)
// ───────────────────────────────────────────────────────────────

/// Connection lifecycle reported by the BLE stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    Connected(ConnHandle),
    Disconnected(ConnHandle),
    /// Link congestion changed; only the transport adapter cares.
    Congestion { handle: ConnHandle, congested: bool },
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`AccelerometerPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// The transfer did not complete within the bus timeout.
    Timeout,
    /// The device did not acknowledge its address or a data byte.
    Nack,
    /// Any other bus fault (arbitration loss, bus error, overrun).
    Bus,
    /// DEVID register returned something other than the expected chip id.
    DeviceIdMismatch(u8),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "bus timeout"),
            Self::Nack => write!(f, "bus NACK"),
            Self::Bus => write!(f, "bus error"),
            Self::DeviceIdMismatch(id) => write!(f, "unexpected device id 0x{id:02X}"),
        }
    }
}
