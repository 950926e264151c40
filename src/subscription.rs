//! Subscription state: the notification gate.
//!
//! One flag plus the handle of the peer that set it. Only CCCD writes and
//! disconnects mutate it. While disabled the bound handle is hidden, so a
//! stale handle from a previous link can never reach the transport.

use crate::gatt::{CCCD_NOTIFY, ConnHandle, decode_cccd};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Subscription {
    notifications_enabled: bool,
    handle: Option<ConnHandle>,
}

impl Subscription {
    pub const fn new() -> Self {
        Self {
            notifications_enabled: false,
            handle: None,
        }
    }

    /// Apply a CCCD write from `handle`. Returns the new enabled state.
    ///
    /// The handle is rebound on every write, enable or not.
    pub fn configure(&mut self, handle: ConnHandle, data: &[u8]) -> bool {
        self.notifications_enabled = decode_cccd(data) == CCCD_NOTIFY;
        self.handle = Some(handle);
        self.notifications_enabled
    }

    /// Link dropped: disable unconditionally and forget the handle.
    pub fn disconnect(&mut self) {
        self.notifications_enabled = false;
        self.handle = None;
    }

    pub fn is_enabled(&self) -> bool {
        self.notifications_enabled
    }

    /// The handle notifications go to, only while enabled.
    pub fn active_handle(&self) -> Option<ConnHandle> {
        if self.notifications_enabled {
            self.handle
        } else {
            None
        }
    }

    /// Whether a notification to `handle` is allowed right now.
    pub fn allows(&self, handle: ConnHandle) -> bool {
        self.active_handle() == Some(handle)
    }
}
