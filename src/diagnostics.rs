//! Runtime counters.
//!
//! Plain counters updated by [`AppService`](crate::app::service::AppService)
//! and snapshotted into
//! [`AppEvent::Diagnostics`](crate::app::events::AppEvent::Diagnostics)
//! every `diagnostics_every` heartbeats. Reset only by reboot.

use core::fmt;

use crate::app::ports::DriverError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub heartbeats: u32,
    pub samples_ok: u32,
    pub sample_failures: u32,
    pub last_driver_error: Option<DriverError>,
    pub send_requests: u32,
    pub notifications_sent: u32,
    pub send_ready_dropped: u32,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_heartbeat(&mut self) {
        self.heartbeats = self.heartbeats.wrapping_add(1);
    }

    pub fn record_sample(&mut self, result: Result<(), DriverError>) {
        match result {
            Ok(()) => self.samples_ok = self.samples_ok.wrapping_add(1),
            Err(e) => {
                self.sample_failures = self.sample_failures.wrapping_add(1);
                self.last_driver_error = Some(e);
            }
        }
    }

    /// Formatting failures count as sample failures without a driver error.
    pub fn record_sample_overflow(&mut self) {
        self.sample_failures = self.sample_failures.wrapping_add(1);
    }

    pub fn record_send_request(&mut self) {
        self.send_requests = self.send_requests.wrapping_add(1);
    }

    pub fn record_notification(&mut self) {
        self.notifications_sent = self.notifications_sent.wrapping_add(1);
    }

    pub fn record_send_ready_dropped(&mut self) {
        self.send_ready_dropped = self.send_ready_dropped.wrapping_add(1);
    }
}

impl fmt::Display for Counters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "beats={} ok={} fail={} req={} sent={} dropped={}",
            self.heartbeats,
            self.samples_ok,
            self.sample_failures,
            self.send_requests,
            self.notifications_sent,
            self.send_ready_dropped
        )?;
        if let Some(e) = self.last_driver_error {
            write!(f, " last_err=\"{e}\"")?;
        }
        Ok(())
    }
}
