//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
///
/// Per-heartbeat samples are logged at `info` only every `sample_every`
/// samples; failures are always logged.
pub struct LogEventSink {
    sample_every: u32,
    samples_seen: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::with_sample_stride(1)
    }

    pub fn with_sample_stride(sample_every: u32) -> Self {
        Self {
            sample_every: sample_every.max(1),
            samples_seen: 0,
        }
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { sampled } => {
                info!("START | boot_sample={}", if *sampled { "ok" } else { "failed" });
            }
            AppEvent::Sampled(s) => {
                self.samples_seen = self.samples_seen.wrapping_add(1);
                if self.samples_seen % self.sample_every == 0 {
                    info!("SAMPLE | x={:.3} y={:.3} z={:.3}", s.x, s.y, s.z);
                }
            }
            AppEvent::SampleFailed(e) => {
                warn!("SAMPLE | failed: {}", e);
            }
            AppEvent::SubscriptionChanged { handle, enabled } => {
                info!(
                    "SUBS | conn=0x{:04X} notify={}",
                    handle.0,
                    if *enabled { "on" } else { "off" }
                );
            }
            AppEvent::SubscriptionCleared { handle } => {
                info!("SUBS | conn=0x{:04X} cleared (disconnect)", handle.0);
            }
            AppEvent::Notified { handle, len } => {
                info!("NOTIFY | conn=0x{:04X} len={}", handle.0, len);
            }
            AppEvent::NotifyFailed { handle, error } => {
                warn!("NOTIFY | conn=0x{:04X} failed: {}", handle.0, error);
            }
            AppEvent::SendReadyDropped(handle) => {
                warn!("NOTIFY | conn=0x{:04X} send-ready dropped", handle.0);
            }
            AppEvent::Diagnostics(c) => {
                info!("DIAG | {}", c);
            }
        }
    }
}
