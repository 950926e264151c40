//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the sample store, the subscription state and the
//! single outstanding send request. Every callback the attribute server
//! and the heartbeat deliver ends up here, one at a time. All I/O flows
//! through port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!  AccelerometerPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                        │        AppService         │
//!      TransportPort ◀───│ Store · Subscription · Tx │
//!                        └──────────────────────────┘
//!                          ▲ on_read / on_write / on_send_ready
//!                          │ on_heartbeat / on_transport_event
//! ```

use log::{debug, info, warn};

use crate::adapters::utils::HexDump;
use crate::config::DeviceConfig;
use crate::diagnostics::Counters;
use crate::events::DeviceEvent;
use crate::gatt::{
    ATT_SUCCESS, AttStatus, AttributeId, CCCD_HANDLE, ConnHandle, VALUE_HANDLE, WriteRequest,
    read_blob,
};
use crate::sample::{SampleError, SampleStore};
use crate::subscription::Subscription;

use super::events::AppEvent;
use super::ports::{AccelerometerPort, EventSink, TransportEvent, TransportPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    store: SampleStore,
    subscription: Subscription,
    /// A send opportunity was requested and not yet answered.
    send_pending: bool,
    counters: Counters,
    diagnostics_every: u32,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// The store is empty until [`start`](Self::start) runs the boot sample.
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            store: SampleStore::new(config.sensitivity_divisor),
            subscription: Subscription::new(),
            send_pending: false,
            counters: Counters::new(),
            diagnostics_every: config.diagnostics_every,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Take the boot sample so an early read returns valid data.
    ///
    /// No peer can be subscribed yet, so nothing is requested. A failed
    /// boot sample is not fatal; the store simply stays empty.
    pub fn start(&mut self, sensor: &mut impl AccelerometerPort, sink: &mut impl EventSink) {
        let sampled = self.sample(sensor, sink);
        sink.emit(&AppEvent::Started { sampled });
        info!("AppService started (boot sample {})", if sampled { "ok" } else { "failed" });
    }

    // ── Heartbeat ─────────────────────────────────────────────

    /// One heartbeat: sample and request a send opportunity, but only
    /// while a peer is subscribed.
    pub fn on_heartbeat(
        &mut self,
        sensor: &mut impl AccelerometerPort,
        transport: &mut impl TransportPort,
        sink: &mut impl EventSink,
    ) {
        self.counters.record_heartbeat();

        if let Some(handle) = self.subscription.active_handle() {
            // A failed sample still pushes the previous value.
            self.sample(sensor, sink);

            if self.send_pending {
                debug!("Send opportunity still pending for {:?}, not re-requesting", handle);
            } else {
                self.send_pending = true;
                self.counters.record_send_request();
                transport.request_send_opportunity(handle);
            }
        }

        if self.diagnostics_every != 0 && self.counters.heartbeats % self.diagnostics_every == 0 {
            sink.emit(&AppEvent::Diagnostics(self.counters));
        }
    }

    // ── Attribute access gateway ──────────────────────────────

    /// Serve a peer read. An empty `buf` is a size probe.
    pub fn on_read(&self, attribute: AttributeId, offset: usize, buf: &mut [u8]) -> usize {
        if attribute == VALUE_HANDLE {
            read_blob(self.store.payload(), offset, buf)
        } else {
            0
        }
    }

    /// Total length of an attribute's current value.
    pub fn value_len(&self, attribute: AttributeId) -> usize {
        if attribute == VALUE_HANDLE {
            self.store.len()
        } else {
            0
        }
    }

    /// Handle a peer write. Always succeeds.
    pub fn on_write(&mut self, req: &WriteRequest<'_>, sink: &mut impl EventSink) -> AttStatus {
        match req.attribute {
            CCCD_HANDLE => {
                let enabled = self.subscription.configure(req.handle, req.data);
                info!(
                    "Notifications {} for {:?}",
                    if enabled { "enabled" } else { "disabled" },
                    req.handle
                );
                sink.emit(&AppEvent::SubscriptionChanged {
                    handle: req.handle,
                    enabled,
                });
            }
            VALUE_HANDLE => {
                info!(
                    "Value write from {:?} (mode {}, offset {}): {}",
                    req.handle,
                    req.transaction_mode,
                    req.offset,
                    HexDump(req.data)
                );
            }
            other => {
                debug!("Write to unknown attribute {:?} ignored", other);
            }
        }
        ATT_SUCCESS
    }

    /// The transport is ready for one notification on `handle`.
    pub fn on_send_ready(
        &mut self,
        handle: ConnHandle,
        transport: &mut impl TransportPort,
        sink: &mut impl EventSink,
    ) {
        let was_pending = core::mem::replace(&mut self.send_pending, false);
        if !was_pending || !self.subscription.allows(handle) {
            warn!("Dropping send-ready for {:?} (pending={})", handle, was_pending);
            self.counters.record_send_ready_dropped();
            sink.emit(&AppEvent::SendReadyDropped(handle));
            return;
        }

        let payload = self.store.payload();
        match transport.notify(handle, VALUE_HANDLE, payload) {
            Ok(()) => {
                self.counters.record_notification();
                sink.emit(&AppEvent::Notified {
                    handle,
                    len: payload.len(),
                });
            }
            Err(error) => {
                warn!("Notify to {:?} failed: {}", handle, error);
                sink.emit(&AppEvent::NotifyFailed { handle, error });
            }
        }
    }

    /// Connection lifecycle. Only disconnect matters to the core.
    pub fn on_transport_event(&mut self, event: TransportEvent, sink: &mut impl EventSink) {
        match event {
            TransportEvent::Disconnected(handle) => {
                self.subscription.disconnect();
                // The link is gone; its send-ready may never arrive.
                self.send_pending = false;
                info!("Disconnected {:?}, subscription cleared", handle);
                sink.emit(&AppEvent::SubscriptionCleared { handle });
            }
            TransportEvent::Connected(handle) => debug!("Connected {:?}", handle),
            TransportEvent::Congestion { .. } => {}
        }
    }

    // ── Event dispatch ────────────────────────────────────────

    /// Route one queued [`DeviceEvent`] to its handler.
    pub fn handle_event(
        &mut self,
        event: DeviceEvent,
        sensor: &mut impl AccelerometerPort,
        transport: &mut impl TransportPort,
        sink: &mut impl EventSink,
    ) {
        match event {
            DeviceEvent::HeartbeatTick => self.on_heartbeat(sensor, transport, sink),
            DeviceEvent::Transport(ev) => self.on_transport_event(ev, sink),
            DeviceEvent::SendReady(handle) => self.on_send_ready(handle, transport, sink),
            DeviceEvent::Write {
                handle,
                attribute,
                transaction_mode,
                offset,
                data,
                ..
            } => {
                let req = WriteRequest {
                    handle,
                    attribute,
                    transaction_mode,
                    offset,
                    data: &data,
                };
                self.on_write(&req, sink);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn store(&self) -> &SampleStore {
        &self.store
    }

    pub fn payload(&self) -> &[u8] {
        self.store.payload()
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    pub fn send_pending(&self) -> bool {
        self.send_pending
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    // ── Internal ──────────────────────────────────────────────

    fn sample(&mut self, sensor: &mut impl AccelerometerPort, sink: &mut impl EventSink) -> bool {
        match self.store.sample(sensor) {
            Ok(sample) => {
                self.counters.record_sample(Ok(()));
                sink.emit(&AppEvent::Sampled(sample));
                true
            }
            Err(e) => {
                match e {
                    SampleError::Driver(d) => self.counters.record_sample(Err(d)),
                    SampleError::Overflow => self.counters.record_sample_overflow(),
                }
                warn!("Sample failed: {}", e);
                sink.emit(&AppEvent::SampleFailed(e));
                false
            }
        }
    }
}
