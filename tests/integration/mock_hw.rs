//! Mock adapters for integration tests.
//!
//! Each mock records every call so tests can assert on the full history
//! without touching the I2C bus or the Bluetooth stack.

use accelbeacon::app::events::AppEvent;
use accelbeacon::app::ports::{AccelerometerPort, DriverError, EventSink, TransportPort};
use accelbeacon::error::CommsError;
use accelbeacon::gatt::{AttributeId, ConnHandle};
use accelbeacon::sample::RawAxes;
use std::collections::VecDeque;

// ── MockSensor ────────────────────────────────────────────────

/// Returns queued readings in order, then repeats the last one.
pub struct MockSensor {
    script: VecDeque<Result<RawAxes, DriverError>>,
    last: Result<RawAxes, DriverError>,
    pub reads: usize,
}

#[allow(dead_code)]
impl MockSensor {
    pub fn fixed(raw: RawAxes) -> Self {
        Self {
            script: VecDeque::new(),
            last: Ok(raw),
            reads: 0,
        }
    }

    pub fn failing(e: DriverError) -> Self {
        Self {
            script: VecDeque::new(),
            last: Err(e),
            reads: 0,
        }
    }

    pub fn then(mut self, next: Result<RawAxes, DriverError>) -> Self {
        self.script.push_back(next);
        self
    }
}

impl AccelerometerPort for MockSensor {
    fn init(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    fn read_axes(&mut self) -> Result<RawAxes, DriverError> {
        self.reads += 1;
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        self.last
    }
}

// ── MockTransport ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Request(ConnHandle),
    Notify {
        handle: ConnHandle,
        attribute: AttributeId,
        payload: Vec<u8>,
    },
}

pub struct MockTransport {
    pub calls: Vec<TransportCall>,
    pub fail_notify: Option<CommsError>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            fail_notify: None,
        }
    }

    pub fn requests(&self) -> Vec<ConnHandle> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                TransportCall::Request(h) => Some(*h),
                TransportCall::Notify { .. } => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<(ConnHandle, AttributeId, Vec<u8>)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                TransportCall::Notify {
                    handle,
                    attribute,
                    payload,
                } => Some((*handle, *attribute, payload.clone())),
                TransportCall::Request(_) => None,
            })
            .collect()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportPort for MockTransport {
    fn request_send_opportunity(&mut self, handle: ConnHandle) {
        self.calls.push(TransportCall::Request(handle));
    }

    fn notify(
        &mut self,
        handle: ConnHandle,
        attribute: AttributeId,
        payload: &[u8],
    ) -> Result<(), CommsError> {
        self.calls.push(TransportCall::Notify {
            handle,
            attribute,
            payload: payload.to_vec(),
        });
        match self.fail_notify {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
