//! Heartbeat timer.
//!
//! A one-shot deadline that re-arms itself from the moment it fires, so the
//! period is measured between fires rather than against a fixed external
//! clock. Lateness of the firmware loop therefore shifts every following
//! beat; that drift is accepted.
//!
//! ```text
//!  arm(t0) ──▶ deadline = t0 + P
//!                 │
//!  poll(t1 ≥ deadline) ──▶ fire ──▶ deadline = t1 + P
//!                                     │
//!                           SchedulerDelegate::on_heartbeat()
//!                                     │
//!                                     ▼
//!                         push_event(DeviceEvent::HeartbeatTick)
//! ```

use crate::app::ports::SchedulerDelegate;
use log::{debug, info};

/// Self-rearming periodic timer driven by a monotonic millisecond clock.
///
/// Decoupled from the event system: when it fires, it invokes the
/// [`SchedulerDelegate`] instead of touching a queue directly.
pub struct Heartbeat {
    period_ms: u32,
    deadline_ms: Option<u64>,
    fire_count: u64,
}

impl Heartbeat {
    pub fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            deadline_ms: None,
            fire_count: 0,
        }
    }

    /// Start (or restart) the timer relative to `now_ms`.
    pub fn arm(&mut self, now_ms: u64) {
        let deadline = now_ms + u64::from(self.period_ms);
        self.deadline_ms = Some(deadline);
        info!("Heartbeat: armed, period {}ms", self.period_ms);
    }

    pub fn is_armed(&self) -> bool {
        self.deadline_ms.is_some()
    }

    /// Check the deadline. Returns `true` (and re-arms from `now_ms`) when due.
    ///
    /// A late poll fires once, not once per missed period.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.fire_count += 1;
                self.deadline_ms = Some(now_ms + u64::from(self.period_ms));
                debug!(
                    "Heartbeat: fire #{} ({}ms late)",
                    self.fire_count,
                    now_ms - deadline
                );
                true
            }
            _ => false,
        }
    }

    /// [`poll`](Self::poll), forwarding a fire to `delegate`.
    pub fn poll_with(&mut self, now_ms: u64, delegate: &mut dyn SchedulerDelegate) -> bool {
        let fired = self.poll(now_ms);
        if fired {
            delegate.on_heartbeat(self.fire_count);
        }
        fired
    }

    /// Milliseconds until the next fire (0 if overdue, `None` before `arm`).
    pub fn time_until_due(&self, now_ms: u64) -> Option<u64> {
        self.deadline_ms.map(|d| d.saturating_sub(now_ms))
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    pub fn fire_count(&self) -> u64 {
        self.fire_count
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
