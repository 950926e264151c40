//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them: log to serial or count them.

use crate::diagnostics::Counters;
use crate::error::CommsError;
use crate::gatt::ConnHandle;
use crate::sample::{Sample, SampleError};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service ran its boot-time sample (`sampled` = it succeeded).
    Started { sampled: bool },

    /// A fresh sample was committed to the store.
    Sampled(Sample),

    /// Sampling failed; the previous sample is still published.
    SampleFailed(SampleError),

    /// A central wrote the configuration attribute.
    SubscriptionChanged { handle: ConnHandle, enabled: bool },

    /// A disconnect cleared the subscription.
    SubscriptionCleared { handle: ConnHandle },

    /// A notification was handed to the transport.
    Notified { handle: ConnHandle, len: usize },

    /// The transport rejected a notification.
    NotifyFailed { handle: ConnHandle, error: CommsError },

    /// A send-ready arrived with no outstanding request, or for a peer
    /// that is no longer subscribed.
    SendReadyDropped(ConnHandle),

    /// Periodic counter snapshot.
    Diagnostics(Counters),
}
