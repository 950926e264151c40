//! Unified error types for the AccelBeacon firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! firmware root's error handling uniform. All variants are `Copy` so they
//! can be carried inside [`AppEvent`](crate::app::events::AppEvent)s and
//! diagnostics counters without allocation.

use core::fmt;

use crate::app::ports::DriverError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Fatal errors: bring-up failures and invalid configuration. Runtime
/// faults (sampling, notify) are reported as events instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The accelerometer could not be initialised or read.
    Driver(DriverError),
    /// The BLE stack failed.
    Comms(CommsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driver(e) => write!(f, "driver: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<DriverError> for Error {
    fn from(e: DriverError) -> Self {
        Self::Driver(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// Controller or Bluedroid bring-up failed.
    BleInitFailed,
    /// Advertising payload could not be built or started.
    AdvertisingFailed,
    /// No central is connected on the requested handle.
    NotConnected,
    /// The stack refused the notification (rc from the BLE host).
    NotifyFailed(i32),
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BleInitFailed => write!(f, "BLE init failed"),
            Self::AdvertisingFailed => write!(f, "advertising failed"),
            Self::NotConnected => write!(f, "no central connected"),
            Self::NotifyFailed(rc) => write!(f, "notify failed (rc={rc})"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
