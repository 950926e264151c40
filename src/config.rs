//! Device configuration parameters
//!
//! All tunable parameters for the AccelBeacon. Nothing is persisted: the
//! defaults below are what ships, and a build can override them by
//! constructing a different `DeviceConfig`.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Storage capacity for the device name. The advertising builder applies the
/// tighter PDU limit when the name is actually advertised.
pub const MAX_NAME_LEN: usize = 24;

/// Core device configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    // --- Timing ---
    /// Heartbeat period (milliseconds)
    pub heartbeat_period_ms: u32,
    /// Emit a diagnostics snapshot every N heartbeats (0 = never)
    pub diagnostics_every: u32,

    // --- Bus ---
    /// Upper bound of a single I2C transfer (milliseconds)
    pub bus_timeout_ms: u32,
    /// I2C clock (Hz)
    pub bus_frequency_hz: u32,

    // --- Sensor ---
    /// Raw counts per output unit
    pub sensitivity_divisor: f32,
    /// OFSX / OFSY / OFSZ trim registers
    pub axis_offsets: [i8; 3],

    // --- Advertising ---
    /// Complete local name
    pub device_name: heapless::String<MAX_NAME_LEN>,
    /// Advertising interval (0.625 ms units)
    pub adv_interval: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let mut device_name = heapless::String::new();
        // "LE Counter" is well under MAX_NAME_LEN.
        let _ = device_name.push_str("LE Counter");
        Self {
            heartbeat_period_ms: 1000, // 1 Hz
            diagnostics_every: 60,     // once a minute

            bus_timeout_ms: 100,
            bus_frequency_hz: 100_000,

            sensitivity_divisor: 32.0,
            axis_offsets: [0, 0, 5],

            device_name,
            adv_interval: 0x0030, // 30 ms
        }
    }
}

impl DeviceConfig {
    /// Reject configurations the firmware cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.heartbeat_period_ms == 0 {
            return Err(Error::Config("heartbeat period must be non-zero"));
        }
        if self.bus_timeout_ms == 0 {
            return Err(Error::Config("bus timeout must be non-zero"));
        }
        // A sample must never be able to eat a whole period.
        if self.bus_timeout_ms >= self.heartbeat_period_ms {
            return Err(Error::Config("bus timeout must be shorter than the heartbeat"));
        }
        if self.sensitivity_divisor.is_nan() || self.sensitivity_divisor <= 0.0 {
            return Err(Error::Config("sensitivity divisor must be positive"));
        }
        if self.device_name.is_empty() {
            return Err(Error::Config("device name must not be empty"));
        }
        Ok(())
    }
}
