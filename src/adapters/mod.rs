//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements     | Connects to                     |
//! |------------|----------------|---------------------------------|
//! | `ble`      | TransportPort  | Bluedroid GATT server           |
//! | `log_sink` | EventSink      | Serial log output               |
//! | `time`     | —              | ESP32 high-resolution timer     |
//!
//! The accelerometer port is implemented directly by
//! [`drivers::adxl345`](crate::drivers::adxl345).

pub mod ble;
pub mod log_sink;
pub mod time;
pub(crate) mod utils;
