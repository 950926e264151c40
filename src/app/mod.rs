//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the rules of the beacon: when to sample, when a
//! notification may be requested and sent, and how attribute reads and
//! writes are answered. All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
