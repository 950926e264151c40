//! AccelBeacon firmware library.
//!
//! Exposes the pure-logic modules for integration testing and for the
//! firmware binary. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod gatt;
pub mod pins;
pub mod sample;
pub mod scheduler;
pub mod subscription;

// Platform-facing modules; each carries host simulation stubs.
pub mod adapters;
pub mod drivers;
