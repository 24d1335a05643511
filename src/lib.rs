//! PinMonitor firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod config;
pub mod conn;
pub mod consumer;
pub mod debounce;
pub mod error;
pub mod events;
pub mod pins;
pub mod ports;

// The adapter implementations are cfg-selected inside each module, so the
// crate compiles on host and target alike.
pub mod adapters;
pub mod task_pin;

// Provides the critical-section implementation for the host-side test
// binaries (on target, esp-idf-hal supplies it).
#[cfg(test)]
use critical_section as _;
