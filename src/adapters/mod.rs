//! Platform adapters behind the port traits.
//!
//! Each adapter has a real ESP-IDF implementation guarded by
//! `#[cfg(target_os = "espidf")]` and a small host-side simulation used by
//! the test suites.  The simulation keeps the same public surface so the
//! rest of the firmware compiles unchanged on both targets.

pub mod device_id;
pub mod mqtt;
pub mod nvs;
pub mod portal;
pub mod system;
pub mod wifi;
