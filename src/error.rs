//! Unified error types for the PinMonitor firmware.
//!
//! Follows embedded best practice: a single `Error` enum that every subsystem
//! can convert into, keeping the top-level startup path's error handling
//! uniform.  All variants are `Copy` so they can be cheaply passed between
//! the ISR-adjacent layers and the startup task without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Channel registration or debounce-engine setup failed.
    Debounce(DebounceError),
    /// A one-shot debounce timer could not be created or armed.
    Timer(TimerError),
    /// Network bring-up failed (STA or soft-AP side).
    Connectivity(ConnectivityError),
    /// Persistent storage (NVS) failed.
    Storage(StorageError),
    /// Stored configuration was corrupt or out of range.
    Config(ConfigError),
    /// MQTT publish failed.
    Publish(PublishError),
    /// Mandatory platform subsystem failed to initialise.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debounce(e) => write!(f, "debounce: {e}"),
            Self::Timer(e) => write!(f, "timer: {e}"),
            Self::Connectivity(e) => write!(f, "connectivity: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Publish(e) => write!(f, "publish: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Debounce engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceError {
    /// The pin already has a registered channel entry.
    AlreadyRegistered(i32),
    /// The fixed-capacity channel table is full.
    Exhausted,
    /// Configuring the pin's input/pull/trigger mode failed.
    PinConfigFailed(i32),
    /// Installing the per-pin interrupt binding failed.
    IsrBindFailed(i32),
    /// The shared interrupt-dispatch service could not be installed.
    IsrServiceFailed,
}

impl fmt::Display for DebounceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRegistered(pin) => write!(f, "GPIO {pin} already registered"),
            Self::Exhausted => write!(f, "channel table full"),
            Self::PinConfigFailed(pin) => write!(f, "GPIO {pin} config failed"),
            Self::IsrBindFailed(pin) => write!(f, "GPIO {pin} ISR bind failed"),
            Self::IsrServiceFailed => write!(f, "ISR service install failed"),
        }
    }
}

impl From<DebounceError> for Error {
    fn from(e: DebounceError) -> Self {
        Self::Debounce(e)
    }
}

// ---------------------------------------------------------------------------
// Timer errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// The platform could not allocate a one-shot timer.
    CreateFailed,
    /// Scheduling a firing failed (resource exhaustion).
    ArmFailed,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateFailed => write!(f, "timer create failed"),
            Self::ArmFailed => write!(f, "timer arm failed"),
        }
    }
}

impl From<TimerError> for Error {
    fn from(e: TimerError) -> Self {
        Self::Timer(e)
    }
}

impl From<TimerError> for DebounceError {
    fn from(_: TimerError) -> Self {
        // Timer exhaustion during register() surfaces as table-level failure.
        Self::Exhausted
    }
}

// ---------------------------------------------------------------------------
// Connectivity errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    /// Writing the station-mode configuration failed.
    StationConfigFailed,
    /// Initiating the connection attempt failed.
    ConnectFailed,
    /// Bringing up the provisioning soft-AP failed.
    ApStartFailed,
    /// The configuration-capture portal could not be started.
    PortalStartFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StationConfigFailed => write!(f, "station config failed"),
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::ApStartFailed => write!(f, "soft-AP start failed"),
            Self::PortalStartFailed => write!(f, "portal start failed"),
        }
    }
}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Connectivity(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The stored blob failed to decode.
    Corrupted,
    /// A field was out of its allowed range.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "stored configuration corrupted"),
            Self::ValidationFailed(what) => write!(f, "validation failed: {what}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Publish errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// The client is not connected to the broker.
    NotConnected,
    /// The broker rejected or timed out the publish.
    SendFailed,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected to broker"),
            Self::SendFailed => write!(f, "publish send failed"),
        }
    }
}

impl From<PublishError> for Error {
    fn from(e: PublishError) -> Self {
        Self::Publish(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
