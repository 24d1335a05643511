//! Port traits: the seams between the connectivity/delivery logic and the
//! platform.
//!
//! The state machine and the publisher loop are written against these traits
//! only.  On target the adapters in [`crate::adapters`] wrap ESP-IDF; on the
//! host the integration tests substitute mocks.

use crate::conn::credentials::Credential;
use crate::conn::ConnState;
use crate::error::{ConnectivityError, PublishError, StorageError};

/// Key/value persistent storage (NVS on target).
///
/// Keys are scoped by a namespace string; values are opaque byte blobs.
pub trait StoragePort {
    /// Read the value for `key` into `buf`, returning the number of bytes.
    ///
    /// # Errors
    /// `StorageError::NotFound` if the key does not exist, `IoError` if the
    /// value does not fit in `buf` or the backend fails.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write (create or overwrite) the value for `key`.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Remove `key`.  Removing an absent key is not an error.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Whether `key` exists in `namespace`.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

/// WiFi radio control, station and soft-AP sides.
pub trait WifiPort {
    /// Apply station-mode configuration for the given credentials.
    fn configure_station(&mut self, cred: &Credential) -> Result<(), ConnectivityError>;

    /// Begin associating with the configured access point.  Returns as soon
    /// as the attempt is started; completion is observed via
    /// [`Self::is_associated`].
    fn connect(&mut self) -> Result<(), ConnectivityError>;

    /// Whether the station is currently associated with an AP.
    fn is_associated(&self) -> bool;

    /// Bring up the provisioning soft-AP with an open (unauthenticated)
    /// network.
    fn start_access_point(
        &mut self,
        ssid: &str,
        channel: u8,
        max_connections: u8,
    ) -> Result<(), ConnectivityError>;

    /// Tear down the station association.
    fn disconnect(&mut self);
}

/// The credential-capture portal served while provisioning.
pub trait PortalPort {
    /// Start serving the portal.
    fn start(&mut self) -> Result<(), ConnectivityError>;

    /// Stop serving the portal.
    fn stop(&mut self);

    /// Whether the portal is currently serving.
    fn is_active(&self) -> bool;

    /// Take a submitted credential pair, if one has arrived since the last
    /// call.  Consuming semantics: a submission is returned at most once.
    fn take_pending_credentials(&mut self) -> Option<Credential>;
}

/// Outbound event delivery (MQTT on target).
pub trait PublishPort {
    /// Publish `payload` under the topic `tag`.
    fn publish(&mut self, tag: &str, payload: &[u8]) -> Result<(), PublishError>;
}

/// Platform time and reset services.
pub trait SystemPort {
    /// Block the calling task for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);

    /// Reboot the device.  On target this does not return.
    fn restart(&mut self);
}

/// Receives connectivity state transitions.
///
/// Called synchronously from within the transition, after the state field is
/// updated but before the new state's entry action runs.  Implementations
/// must not block and must not call back into the manager.
pub trait StateObserver {
    fn on_state_changed(&mut self, state: ConnState);
}

/// Observer that ignores all transitions.
pub struct NullObserver;

impl StateObserver for NullObserver {
    fn on_state_changed(&mut self, _state: ConnState) {}
}

/// Observer that logs every transition at info level.
pub struct LogObserver;

impl StateObserver for LogObserver {
    fn on_state_changed(&mut self, state: ConnState) {
        log::info!("connectivity: -> {state:?}");
    }
}
