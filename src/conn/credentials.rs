//! WiFi credential persistence.
//!
//! Credentials live in their own NVS namespace as two plain string blobs,
//! so they survive firmware updates and can be erased independently of the
//! rest of the configuration.

use crate::error::StorageError;
use crate::ports::StoragePort;

/// NVS namespace holding the station credentials.
pub const WIFI_NAMESPACE: &str = "wifi_store";
/// Key for the network name.
pub const KEY_SSID: &str = "ssid";
/// Key for the passphrase.
pub const KEY_PASS: &str = "pass";

/// Longest SSID we accept (802.11 limit).
pub const MAX_SSID_LEN: usize = 31;
/// Longest passphrase we accept (WPA2 limit).
pub const MAX_PASS_LEN: usize = 63;

/// A station credential pair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credential {
    pub ssid: heapless::String<32>,
    pub pass: heapless::String<64>,
}

impl Credential {
    /// Build a credential pair, rejecting over-length fields.
    pub fn new(ssid: &str, pass: &str) -> Option<Self> {
        if ssid.len() > MAX_SSID_LEN || pass.len() > MAX_PASS_LEN {
            return None;
        }
        Some(Self {
            ssid: heapless::String::try_from(ssid).ok()?,
            pass: heapless::String::try_from(pass).ok()?,
        })
    }

    /// A credential is usable if the SSID is non-empty.  An empty
    /// passphrase is allowed (open network).
    pub fn is_valid(&self) -> bool {
        !self.ssid.is_empty()
    }

    /// Load the stored credential pair.
    ///
    /// Returns `None` when either key is absent, not valid UTF-8, or the
    /// SSID is empty — all of which mean "no usable credentials" to the
    /// connectivity state machine.
    pub fn load(store: &impl StoragePort) -> Option<Self> {
        let mut ssid_buf = [0u8; MAX_SSID_LEN + 1];
        let n = store.read(WIFI_NAMESPACE, KEY_SSID, &mut ssid_buf).ok()?;
        let ssid = core::str::from_utf8(&ssid_buf[..n]).ok()?;

        let mut pass_buf = [0u8; MAX_PASS_LEN + 1];
        let n = store.read(WIFI_NAMESPACE, KEY_PASS, &mut pass_buf).ok()?;
        let pass = core::str::from_utf8(&pass_buf[..n]).ok()?;

        let cred = Self::new(ssid, pass)?;
        cred.is_valid().then_some(cred)
    }

    /// Persist both halves of the pair.
    ///
    /// # Errors
    /// Fails on the first key that cannot be written; a partial write is
    /// self-correcting because [`Self::load`] treats a missing half as no
    /// credentials at all.
    pub fn save(&self, store: &mut impl StoragePort) -> Result<(), StorageError> {
        store.write(WIFI_NAMESPACE, KEY_SSID, self.ssid.as_bytes())?;
        store.write(WIFI_NAMESPACE, KEY_PASS, self.pass.as_bytes())
    }

    /// Remove any stored credentials.
    pub fn erase(store: &mut impl StoragePort) -> Result<(), StorageError> {
        store.delete(WIFI_NAMESPACE, KEY_SSID)?;
        store.delete(WIFI_NAMESPACE, KEY_PASS)
    }
}
