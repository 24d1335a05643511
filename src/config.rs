//! System configuration parameters
//!
//! All tunable parameters for the PinMonitor system.
//! Values can be overridden via NVS (non-volatile storage).

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, StorageError};
use crate::ports::StoragePort;

/// NVS namespace for the configuration blob.
pub const CONFIG_NAMESPACE: &str = "pinmon";
/// Key for the postcard-encoded [`SystemConfig`].
const CONFIG_KEY: &str = "syscfg";

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- WiFi station bring-up ---
    /// Number of association polls before the connect attempt is abandoned
    pub wifi_max_retries: u8,
    /// Delay between association polls (milliseconds)
    pub wifi_retry_delay_ms: u32,

    // --- Provisioning soft-AP ---
    /// WiFi channel for the provisioning access point
    pub ap_channel: u8,
    /// Maximum simultaneous stations on the provisioning AP
    pub ap_max_connections: u8,

    // --- Reboot ---
    /// Grace delay before restart, so an in-flight portal response can flush
    /// (milliseconds)
    pub reboot_grace_ms: u32,

    // --- MQTT fallback defaults (overridden by the mqtt_store namespace) ---
    /// Broker URI used when none is stored in NVS
    pub mqtt_broker_uri: heapless::String<64>,
    /// Broker username used when none is stored in NVS
    pub mqtt_username: heapless::String<32>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // STA retry budget: 5 polls, 2 s apart
            wifi_max_retries: 5,
            wifi_retry_delay_ms: 2000,

            // Soft-AP
            ap_channel: 1,
            ap_max_connections: 4,

            // Reboot
            reboot_grace_ms: 1000,

            // MQTT
            mqtt_broker_uri: heapless::String::try_from("mqtt://10.0.0.2:1883")
                .unwrap_or_default(),
            mqtt_username: heapless::String::new(),
        }
    }
}

impl SystemConfig {
    /// Load the stored configuration, falling back to defaults when nothing
    /// is stored or the blob fails to decode or validate.  A bad blob must
    /// never keep the device from booting.
    pub fn load(store: &impl StoragePort) -> Self {
        let mut buf = [0u8; 256];
        match store.read(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf) {
            Ok(n) => match postcard::from_bytes::<Self>(&buf[..n]) {
                Ok(cfg) if cfg.validate().is_ok() => {
                    log::info!("loaded stored configuration");
                    cfg
                }
                Ok(_) | Err(_) => {
                    log::warn!("stored configuration invalid, using defaults");
                    Self::default()
                }
            },
            Err(StorageError::NotFound) => {
                log::info!("no stored configuration, using defaults");
                Self::default()
            }
            Err(e) => {
                log::warn!("configuration read failed ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// Validate and persist the configuration.
    pub fn save(&self, store: &mut impl StoragePort) -> Result<(), Error> {
        self.validate()?;
        let bytes =
            postcard::to_allocvec(self).map_err(|_| Error::Config(ConfigError::Corrupted))?;
        store.write(CONFIG_NAMESPACE, CONFIG_KEY, &bytes)?;
        Ok(())
    }

    /// Range-check every tunable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wifi_max_retries == 0 || self.wifi_max_retries > 20 {
            return Err(ConfigError::ValidationFailed("wifi_max_retries"));
        }
        if !(100..=60_000).contains(&self.wifi_retry_delay_ms) {
            return Err(ConfigError::ValidationFailed("wifi_retry_delay_ms"));
        }
        if !(1..=13).contains(&self.ap_channel) {
            return Err(ConfigError::ValidationFailed("ap_channel"));
        }
        if self.ap_max_connections == 0 || self.ap_max_connections > 10 {
            return Err(ConfigError::ValidationFailed("ap_max_connections"));
        }
        if self.reboot_grace_ms > 10_000 {
            return Err(ConfigError::ValidationFailed("reboot_grace_ms"));
        }
        if self.mqtt_broker_uri.is_empty() {
            return Err(ConfigError::ValidationFailed("mqtt_broker_uri"));
        }
        Ok(())
    }
}
