//! MQTT delivery adapter.
//!
//! Broker settings come from their own NVS namespace with fallbacks from
//! [`SystemConfig`], so a fleet can repoint brokers without reflashing.

use crate::config::SystemConfig;
use crate::error::{Error, PublishError};
use crate::ports::{PublishPort, StoragePort};

/// NVS namespace holding broker overrides.
pub const MQTT_NAMESPACE: &str = "mqtt_store";
const KEY_URI: &str = "uri";
const KEY_USERNAME: &str = "username";
const KEY_PASSWORD: &str = "password";

/// Resolved broker connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    pub uri: heapless::String<64>,
    pub username: heapless::String<32>,
    pub password: heapless::String<64>,
}

impl BrokerConfig {
    /// Resolve broker settings: each field prefers the stored override and
    /// falls back to the compiled-in default from `config`.
    pub fn load(store: &impl StoragePort, config: &SystemConfig) -> Self {
        Self {
            uri: read_string(store, KEY_URI).unwrap_or_else(|| config.mqtt_broker_uri.clone()),
            username: read_string(store, KEY_USERNAME)
                .unwrap_or_else(|| config.mqtt_username.clone()),
            password: read_string(store, KEY_PASSWORD).unwrap_or_default(),
        }
    }
}

/// Read a UTF-8 string value from the broker namespace.
fn read_string<const N: usize>(
    store: &impl StoragePort,
    key: &str,
) -> Option<heapless::String<N>> {
    let mut buf = [0u8; 64];
    let n = store.read(MQTT_NAMESPACE, key, &mut buf).ok()?;
    let s = core::str::from_utf8(&buf[..n]).ok()?;
    heapless::String::try_from(s).ok()
}

// ---------------------------------------------------------------------------
// ESP-IDF implementation
// ---------------------------------------------------------------------------

#[cfg(target_os = "espidf")]
mod imp {
    use esp_idf_svc::mqtt::client::{EspMqttClient, MqttClientConfiguration, QoS};

    use super::{BrokerConfig, Error, PublishError};

    pub struct MqttPublisher {
        client: EspMqttClient<'static>,
    }

    impl MqttPublisher {
        /// Connect to the broker.  The background client task handles
        /// reconnection; publishes while disconnected fail per-call.
        pub fn connect(broker: &BrokerConfig) -> Result<Self, Error> {
            let mut conf = MqttClientConfiguration::default();
            if !broker.username.is_empty() {
                conf.username = Some(broker.username.as_str());
                conf.password = Some(broker.password.as_str());
            }
            let client = EspMqttClient::new_cb(broker.uri.as_str(), &conf, |_event| {})
                .map_err(|_| Error::Init("MQTT client"))?;
            log::info!("MQTT client connected to {}", broker.uri);
            Ok(Self { client })
        }
    }

    impl super::PublishPort for MqttPublisher {
        fn publish(&mut self, tag: &str, payload: &[u8]) -> Result<(), PublishError> {
            self.client
                .enqueue(tag, QoS::AtLeastOnce, false, payload)
                .map(|_| ())
                .map_err(|_| PublishError::SendFailed)
        }
    }
}

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------

#[cfg(not(target_os = "espidf"))]
mod imp {
    use super::{BrokerConfig, Error, PublishError};

    /// Simulated publisher: records every publish.
    pub struct MqttPublisher {
        pub published: Vec<(String, Vec<u8>)>,
    }

    impl MqttPublisher {
        pub fn connect(broker: &BrokerConfig) -> Result<Self, Error> {
            log::info!("sim MQTT client for {}", broker.uri);
            Ok(Self {
                published: Vec::new(),
            })
        }
    }

    impl super::PublishPort for MqttPublisher {
        fn publish(&mut self, tag: &str, payload: &[u8]) -> Result<(), PublishError> {
            self.published.push((tag.to_owned(), payload.to_vec()));
            Ok(())
        }
    }
}

pub use imp::MqttPublisher;
