//! WiFi radio adapter.
//!
//! Wraps the ESP-IDF WiFi driver behind [`WifiPort`].  Station and soft-AP
//! modes share the one driver instance; the connectivity state machine
//! decides which configuration is active.

use crate::conn::credentials::Credential;
use crate::error::{ConnectivityError, Error};
use crate::ports::WifiPort;

// ---------------------------------------------------------------------------
// ESP-IDF implementation
// ---------------------------------------------------------------------------

#[cfg(target_os = "espidf")]
mod imp {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::wifi::{
        AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi,
    };

    use super::{ConnectivityError, Credential, Error};

    pub struct WifiAdapter {
        wifi: EspWifi<'static>,
    }

    impl WifiAdapter {
        /// Take the modem peripheral and system event loop and build the
        /// driver.  Call once at boot.
        pub fn new() -> Result<Self, Error> {
            let peripherals =
                Peripherals::take().map_err(|_| Error::Init("peripherals already taken"))?;
            let sysloop =
                EspSystemEventLoop::take().map_err(|_| Error::Init("system event loop"))?;
            let wifi = EspWifi::new(peripherals.modem, sysloop, None)
                .map_err(|_| Error::Init("WiFi driver"))?;
            Ok(Self { wifi })
        }
    }

    impl super::WifiPort for WifiAdapter {
        fn configure_station(&mut self, cred: &Credential) -> Result<(), ConnectivityError> {
            let auth_method = if cred.pass.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            };
            let conf = Configuration::Client(ClientConfiguration {
                ssid: cred.ssid.clone(),
                password: cred.pass.clone(),
                auth_method,
                ..Default::default()
            });
            self.wifi
                .set_configuration(&conf)
                .map_err(|_| ConnectivityError::StationConfigFailed)
        }

        fn connect(&mut self) -> Result<(), ConnectivityError> {
            self.wifi
                .start()
                .map_err(|_| ConnectivityError::ConnectFailed)?;
            self.wifi
                .connect()
                .map_err(|_| ConnectivityError::ConnectFailed)
        }

        fn is_associated(&self) -> bool {
            self.wifi.is_connected().unwrap_or(false)
        }

        fn start_access_point(
            &mut self,
            ssid: &str,
            channel: u8,
            max_connections: u8,
        ) -> Result<(), ConnectivityError> {
            let conf = Configuration::AccessPoint(AccessPointConfiguration {
                ssid: heapless::String::try_from(ssid)
                    .map_err(|()| ConnectivityError::ApStartFailed)?,
                channel,
                max_connections: u16::from(max_connections),
                // Provisioning network is open by design of the flow: the
                // device has no secret to share with the user yet.
                auth_method: AuthMethod::None,
                ..Default::default()
            });
            self.wifi
                .set_configuration(&conf)
                .map_err(|_| ConnectivityError::ApStartFailed)?;
            self.wifi
                .start()
                .map_err(|_| ConnectivityError::ApStartFailed)
        }

        fn disconnect(&mut self) {
            let _ = self.wifi.disconnect();
        }
    }
}

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------

#[cfg(not(target_os = "espidf"))]
mod imp {
    use super::{ConnectivityError, Credential, Error};

    /// Simulated radio: associates on the first poll after `connect`.
    pub struct WifiAdapter {
        station_ssid: Option<heapless::String<32>>,
        connecting: bool,
        ap_active: bool,
    }

    impl WifiAdapter {
        pub fn new() -> Result<Self, Error> {
            Ok(Self {
                station_ssid: None,
                connecting: false,
                ap_active: false,
            })
        }

        pub fn ap_active(&self) -> bool {
            self.ap_active
        }
    }

    impl super::WifiPort for WifiAdapter {
        fn configure_station(&mut self, cred: &Credential) -> Result<(), ConnectivityError> {
            self.station_ssid = Some(cred.ssid.clone());
            Ok(())
        }

        fn connect(&mut self) -> Result<(), ConnectivityError> {
            if self.station_ssid.is_none() {
                return Err(ConnectivityError::ConnectFailed);
            }
            self.connecting = true;
            Ok(())
        }

        fn is_associated(&self) -> bool {
            self.connecting
        }

        fn start_access_point(
            &mut self,
            _ssid: &str,
            _channel: u8,
            _max_connections: u8,
        ) -> Result<(), ConnectivityError> {
            self.ap_active = true;
            Ok(())
        }

        fn disconnect(&mut self) {
            self.connecting = false;
        }
    }
}

pub use imp::WifiAdapter;
