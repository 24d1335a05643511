//! Connectivity state machine.
//!
//! Drives WiFi bring-up from boot to either a working station association
//! or the provisioning fallback:
//!
//! ```text
//!            stored creds            no/invalid creds
//! Init ──────────────────▶ Connecting ─────────────────────┐
//!                           │      │                       │
//!                 associated│      │budget exhausted       │
//!                           ▼      ▼                       ▼
//!                      Connected  Failed ────────────▶ Provisioning
//!                                                          │ portal
//!                                                          ▼ submit
//!                                              SavingCredentials
//!                                                          │
//!                                                          ▼
//!                                                      Rebooting
//! ```
//!
//! The manager owns only the state and tuning values; all platform access
//! goes through the port traits, passed in per call.  Every transition goes
//! through one choke point that updates the state, logs it, and notifies
//! the observer before the new state's entry action runs.

pub mod credentials;

use crate::config::SystemConfig;
use crate::error::Error;
use crate::ports::{PortalPort, StateObserver, StoragePort, SystemPort, WifiPort};

use credentials::Credential;

/// Connectivity lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Boot-time state before credentials have been examined.
    Init,
    /// Station association in progress.
    Connecting,
    /// Associated with the configured AP.
    Connected,
    /// The retry budget was exhausted without association.
    Failed,
    /// Soft-AP and portal are up, waiting for a credential submission.
    Provisioning,
    /// A submitted credential pair is being persisted.
    SavingCredentials,
    /// Restart pending after a successful (or attempted) save.
    Rebooting,
}

/// The connectivity state machine.
pub struct ConnectivityManager {
    state: ConnState,
    credential: Option<Credential>,
    max_retries: u8,
    retry_delay_ms: u32,
    reboot_grace_ms: u32,
    ap_ssid: heapless::String<32>,
    ap_channel: u8,
    ap_max_connections: u8,
}

impl ConnectivityManager {
    pub fn new(config: &SystemConfig, ap_ssid: &str) -> Self {
        Self {
            state: ConnState::Init,
            credential: None,
            max_retries: config.wifi_max_retries,
            retry_delay_ms: config.wifi_retry_delay_ms,
            reboot_grace_ms: config.reboot_grace_ms,
            ap_ssid: heapless::String::try_from(ap_ssid).unwrap_or_default(),
            ap_channel: config.ap_channel,
            ap_max_connections: config.ap_max_connections,
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnState {
        self.state
    }

    /// The single transition choke point.  The observer runs synchronously
    /// here, after the state is updated and before the caller performs the
    /// new state's entry action.
    fn set_state(&mut self, next: ConnState, observer: &mut impl StateObserver) {
        self.state = next;
        log::debug!("connectivity state: {next:?}");
        observer.on_state_changed(next);
    }

    /// Run the bring-up sequence from boot.
    ///
    /// With stored credentials this attempts station association, falling
    /// back to provisioning when the retry budget is exhausted.  Without
    /// usable credentials it goes straight to provisioning.
    ///
    /// # Errors
    /// Only provisioning bring-up failures (soft-AP or portal start) are
    /// returned; a failed station association is handled by the fallback
    /// and is not an error.
    pub fn start(
        &mut self,
        wifi: &mut impl WifiPort,
        store: &impl StoragePort,
        portal: &mut impl PortalPort,
        sys: &mut impl SystemPort,
        observer: &mut impl StateObserver,
    ) -> Result<(), Error> {
        self.set_state(ConnState::Init, observer);

        match Credential::load(store) {
            Some(cred) => {
                log::info!("stored credentials found for '{}'", cred.ssid);
                self.credential = Some(cred);
                if self.run_connecting(wifi, sys, observer) {
                    Ok(())
                } else {
                    self.enter_provisioning(wifi, portal, observer)
                }
            }
            None => {
                log::warn!("no usable WiFi credentials, starting provisioning");
                self.enter_provisioning(wifi, portal, observer)
            }
        }
    }

    /// Attempt station association with the cached credentials.  Returns
    /// `true` on `Connected`, `false` after moving to `Failed`.
    fn run_connecting(
        &mut self,
        wifi: &mut impl WifiPort,
        sys: &mut impl SystemPort,
        observer: &mut impl StateObserver,
    ) -> bool {
        let Some(cred) = self.credential.clone() else {
            return false;
        };
        self.set_state(ConnState::Connecting, observer);

        if let Err(e) = wifi.configure_station(&cred) {
            log::error!("station configuration failed: {e}");
            self.set_state(ConnState::Failed, observer);
            return false;
        }
        if let Err(e) = wifi.connect() {
            log::error!("connect request failed: {e}");
            self.set_state(ConnState::Failed, observer);
            return false;
        }

        for attempt in 1..=u32::from(self.max_retries) {
            sys.delay_ms(self.retry_delay_ms);
            if wifi.is_associated() {
                log::info!("associated with '{}' (attempt {attempt})", cred.ssid);
                self.set_state(ConnState::Connected, observer);
                return true;
            }
            log::info!(
                "waiting for association with '{}' ({attempt}/{})",
                cred.ssid,
                self.max_retries
            );
        }

        log::warn!(
            "association with '{}' failed after {} attempts",
            cred.ssid,
            self.max_retries
        );
        self.set_state(ConnState::Failed, observer);
        false
    }

    /// Bring up the open soft-AP and the credential-capture portal.
    fn enter_provisioning(
        &mut self,
        wifi: &mut impl WifiPort,
        portal: &mut impl PortalPort,
        observer: &mut impl StateObserver,
    ) -> Result<(), Error> {
        self.set_state(ConnState::Provisioning, observer);

        wifi.start_access_point(&self.ap_ssid, self.ap_channel, self.ap_max_connections)?;
        portal.start()?;
        log::info!("provisioning portal active on AP '{}'", self.ap_ssid);
        Ok(())
    }

    /// Handle a credential submission from the portal.
    ///
    /// Persists the pair (a failed save is logged, not fatal: rebooting
    /// into provisioning again is the recovery path either way), waits out
    /// the grace delay so the portal response can flush, then restarts.
    pub fn on_credentials_received(
        &mut self,
        cred: &Credential,
        store: &mut impl StoragePort,
        sys: &mut impl SystemPort,
        observer: &mut impl StateObserver,
    ) {
        self.set_state(ConnState::SavingCredentials, observer);
        match cred.save(store) {
            Ok(()) => log::info!("credentials saved for '{}'", cred.ssid),
            Err(e) => log::error!("credential save failed: {e}"),
        }

        self.set_state(ConnState::Rebooting, observer);
        sys.delay_ms(self.reboot_grace_ms);
        sys.restart();
    }

    /// Handle loss of an established association: re-run the connect
    /// sequence with the cached credentials, falling back to provisioning
    /// if it fails again.
    ///
    /// # Errors
    /// Same as [`Self::start`]: only provisioning bring-up failures.
    pub fn on_disconnected(
        &mut self,
        wifi: &mut impl WifiPort,
        portal: &mut impl PortalPort,
        sys: &mut impl SystemPort,
        observer: &mut impl StateObserver,
    ) -> Result<(), Error> {
        if self.state != ConnState::Connected {
            return Ok(());
        }
        log::warn!("station association lost, reconnecting");
        if self.run_connecting(wifi, sys, observer) {
            Ok(())
        } else {
            self.enter_provisioning(wifi, portal, observer)
        }
    }
}
