//! Credential-capture portal.
//!
//! A minimal HTTP server with one page: GET `/` serves the credential form,
//! POST `/` parses the urlencoded body and parks the pair for the main loop
//! to collect via `take_pending_credentials`.  The portal never persists or
//! reboots by itself; the connectivity state machine owns those steps.

use crate::conn::credentials::Credential;
use crate::error::ConnectivityError;
use crate::ports::PortalPort;

/// The provisioning form.
const FORM_HTML: &str = "<!DOCTYPE html><html><head><title>PinMonitor Setup</title></head>\
<body><h1>WiFi Setup</h1>\
<form method='post' action='/'>\
SSID: <input type='text' name='ssid' maxlength='31'><br>\
Password: <input type='password' name='pass' maxlength='63'><br>\
<input type='submit' value='Save'>\
</form></body></html>";

/// Response to a successful submission.
const SAVED_HTML: &str =
    "<html><body><h1>Credentials received</h1><p>The device will reboot and \
connect to your network.</p></body></html>";

/// Parse a `ssid=...&pass=...` urlencoded body into a credential pair.
///
/// Returns `None` when the ssid field is missing or a field is over-length.
/// A missing pass field is treated as an empty passphrase (open network).
fn parse_form(body: &str) -> Option<Credential> {
    let mut ssid = None;
    let mut pass = "";
    for field in body.split('&') {
        match field.split_once('=') {
            Some(("ssid", v)) => ssid = Some(v),
            Some(("pass", v)) => pass = v,
            _ => {}
        }
    }
    Credential::new(ssid?, pass)
}

// ---------------------------------------------------------------------------
// ESP-IDF implementation
// ---------------------------------------------------------------------------

#[cfg(target_os = "espidf")]
mod imp {
    use std::sync::{Arc, Mutex};

    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use esp_idf_svc::http::Method;
    use esp_idf_svc::io::{Read, Write};

    use super::{parse_form, ConnectivityError, Credential, FORM_HTML, SAVED_HTML};

    pub struct HttpPortal {
        server: Option<EspHttpServer<'static>>,
        pending: Arc<Mutex<Option<Credential>>>,
    }

    impl HttpPortal {
        pub fn new() -> Self {
            Self {
                server: None,
                pending: Arc::new(Mutex::new(None)),
            }
        }
    }

    impl Default for HttpPortal {
        fn default() -> Self {
            Self::new()
        }
    }

    impl super::PortalPort for HttpPortal {
        fn start(&mut self) -> Result<(), ConnectivityError> {
            if self.server.is_some() {
                return Ok(());
            }
            let mut server = EspHttpServer::new(&Configuration::default())
                .map_err(|_| ConnectivityError::PortalStartFailed)?;

            server
                .fn_handler("/", Method::Get, |request| {
                    request
                        .into_ok_response()?
                        .write_all(FORM_HTML.as_bytes())?;
                    Ok::<(), esp_idf_svc::io::EspIOError>(())
                })
                .map_err(|_| ConnectivityError::PortalStartFailed)?;

            let pending = Arc::clone(&self.pending);
            server
                .fn_handler("/", Method::Post, move |mut request| {
                    let mut body = [0u8; 160];
                    let n = request.read(&mut body).unwrap_or(0);
                    let cred = core::str::from_utf8(&body[..n])
                        .ok()
                        .and_then(parse_form);
                    match cred {
                        Some(cred) => {
                            log::info!("portal received credentials for '{}'", cred.ssid);
                            if let Ok(mut slot) = pending.lock() {
                                *slot = Some(cred);
                            }
                            request
                                .into_ok_response()?
                                .write_all(SAVED_HTML.as_bytes())?;
                        }
                        None => {
                            log::warn!("portal received malformed submission");
                            request
                                .into_status_response(400)?
                                .write_all(b"missing or invalid ssid")?;
                        }
                    }
                    Ok::<(), esp_idf_svc::io::EspIOError>(())
                })
                .map_err(|_| ConnectivityError::PortalStartFailed)?;

            self.server = Some(server);
            Ok(())
        }

        fn stop(&mut self) {
            self.server = None;
        }

        fn is_active(&self) -> bool {
            self.server.is_some()
        }

        fn take_pending_credentials(&mut self) -> Option<Credential> {
            self.pending.lock().ok().and_then(|mut slot| slot.take())
        }
    }
}

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------

#[cfg(not(target_os = "espidf"))]
mod imp {
    use super::{parse_form, ConnectivityError, Credential};

    /// Simulated portal: submissions are injected directly by tests.
    pub struct HttpPortal {
        active: bool,
        pending: Option<Credential>,
    }

    impl HttpPortal {
        pub fn new() -> Self {
            Self {
                active: false,
                pending: None,
            }
        }

        /// Simulate a browser POSTing the credential form.
        pub fn inject_submission(&mut self, body: &str) -> bool {
            match parse_form(body) {
                Some(cred) => {
                    self.pending = Some(cred);
                    true
                }
                None => false,
            }
        }
    }

    impl Default for HttpPortal {
        fn default() -> Self {
            Self::new()
        }
    }

    impl super::PortalPort for HttpPortal {
        fn start(&mut self) -> Result<(), ConnectivityError> {
            self.active = true;
            Ok(())
        }

        fn stop(&mut self) {
            self.active = false;
        }

        fn is_active(&self) -> bool {
            self.active
        }

        fn take_pending_credentials(&mut self) -> Option<Credential> {
            self.pending.take()
        }
    }
}

pub use imp::HttpPortal;
