//! PinMonitor Firmware — Main Entry Point
//!
//! Boot sequence:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ NVS init ─▶ connectivity bring-up                            │
//! │              │ Connected                │ Provisioning       │
//! │              ▼                          ▼                    │
//! │   MQTT client + debounce engine    soft-AP + portal          │
//! │   + consumer task (core 1)                                   │
//! │              │                          │                    │
//! │              ▼                          ▼                    │
//! │        supervision loop (reconnect / credential poll)        │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

mod config;
mod conn;
mod consumer;
mod debounce;
mod error;
mod events;
mod pins;
mod ports;

mod adapters;
mod task_pin;

use anyhow::{anyhow, Result};
use log::{info, warn};

use adapters::device_id;
use adapters::mqtt::{BrokerConfig, MqttPublisher};
use adapters::nvs::NvsStore;
use adapters::portal::HttpPortal;
use adapters::system::SystemAdapter;
use adapters::wifi::WifiAdapter;
use config::SystemConfig;
use conn::{ConnState, ConnectivityManager};
use debounce::esp::{install_dispatch, EspGpio, EspTimerService};
use debounce::DebounceEngine;
use events::EventChannel;
use ports::{LogObserver, PortalPort, WifiPort};
use task_pin::Core;

/// The ISR-to-consumer event queue.  Static so the interrupt trampolines
/// and the consumer task can share it without lifetime juggling.
static EVENTS: EventChannel = EventChannel::new();

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("PinMonitor v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Persistent storage (fatal if unavailable: both the config
    //      and the provisioning flow depend on it) ──────────────
    let mut nvs = NvsStore::new().map_err(|e| anyhow!("NVS init failed: {e}"))?;
    let config = SystemConfig::load(&nvs);

    // ── 3. Device identity ────────────────────────────────────
    let mac = device_id::read_mac();
    let ap_ssid = device_id::ap_ssid(&mac);
    info!("device AP ssid: {ap_ssid}");

    // ── 4. Connectivity bring-up ──────────────────────────────
    let mut wifi = WifiAdapter::new().map_err(|e| anyhow!("WiFi init failed: {e}"))?;
    let mut portal = HttpPortal::new();
    let mut sys = SystemAdapter::new();
    let mut observer = LogObserver;
    let mut manager = ConnectivityManager::new(&config, &ap_ssid);
    manager
        .start(&mut wifi, &nvs, &mut portal, &mut sys, &mut observer)
        .map_err(|e| anyhow!("connectivity bring-up failed: {e}"))?;

    // ── 5. With a working uplink: delivery + debounce engine ──
    if manager.state() == ConnState::Connected {
        let broker = BrokerConfig::load(&nvs, &config);
        let mut publisher =
            MqttPublisher::connect(&broker).map_err(|e| anyhow!("MQTT connect failed: {e}"))?;

        let engine = Box::leak(Box::new(DebounceEngine::new(
            EspGpio::new(),
            EspTimerService::new(),
            &EVENTS,
        )));
        // SAFETY: the engine is leaked (lives forever) and dispatch is
        // installed before the first interrupt is bound below.
        unsafe { install_dispatch(std::ptr::from_ref(engine)) };

        engine
            .init()
            .map_err(|e| anyhow!("ISR service init failed: {e}"))?;
        for channel in pins::monitored_channels() {
            engine
                .register(channel)
                .map_err(|e| anyhow!("channel registration failed: {e}"))?;
        }

        // Consumer on the app core, away from the WiFi stack.
        task_pin::spawn_on_core(Core::App, 10, 8, "evt-consumer\0", move || {
            consumer::run(&EVENTS, &mut publisher);
        });
        info!("monitoring {} channels", engine.channel_count());
    }

    // ── 6. Supervision loop ───────────────────────────────────
    loop {
        sys_sleep_ms(500);
        match manager.state() {
            ConnState::Connected => {
                if !wifi.is_associated() {
                    warn!("uplink lost");
                    manager
                        .on_disconnected(&mut wifi, &mut portal, &mut sys, &mut observer)
                        .map_err(|e| anyhow!("reconnect fallback failed: {e}"))?;
                }
            }
            ConnState::Provisioning => {
                if let Some(cred) = portal.take_pending_credentials() {
                    // Saves, waits out the grace period, then restarts.
                    manager.on_credentials_received(&cred, &mut nvs, &mut sys, &mut observer);
                }
            }
            _ => {}
        }
    }
}

fn sys_sleep_ms(ms: u64) {
    std::thread::sleep(std::time::Duration::from_millis(ms));
}
