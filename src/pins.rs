//! Pin assignments and the stock monitored-channel table.
//!
//! Board wiring (ESP32 DevKit):
//! - GPIO4: sensor A, active-high contact with external pull-up
//! - GPIO5: sensor B, active-low contact with external pull-up

use core::time::Duration;

use crate::debounce::{ChannelConfig, EdgeTrigger, PullMode};

/// Sensor A input.
pub const SENSOR_A_PIN: i32 = 4;
/// Sensor B input.
pub const SENSOR_B_PIN: i32 = 5;

/// Delivery topic for sensor A events.
pub const SENSOR_A_TOPIC: &str = "/pinMonitor/gpio4";
/// Delivery topic for sensor B events.
pub const SENSOR_B_TOPIC: &str = "/pinMonitor/gpio5";

/// The channels monitored at boot.
///
/// Sensor A debounces rising edges for 50 ms and reports the settled-high
/// level; sensor B debounces falling edges for 75 ms and reports
/// settled-low.
pub fn monitored_channels() -> [ChannelConfig; 2] {
    [
        ChannelConfig {
            pin: SENSOR_A_PIN,
            trigger: EdgeTrigger::Rising,
            pull: PullMode::Up,
            window: Duration::from_millis(50),
            report_level: true,
            tag: SENSOR_A_TOPIC,
        },
        ChannelConfig {
            pin: SENSOR_B_PIN,
            trigger: EdgeTrigger::Falling,
            pull: PullMode::Up,
            window: Duration::from_millis(75),
            report_level: false,
            tag: SENSOR_B_TOPIC,
        },
    ]
}
