//! Platform time and reset adapter.

use crate::ports::SystemPort;

// ---------------------------------------------------------------------------
// ESP-IDF implementation
// ---------------------------------------------------------------------------

#[cfg(target_os = "espidf")]
mod imp {
    use std::thread;
    use std::time::Duration;

    pub struct SystemAdapter;

    impl SystemAdapter {
        pub fn new() -> Self {
            Self
        }
    }

    impl Default for SystemAdapter {
        fn default() -> Self {
            Self::new()
        }
    }

    impl super::SystemPort for SystemAdapter {
        fn delay_ms(&mut self, ms: u32) {
            // std sleep yields to FreeRTOS, so other tasks keep running.
            thread::sleep(Duration::from_millis(u64::from(ms)));
        }

        fn restart(&mut self) {
            log::warn!("restarting");
            // SAFETY: plain FFI call; does not return.
            unsafe { esp_idf_svc::sys::esp_restart() };
        }
    }
}

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------

#[cfg(not(target_os = "espidf"))]
mod imp {
    /// Host stand-in: delays are skipped, restarts only logged, so test
    /// runs stay fast.
    pub struct SystemAdapter {
        restarts: u32,
    }

    impl SystemAdapter {
        pub fn new() -> Self {
            Self { restarts: 0 }
        }

        pub fn restarts(&self) -> u32 {
            self.restarts
        }
    }

    impl Default for SystemAdapter {
        fn default() -> Self {
            Self::new()
        }
    }

    impl super::SystemPort for SystemAdapter {
        fn delay_ms(&mut self, _ms: u32) {}

        fn restart(&mut self) {
            log::warn!("restart requested (simulated)");
            self.restarts += 1;
        }
    }
}

pub use imp::SystemAdapter;
