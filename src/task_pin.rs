//! Core-pinned thread spawning for the dual-core ESP32.
//!
//! Wraps `esp_pthread_set_cfg()` so `std::thread::spawn` creates a FreeRTOS
//! task pinned to a chosen core with explicit priority and stack size.  The
//! config applies to the next `pthread_create()` from the calling thread,
//! so the config/spawn pair must not be interleaved with other thread
//! creation on the same thread.  Host builds fall back to a plain spawn.

/// CPU core identifiers for the ESP32 dual-core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU) — WiFi/lwIP protocol stacks.
    Pro = 0,
    /// Core 1 (APP_CPU) — application logic, the event consumer.
    App = 1,
}

/// Spawn a thread pinned to `core`.  `name` must be null-terminated
/// (e.g. `"evt-consumer\0"`).
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> std::thread::JoinHandle<()> {
    use esp_idf_svc::sys;

    unsafe {
        let mut cfg = sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = usize::from(priority);
        cfg.stack_size = stack_kb * 1024;
        cfg.thread_name = name.as_ptr().cast();
        let ret = sys::esp_pthread_set_cfg(&cfg);
        assert!(ret == sys::ESP_OK, "esp_pthread_set_cfg failed: {ret}");
    }

    let display_name = name.trim_end_matches('\0');
    log::info!("spawning '{display_name}' on {core:?} (pri={priority}, stack={stack_kb}KB)");

    std::thread::Builder::new()
        .name(display_name.into())
        .spawn(f)
        .expect("spawn_on_core: thread creation failed")
}

/// Host fallback — ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> std::thread::JoinHandle<()> {
    let display_name = name.trim_end_matches('\0');
    log::info!("spawning '{display_name}' (host, no core pinning, stack={stack_kb}KB)");

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
        .expect("spawn_on_core: thread creation failed")
}
