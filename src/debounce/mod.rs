//! GPIO debounce engine.
//!
//! Each monitored pin gets an edge interrupt and a dedicated one-shot timer.
//! Every edge (re)arms the timer for the pin's debounce window, so a noisy
//! burst keeps pushing the firing into the future and collapses into at most
//! one timer expiry after the signal settles.  At expiry the pin is sampled
//! once; an event is emitted only if the settled level matches the level the
//! channel was registered to report.
//!
//! The engine is platform-agnostic: GPIO and timer access go through the
//! [`GpioPort`], [`TimerService`] and [`StableTimer`] traits.  The ESP-IDF
//! bindings live in [`esp`].

use core::time::Duration;

use crate::error::{DebounceError, TimerError};
use crate::events::{EventChannel, PinEvent};

#[cfg(target_os = "espidf")]
pub mod esp;

/// Maximum number of simultaneously monitored pins.
pub const MAX_DEBOUNCE_CHANNELS: usize = 10;

/// Which edge(s) of the raw signal trigger the debounce window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeTrigger {
    Rising,
    Falling,
    Either,
}

/// Internal pull resistor configuration for a monitored pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullMode {
    None,
    Up,
    Down,
}

/// Static description of one monitored channel.
#[derive(Debug, Clone, Copy)]
pub struct ChannelConfig {
    /// GPIO number.
    pub pin: i32,
    /// Edge(s) that start/restart the debounce window.
    pub trigger: EdgeTrigger,
    /// Pull resistor to enable on the pin.
    pub pull: PullMode,
    /// Debounce window: the signal must hold for this long after the last
    /// edge before it is considered settled.
    pub window: Duration,
    /// Settled level that produces an event; the opposite level is
    /// suppressed (e.g. report presses but not releases).
    pub report_level: bool,
    /// Delivery tag attached to every event from this channel.
    pub tag: &'static str,
}

/// A restartable one-shot timer bound to a single channel.
///
/// `arm` is called from interrupt context and must be callable through a
/// shared reference.
pub trait StableTimer {
    /// (Re)start the timer: cancel any pending firing and schedule a new one
    /// `window_us` microseconds from now.  A timer that is not currently
    /// pending is simply started.
    fn arm(&self, window_us: u64) -> Result<(), TimerError>;
}

/// Allocates and releases per-channel timers.
pub trait TimerService {
    type Timer: StableTimer;

    /// Allocate a one-shot timer whose expiry is tagged with `pin`.
    fn create(&mut self, pin: i32) -> Result<Self::Timer, TimerError>;

    /// Release a timer allocated by [`Self::create`].
    fn release(&mut self, timer: Self::Timer);
}

/// GPIO configuration and sampling.
pub trait GpioPort {
    /// Install the shared edge-interrupt dispatch service.  Idempotent:
    /// calling it when the service is already installed succeeds.
    fn install_isr_service(&mut self) -> Result<(), DebounceError>;

    /// Configure `pin` as an input with the given pull and edge trigger.
    fn configure_input(
        &mut self,
        pin: i32,
        pull: PullMode,
        trigger: EdgeTrigger,
    ) -> Result<(), DebounceError>;

    /// Attach the edge interrupt for `pin` and enable it.  After this call
    /// edges on the pin reach [`DebounceEngine::handle_edge`].
    fn bind_interrupt(&mut self, pin: i32) -> Result<(), DebounceError>;

    /// Sample the current level of `pin`.
    fn level(&self, pin: i32) -> bool;
}

/// Opaque handle to a registered channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelHandle {
    pin: i32,
}

impl ChannelHandle {
    /// The GPIO number this handle refers to.
    pub fn pin(&self) -> i32 {
        self.pin
    }
}

struct ChannelEntry<T> {
    config: ChannelConfig,
    timer: T,
    /// Debounce window in microseconds, precomputed at registration.
    window_us: u64,
}

/// Converts a debounce window to whole microseconds, rounding up so a
/// sub-microsecond request still debounces for at least one tick.
fn window_us(window: Duration) -> u64 {
    let us = window.as_nanos().div_ceil(1_000);
    (us.max(1)).min(u128::from(u64::MAX)) as u64
}

/// The debounce engine: a fixed-capacity table of monitored channels plus
/// the shared outbound event queue.
///
/// `register` mutates the table and must only be called during single-task
/// startup, before interrupts for the new pin can fire (the registration
/// sequence itself guarantees this: the interrupt is bound last).  The hot
/// paths `handle_edge` and `handle_window_expiry` only read the table and
/// take `&self`, so they are safe to invoke from ISR and timer-task context
/// once registration is complete.
pub struct DebounceEngine<'q, G, T>
where
    G: GpioPort,
    T: TimerService,
{
    gpio: G,
    timers: T,
    channels: heapless::Vec<ChannelEntry<T::Timer>, MAX_DEBOUNCE_CHANNELS>,
    queue: &'q EventChannel,
}

impl<'q, G, T> DebounceEngine<'q, G, T>
where
    G: GpioPort,
    T: TimerService,
{
    pub fn new(gpio: G, timers: T, queue: &'q EventChannel) -> Self {
        Self {
            gpio,
            timers,
            channels: heapless::Vec::new(),
            queue,
        }
    }

    /// Install the shared interrupt dispatch service.  Call once before the
    /// first [`Self::register`].
    pub fn init(&mut self) -> Result<(), DebounceError> {
        self.gpio.install_isr_service()
    }

    /// Register a monitored channel.
    ///
    /// Resources are acquired in construct-then-bind order: the pin is
    /// configured and the timer allocated before the interrupt is attached,
    /// so no edge can observe a half-built entry.  If attaching the
    /// interrupt fails the entry is removed and its timer released, leaving
    /// the engine exactly as before the call.
    ///
    /// # Errors
    /// `AlreadyRegistered` if the pin has an entry, `Exhausted` if the table
    /// is full or no timer could be allocated, and the GPIO configuration
    /// errors from the port.
    pub fn register(&mut self, config: ChannelConfig) -> Result<ChannelHandle, DebounceError> {
        if self.channels.iter().any(|e| e.config.pin == config.pin) {
            log::warn!("GPIO {} already registered, rejecting duplicate", config.pin);
            return Err(DebounceError::AlreadyRegistered(config.pin));
        }
        if self.channels.is_full() {
            log::error!(
                "channel table full ({MAX_DEBOUNCE_CHANNELS}), cannot register GPIO {}",
                config.pin
            );
            return Err(DebounceError::Exhausted);
        }

        self.gpio
            .configure_input(config.pin, config.pull, config.trigger)?;
        let timer = self.timers.create(config.pin)?;

        let window = window_us(config.window);
        let entry = ChannelEntry {
            window_us: window,
            config,
            timer,
        };
        // Cannot fail: capacity was checked above.
        let _ = self.channels.push(entry);

        // Bind the interrupt last, once the entry is fully in place.
        if let Err(e) = self.gpio.bind_interrupt(config.pin) {
            log::error!("GPIO {} interrupt bind failed, rolling back", config.pin);
            if let Some(entry) = self.channels.pop() {
                self.timers.release(entry.timer);
            }
            return Err(e);
        }

        log::info!(
            "monitoring GPIO {} ({:?} edge, {window} us window) -> {}",
            config.pin,
            config.trigger,
            config.tag
        );
        Ok(ChannelHandle { pin: config.pin })
    }

    /// Edge interrupt entry point.  Restarts the pin's debounce window; a
    /// burst of edges keeps deferring the single pending expiry.  Unknown
    /// pins and arm failures are ignored — this runs in ISR context.
    pub fn handle_edge(&self, pin: i32) {
        if let Some(entry) = self.channels.iter().find(|e| e.config.pin == pin) {
            let _ = entry.timer.arm(entry.window_us);
        }
    }

    /// Debounce-timer expiry entry point.  Samples the settled level and
    /// emits an event if it matches the channel's report level.
    pub fn handle_window_expiry(&self, pin: i32) {
        let Some(entry) = self.channels.iter().find(|e| e.config.pin == pin) else {
            return;
        };
        let level = self.gpio.level(pin);
        if level != entry.config.report_level {
            // Settled at the non-reported level (e.g. bounce resolved back
            // to idle): no event.
            return;
        }
        let event = PinEvent {
            pin,
            level,
            tag: entry.config.tag,
        };
        if !self.queue.try_send(event) {
            log::warn!(
                "event queue full, dropping GPIO {pin} event ({} dropped total)",
                self.queue.dropped()
            );
        }
    }

    /// Number of registered channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Whether `pin` has a registered channel.
    pub fn is_registered(&self, pin: i32) -> bool {
        self.channels.iter().any(|e| e.config.pin == pin)
    }
}
