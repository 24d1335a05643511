//! Debounced pin events and the ISR-to-task event channel.
//!
//! Events are produced by the debounce timer callbacks (ESP timer task
//! context) and consumed by the publisher task.  The channel is a bounded
//! FIFO; producers never block.  When the queue is full the event is
//! dropped, counted, and logged — the interrupt path must keep running.
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌───────────────┐
//! │ GPIO ISR     │────▶│ debounce      │────▶│               │
//! │ (arm timer)  │     │ timer cb      │     │ EventChannel  │──▶ consumer
//! └──────────────┘     │ (sample+send) │     │ (bounded)     │    task
//!                      └───────────────┘     └───────────────┘
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

/// Maximum number of pending pin events.
pub const EVENT_QUEUE_CAP: usize = 16;

/// A debounced, stable-level pin event.
///
/// `tag` is the delivery topic supplied at channel registration; the engine
/// and channel only ever hold the reference, never a copy of the string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEvent {
    /// GPIO number that settled.
    pub pin: i32,
    /// Sampled level at debounce-window expiry.
    pub level: bool,
    /// Delivery tag (MQTT topic) for this pin.
    pub tag: &'static str,
}

/// Bounded many-producer/one-consumer event queue.
///
/// `try_send` is safe from ISR and timer-task context (the underlying
/// embassy-sync channel uses a critical section, never a blocking lock).
pub struct EventChannel {
    inner: Channel<CriticalSectionRawMutex, PinEvent, EVENT_QUEUE_CAP>,
    dropped: AtomicU32,
}

impl EventChannel {
    pub const fn new() -> Self {
        Self {
            inner: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Non-blocking enqueue.  Returns `false` (and bumps the drop counter)
    /// if the queue is full; never blocks the producer.
    pub fn try_send(&self, event: PinEvent) -> bool {
        match self.inner.try_send(event) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Blocking receive: parks the calling task until an event is available.
    pub fn recv_blocking(&self) -> PinEvent {
        futures_lite::future::block_on(self.inner.receive())
    }

    /// Non-blocking receive, for draining in tests and shutdown paths.
    pub fn try_recv(&self) -> Option<PinEvent> {
        self.inner.try_receive().ok()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Total number of events dropped because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}
