//! End-to-end debounce engine behaviour against mock GPIO and timers.
//!
//! The tests drive the engine the way the hardware would: a burst of edge
//! callbacks followed by a single window-expiry callback, then inspect the
//! event queue.

use core::time::Duration;

use pinmonitor::debounce::{
    ChannelConfig, DebounceEngine, EdgeTrigger, PullMode, MAX_DEBOUNCE_CHANNELS,
};
use pinmonitor::error::DebounceError;
use pinmonitor::events::{EventChannel, EVENT_QUEUE_CAP};

use crate::mock_hw::{MockGpio, MockTimerService};

fn channel(pin: i32, report_level: bool) -> ChannelConfig {
    ChannelConfig {
        pin,
        trigger: EdgeTrigger::Rising,
        pull: PullMode::Up,
        window: Duration::from_millis(50),
        report_level,
        tag: "/pinMonitor/test",
    }
}

#[test]
fn edge_burst_collapses_to_one_event() {
    let queue = EventChannel::new();
    let (gpio, gpio_log) = MockGpio::new();
    let (timers, timer_log) = MockTimerService::new();
    let mut engine = DebounceEngine::new(gpio, timers, &queue);
    engine.init().unwrap();
    engine.register(channel(4, true)).unwrap();

    // Contact bounce: 25 edges in quick succession.  Each edge re-arms the
    // one-shot timer, so only one expiry ever fires.
    for _ in 0..25 {
        engine.handle_edge(4);
    }
    let timer = timer_log.timer_for(4);
    assert_eq!(timer.arm_count.get(), 25);
    assert_eq!(timer.last_window_us.get(), 50_000);

    gpio_log.set_level(4, true);
    engine.handle_window_expiry(4);

    let event = queue.try_recv().unwrap();
    assert_eq!(event.pin, 4);
    assert!(event.level);
    assert_eq!(event.tag, "/pinMonitor/test");
    assert!(queue.is_empty());
}

#[test]
fn settling_at_non_report_level_emits_nothing() {
    let queue = EventChannel::new();
    let (gpio, gpio_log) = MockGpio::new();
    let (timers, _) = MockTimerService::new();
    let mut engine = DebounceEngine::new(gpio, timers, &queue);
    engine.register(channel(4, true)).unwrap();

    // A glitch that resolves back to low: window expires at the idle level.
    engine.handle_edge(4);
    gpio_log.set_level(4, false);
    engine.handle_window_expiry(4);

    assert!(queue.is_empty());
    assert_eq!(queue.dropped(), 0);
}

#[test]
fn report_level_low_channel_fires_on_low() {
    let queue = EventChannel::new();
    let (gpio, gpio_log) = MockGpio::new();
    let (timers, _) = MockTimerService::new();
    let mut engine = DebounceEngine::new(gpio, timers, &queue);
    engine.register(channel(5, false)).unwrap();

    engine.handle_edge(5);
    gpio_log.set_level(5, false);
    engine.handle_window_expiry(5);

    let event = queue.try_recv().unwrap();
    assert_eq!(event.pin, 5);
    assert!(!event.level);
}

#[test]
fn duplicate_registration_is_rejected_and_harmless() {
    let queue = EventChannel::new();
    let (gpio, gpio_log) = MockGpio::new();
    let (timers, timer_log) = MockTimerService::new();
    let mut engine = DebounceEngine::new(gpio, timers, &queue);
    engine.register(channel(4, true)).unwrap();

    assert_eq!(
        engine.register(channel(4, false)),
        Err(DebounceError::AlreadyRegistered(4))
    );

    // The original entry is untouched: one timer, never released, and the
    // channel still debounces with its original settings.
    assert_eq!(timer_log.created.borrow().len(), 1);
    assert!(timer_log.released.borrow().is_empty());
    assert_eq!(engine.channel_count(), 1);

    engine.handle_edge(4);
    gpio_log.set_level(4, true);
    engine.handle_window_expiry(4);
    assert_eq!(queue.try_recv().unwrap().pin, 4);
}

#[test]
fn table_capacity_is_enforced() {
    let queue = EventChannel::new();
    let (gpio, _) = MockGpio::new();
    let (timers, timer_log) = MockTimerService::new();
    let mut engine = DebounceEngine::new(gpio, timers, &queue);

    for pin in 0..MAX_DEBOUNCE_CHANNELS as i32 {
        engine.register(channel(pin, true)).unwrap();
    }
    assert_eq!(
        engine.register(channel(99, true)),
        Err(DebounceError::Exhausted)
    );

    // Existing channels survive the failed registration.
    assert_eq!(engine.channel_count(), MAX_DEBOUNCE_CHANNELS);
    assert_eq!(timer_log.created.borrow().len(), MAX_DEBOUNCE_CHANNELS);
    assert!(!engine.is_registered(99));
}

#[test]
fn interrupt_bind_failure_rolls_back_the_entry() {
    let queue = EventChannel::new();
    let (gpio, gpio_log) = MockGpio::new();
    let (timers, timer_log) = MockTimerService::new();
    gpio_log.fail_bind.set(Some(4));
    let mut engine = DebounceEngine::new(gpio, timers, &queue);

    assert_eq!(
        engine.register(channel(4, true)),
        Err(DebounceError::IsrBindFailed(4))
    );

    // The half-registered entry is gone and its timer was released.
    assert_eq!(engine.channel_count(), 0);
    assert_eq!(timer_log.released.borrow().as_slice(), &[0]);

    // A later registration of the same pin works once binding succeeds.
    gpio_log.fail_bind.set(None);
    engine.register(channel(4, true)).unwrap();
    assert!(engine.is_registered(4));
}

#[test]
fn timer_allocation_failure_fails_registration() {
    let queue = EventChannel::new();
    let (gpio, gpio_log) = MockGpio::new();
    let (timers, timer_log) = MockTimerService::new();
    timer_log.fail_create.set(true);
    let mut engine = DebounceEngine::new(gpio, timers, &queue);

    assert_eq!(
        engine.register(channel(4, true)),
        Err(DebounceError::Exhausted)
    );
    assert_eq!(engine.channel_count(), 0);
    // Interrupt was never bound for the failed pin.
    assert!(gpio_log.bound.borrow().is_empty());
}

#[test]
fn unknown_pin_callbacks_are_ignored() {
    let queue = EventChannel::new();
    let (gpio, _) = MockGpio::new();
    let (timers, _) = MockTimerService::new();
    let mut engine = DebounceEngine::new(gpio, timers, &queue);
    engine.register(channel(4, true)).unwrap();

    engine.handle_edge(17);
    engine.handle_window_expiry(17);
    assert!(queue.is_empty());
}

#[test]
fn arm_failure_drops_the_edge_silently() {
    let queue = EventChannel::new();
    let (gpio, _) = MockGpio::new();
    let (timers, timer_log) = MockTimerService::new();
    let mut engine = DebounceEngine::new(gpio, timers, &queue);
    engine.register(channel(4, true)).unwrap();

    timer_log.timer_for(4).fail_arm.set(true);
    engine.handle_edge(4);
    assert!(queue.is_empty());
}

#[test]
fn full_queue_drops_newest_and_counts_exactly() {
    let queue = EventChannel::new();
    let (gpio, gpio_log) = MockGpio::new();
    let (timers, _) = MockTimerService::new();
    let mut engine = DebounceEngine::new(gpio, timers, &queue);
    engine.register(channel(4, true)).unwrap();
    gpio_log.set_level(4, true);

    // Stalled consumer: expiries keep landing until the queue is full.
    for _ in 0..EVENT_QUEUE_CAP {
        engine.handle_edge(4);
        engine.handle_window_expiry(4);
    }
    assert_eq!(queue.len(), EVENT_QUEUE_CAP);
    assert_eq!(queue.dropped(), 0);

    // One more settles: dropped, counted exactly once, producer returns.
    engine.handle_edge(4);
    engine.handle_window_expiry(4);
    assert_eq!(queue.len(), EVENT_QUEUE_CAP);
    assert_eq!(queue.dropped(), 1);

    // Oldest events are preserved (drop-newest policy).
    assert_eq!(queue.try_recv().unwrap().pin, 4);
}

#[test]
fn pins_table_registers_cleanly() {
    let queue = EventChannel::new();
    let (gpio, gpio_log) = MockGpio::new();
    let (timers, timer_log) = MockTimerService::new();
    let mut engine = DebounceEngine::new(gpio, timers, &queue);
    engine.init().unwrap();

    for cfg in pinmonitor::pins::monitored_channels() {
        engine.register(cfg).unwrap();
    }
    assert_eq!(engine.channel_count(), 2);
    assert_eq!(gpio_log.bound.borrow().as_slice(), &[4, 5]);

    // Stock windows: 50 ms and 75 ms.
    assert_eq!(timer_log.timer_for(4).pin, 4);
    engine.handle_edge(4);
    engine.handle_edge(5);
    assert_eq!(timer_log.timer_for(4).last_window_us.get(), 50_000);
    assert_eq!(timer_log.timer_for(5).last_window_us.get(), 75_000);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Whatever the bounce pattern, one settled window yields at most
        /// one event, and exactly one when the settle level matches.
        #[test]
        fn burst_yields_at_most_one_event(
            edges in 1usize..200,
            settle_high in proptest::bool::ANY,
        ) {
            let queue = EventChannel::new();
            let (gpio, gpio_log) = MockGpio::new();
            let (timers, timer_log) = MockTimerService::new();
            let mut engine = DebounceEngine::new(gpio, timers, &queue);
            engine.register(channel(4, true)).unwrap();

            for _ in 0..edges {
                engine.handle_edge(4);
            }
            gpio_log.set_level(4, settle_high);
            engine.handle_window_expiry(4);

            prop_assert_eq!(timer_log.timer_for(4).arm_count.get() as usize, edges);
            prop_assert_eq!(queue.len(), usize::from(settle_high));
            prop_assert_eq!(queue.dropped(), 0);
        }
    }
}
