//! Event consumer: drains the pin-event queue and publishes each event.
//!
//! Delivery failures are logged and the loop keeps running — a broker
//! outage must not stall debouncing or back up into the interrupt path
//! (the bounded queue drops on overflow instead).

use core::fmt::Write;

use crate::events::{EventChannel, PinEvent};
use crate::ports::PublishPort;

/// Render the delivery payload for one event.
pub fn render_payload(event: &PinEvent) -> heapless::String<48> {
    let mut s = heapless::String::new();
    // Cannot overflow: "GPIO " + i32 + " stable " + "HIGH" is at most 28 bytes.
    let _ = write!(
        s,
        "GPIO {} stable {}",
        event.pin,
        if event.level { "HIGH" } else { "LOW" }
    );
    s
}

fn deliver(event: PinEvent, publisher: &mut impl PublishPort) {
    let payload = render_payload(&event);
    match publisher.publish(event.tag, payload.as_bytes()) {
        Ok(()) => log::info!("published '{payload}' -> {}", event.tag),
        Err(e) => log::warn!("publish to {} failed: {e}", event.tag),
    }
}

/// Deliver every event currently in the queue without blocking.  Returns
/// the number of events delivered (or attempted).
pub fn drain(queue: &EventChannel, publisher: &mut impl PublishPort) -> usize {
    let mut count = 0;
    while let Some(event) = queue.try_recv() {
        deliver(event, publisher);
        count += 1;
    }
    count
}

/// Consumer task body: block on the queue forever, delivering one event at
/// a time.
pub fn run(queue: &EventChannel, publisher: &mut impl PublishPort) -> ! {
    log::info!("event consumer running");
    loop {
        let event = queue.recv_blocking();
        deliver(event, publisher);
    }
}
