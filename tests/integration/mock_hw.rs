//! Mock hardware adapters for the host-side integration tests.
//!
//! Single-threaded by design: interrupt and timer callbacks are driven
//! explicitly by the tests via `handle_edge` / `handle_window_expiry`, so
//! `Rc<RefCell<..>>` shared state is sufficient for observing what the
//! engine did with the mocks it owns.

#![allow(dead_code)] // not every test file uses every mock

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use pinmonitor::conn::credentials::Credential;
use pinmonitor::conn::ConnState;
use pinmonitor::debounce::{EdgeTrigger, GpioPort, PullMode, StableTimer, TimerService};
use pinmonitor::error::{ConnectivityError, DebounceError, PublishError, StorageError, TimerError};
use pinmonitor::ports::{PortalPort, PublishPort, StateObserver, StoragePort, SystemPort, WifiPort};

// ---------------------------------------------------------------------------
// GPIO
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct GpioShared {
    pub levels: RefCell<HashMap<i32, bool>>,
    pub configured: RefCell<Vec<(i32, PullMode, EdgeTrigger)>>,
    pub bound: RefCell<Vec<i32>>,
    pub isr_installs: Cell<u32>,
    /// Pin whose interrupt bind should fail, for rollback tests.
    pub fail_bind: Cell<Option<i32>>,
}

#[derive(Default)]
pub struct MockGpio {
    pub shared: Rc<GpioShared>,
}

impl MockGpio {
    pub fn new() -> (Self, Rc<GpioShared>) {
        let shared = Rc::new(GpioShared::default());
        (
            Self {
                shared: Rc::clone(&shared),
            },
            shared,
        )
    }
}

impl GpioShared {
    pub fn set_level(&self, pin: i32, level: bool) {
        self.levels.borrow_mut().insert(pin, level);
    }
}

impl GpioPort for MockGpio {
    fn install_isr_service(&mut self) -> Result<(), DebounceError> {
        self.shared.isr_installs.set(self.shared.isr_installs.get() + 1);
        Ok(())
    }

    fn configure_input(
        &mut self,
        pin: i32,
        pull: PullMode,
        trigger: EdgeTrigger,
    ) -> Result<(), DebounceError> {
        self.shared.configured.borrow_mut().push((pin, pull, trigger));
        Ok(())
    }

    fn bind_interrupt(&mut self, pin: i32) -> Result<(), DebounceError> {
        if self.shared.fail_bind.get() == Some(pin) {
            return Err(DebounceError::IsrBindFailed(pin));
        }
        self.shared.bound.borrow_mut().push(pin);
        Ok(())
    }

    fn level(&self, pin: i32) -> bool {
        self.shared.levels.borrow().get(&pin).copied().unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Timers
// ---------------------------------------------------------------------------

pub struct TimerState {
    pub id: usize,
    pub pin: i32,
    pub arm_count: Cell<u32>,
    pub last_window_us: Cell<u64>,
    pub fail_arm: Cell<bool>,
}

#[derive(Default)]
pub struct TimerLog {
    pub created: RefCell<Vec<Rc<TimerState>>>,
    pub released: RefCell<Vec<usize>>,
    pub fail_create: Cell<bool>,
}

impl TimerLog {
    /// State of the timer created for `pin`.
    pub fn timer_for(&self, pin: i32) -> Rc<TimerState> {
        self.created
            .borrow()
            .iter()
            .find(|t| t.pin == pin)
            .cloned()
            .expect("no timer created for pin")
    }
}

pub struct MockTimer {
    state: Rc<TimerState>,
}

impl StableTimer for MockTimer {
    fn arm(&self, window_us: u64) -> Result<(), TimerError> {
        if self.state.fail_arm.get() {
            return Err(TimerError::ArmFailed);
        }
        self.state.arm_count.set(self.state.arm_count.get() + 1);
        self.state.last_window_us.set(window_us);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockTimerService {
    pub log: Rc<TimerLog>,
}

impl MockTimerService {
    pub fn new() -> (Self, Rc<TimerLog>) {
        let log = Rc::new(TimerLog::default());
        (Self { log: Rc::clone(&log) }, log)
    }
}

impl TimerService for MockTimerService {
    type Timer = MockTimer;

    fn create(&mut self, pin: i32) -> Result<Self::Timer, TimerError> {
        if self.log.fail_create.get() {
            return Err(TimerError::CreateFailed);
        }
        let state = Rc::new(TimerState {
            id: self.log.created.borrow().len(),
            pin,
            arm_count: Cell::new(0),
            last_window_us: Cell::new(0),
            fail_arm: Cell::new(false),
        });
        self.log.created.borrow_mut().push(Rc::clone(&state));
        Ok(MockTimer { state })
    }

    fn release(&mut self, timer: Self::Timer) {
        self.log.released.borrow_mut().push(timer.state.id);
    }
}

// ---------------------------------------------------------------------------
// WiFi
// ---------------------------------------------------------------------------

/// Scripted radio: `is_associated` returns true from the Nth poll onwards
/// (never, when `associate_after` is `None`).
#[derive(Default)]
pub struct MockWifi {
    pub associate_after: Option<u32>,
    pub polls: Cell<u32>,
    pub station_ssid: Option<String>,
    pub connect_calls: u32,
    pub fail_station_config: bool,
    pub fail_ap_start: bool,
    pub ap: Option<(String, u8, u8)>,
    pub disconnects: u32,
}

impl MockWifi {
    pub fn never_associates() -> Self {
        Self::default()
    }

    pub fn associates_on_poll(n: u32) -> Self {
        Self {
            associate_after: Some(n),
            ..Self::default()
        }
    }
}

impl WifiPort for MockWifi {
    fn configure_station(&mut self, cred: &Credential) -> Result<(), ConnectivityError> {
        if self.fail_station_config {
            return Err(ConnectivityError::StationConfigFailed);
        }
        self.station_ssid = Some(cred.ssid.to_string());
        Ok(())
    }

    fn connect(&mut self) -> Result<(), ConnectivityError> {
        self.connect_calls += 1;
        self.polls.set(0);
        Ok(())
    }

    fn is_associated(&self) -> bool {
        self.polls.set(self.polls.get() + 1);
        match self.associate_after {
            Some(n) => self.polls.get() >= n,
            None => false,
        }
    }

    fn start_access_point(
        &mut self,
        ssid: &str,
        channel: u8,
        max_connections: u8,
    ) -> Result<(), ConnectivityError> {
        if self.fail_ap_start {
            return Err(ConnectivityError::ApStartFailed);
        }
        self.ap = Some((ssid.to_owned(), channel, max_connections));
        Ok(())
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
    }
}

// ---------------------------------------------------------------------------
// Portal
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockPortal {
    pub active: bool,
    pub starts: u32,
    pub stops: u32,
    pub pending: Option<Credential>,
    pub fail_start: bool,
}

impl PortalPort for MockPortal {
    fn start(&mut self) -> Result<(), ConnectivityError> {
        if self.fail_start {
            return Err(ConnectivityError::PortalStartFailed);
        }
        self.active = true;
        self.starts += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.active = false;
        self.stops += 1;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn take_pending_credentials(&mut self) -> Option<Credential> {
        self.pending.take()
    }
}

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Storage whose writes always fail, for save-failure paths.
pub struct FailingStore;

impl StoragePort for FailingStore {
    fn read(&self, _ns: &str, _key: &str, _buf: &mut [u8]) -> Result<usize, StorageError> {
        Err(StorageError::NotFound)
    }

    fn write(&mut self, _ns: &str, _key: &str, _data: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::IoError)
    }

    fn delete(&mut self, _ns: &str, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::IoError)
    }

    fn exists(&self, _ns: &str, _key: &str) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSystem {
    pub delays_ms: Vec<u32>,
    pub restarts: u32,
}

impl SystemPort for RecordingSystem {
    fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
    }

    fn restart(&mut self) {
        self.restarts += 1;
    }
}

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingObserver {
    pub states: Vec<ConnState>,
}

impl StateObserver for RecordingObserver {
    fn on_state_changed(&mut self, state: ConnState) {
        self.states.push(state);
    }
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingPublisher {
    pub published: Vec<(String, String)>,
}

impl PublishPort for RecordingPublisher {
    fn publish(&mut self, tag: &str, payload: &[u8]) -> Result<(), PublishError> {
        self.published.push((
            tag.to_owned(),
            String::from_utf8_lossy(payload).into_owned(),
        ));
        Ok(())
    }
}
