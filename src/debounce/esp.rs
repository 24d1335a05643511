//! ESP-IDF bindings for the debounce engine.
//!
//! The GPIO edge ISR and the esp_timer expiry callback are `extern "C"`
//! trampolines that carry the pin number in their context argument and
//! forward into a single registered engine instance.  Timer callbacks are
//! dispatched from the high-priority `ESP_TIMER_TASK`, not from interrupt
//! context, so sampling the pin and pushing to the queue is allowed there.

use core::ffi::c_void;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use esp_idf_svc::sys::{self as sys, esp};

use super::{DebounceEngine, EdgeTrigger, GpioPort, PullMode, StableTimer, TimerService};
use crate::error::{DebounceError, TimerError};

/// The engine type wired to the real hardware.
pub type EspDebounceEngine = DebounceEngine<'static, EspGpio, EspTimerService>;

/// The single engine instance the C trampolines dispatch into.
static ENGINE: AtomicPtr<EspDebounceEngine> = AtomicPtr::new(ptr::null_mut());

/// Route interrupt and timer callbacks to `engine`.
///
/// # Safety
/// `engine` must point to an engine that outlives all subsequent interrupt
/// activity (in practice: leaked or static).  Must be called before
/// [`DebounceEngine::register`] binds the first interrupt, and at most
/// once.  Registration may continue to mutate the engine afterwards: the
/// trampolines only read channel entries, and a pin's interrupt is bound
/// only after its entry is fully in place.
pub unsafe fn install_dispatch(engine: *const EspDebounceEngine) {
    ENGINE.store(engine.cast_mut(), Ordering::Release);
}

fn dispatch() -> Option<&'static EspDebounceEngine> {
    let p = ENGINE.load(Ordering::Acquire);
    // SAFETY: install_dispatch guarantees the pointee lives forever.
    unsafe { p.cast_const().as_ref() }
}

unsafe extern "C" fn edge_isr(arg: *mut c_void) {
    let pin = arg as i32;
    if let Some(engine) = dispatch() {
        engine.handle_edge(pin);
    }
}

unsafe extern "C" fn window_expired(arg: *mut c_void) {
    let pin = arg as i32;
    if let Some(engine) = dispatch() {
        engine.handle_window_expiry(pin);
    }
}

// ---------------------------------------------------------------------------
// GPIO
// ---------------------------------------------------------------------------

/// Raw ESP-IDF GPIO access.
pub struct EspGpio;

impl EspGpio {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EspGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioPort for EspGpio {
    fn install_isr_service(&mut self) -> Result<(), DebounceError> {
        // SAFETY: plain FFI call, no pointers involved.
        match esp!(unsafe { sys::gpio_install_isr_service(0) }) {
            Ok(()) => Ok(()),
            // Already installed by an earlier init: fine.
            Err(e) if e.code() == sys::ESP_ERR_INVALID_STATE as i32 => Ok(()),
            Err(_) => Err(DebounceError::IsrServiceFailed),
        }
    }

    fn configure_input(
        &mut self,
        pin: i32,
        pull: PullMode,
        trigger: EdgeTrigger,
    ) -> Result<(), DebounceError> {
        let intr_type = match trigger {
            EdgeTrigger::Rising => sys::gpio_int_type_t_GPIO_INTR_POSEDGE,
            EdgeTrigger::Falling => sys::gpio_int_type_t_GPIO_INTR_NEGEDGE,
            EdgeTrigger::Either => sys::gpio_int_type_t_GPIO_INTR_ANYEDGE,
        };
        let (pull_up_en, pull_down_en) = match pull {
            PullMode::None => (
                sys::gpio_pullup_t_GPIO_PULLUP_DISABLE,
                sys::gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            ),
            PullMode::Up => (
                sys::gpio_pullup_t_GPIO_PULLUP_ENABLE,
                sys::gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            ),
            PullMode::Down => (
                sys::gpio_pullup_t_GPIO_PULLUP_DISABLE,
                sys::gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
            ),
        };
        let cfg = sys::gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: sys::gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en,
            pull_down_en,
            intr_type,
            ..Default::default()
        };
        // SAFETY: cfg is a fully initialised stack value; the call copies it.
        esp!(unsafe { sys::gpio_config(&cfg) }).map_err(|_| DebounceError::PinConfigFailed(pin))
    }

    fn bind_interrupt(&mut self, pin: i32) -> Result<(), DebounceError> {
        // SAFETY: the handler receives the pin number by value in its
        // context argument; no pointer is dereferenced from it.
        esp!(unsafe { sys::gpio_isr_handler_add(pin, Some(edge_isr), pin as usize as *mut c_void) })
            .map_err(|_| DebounceError::IsrBindFailed(pin))
    }

    fn level(&self, pin: i32) -> bool {
        // SAFETY: plain FFI call.
        unsafe { sys::gpio_get_level(pin) != 0 }
    }
}

// ---------------------------------------------------------------------------
// Timers
// ---------------------------------------------------------------------------

/// A one-shot esp_timer owned by one debounce channel.
pub struct EspStableTimer {
    handle: sys::esp_timer_handle_t,
}

// The handle is only passed to ESP-IDF calls that are themselves task-safe.
unsafe impl Send for EspStableTimer {}
unsafe impl Sync for EspStableTimer {}

impl StableTimer for EspStableTimer {
    fn arm(&self, window_us: u64) -> Result<(), TimerError> {
        // Stop-then-start gives the restart semantics: a pending firing is
        // cancelled (stopping an idle timer returns an error we ignore) and
        // the window begins anew from this edge.
        // SAFETY: handle is valid for the life of the channel entry.
        unsafe {
            let _ = sys::esp_timer_stop(self.handle);
            esp!(sys::esp_timer_start_once(self.handle, window_us))
                .map_err(|_| TimerError::ArmFailed)
        }
    }
}

/// Allocates esp_timer one-shot timers whose expiry carries the pin number.
pub struct EspTimerService;

impl EspTimerService {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EspTimerService {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerService for EspTimerService {
    type Timer = EspStableTimer;

    fn create(&mut self, pin: i32) -> Result<Self::Timer, TimerError> {
        let args = sys::esp_timer_create_args_t {
            callback: Some(window_expired),
            arg: pin as usize as *mut c_void,
            dispatch_method: sys::esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: c"debounce".as_ptr(),
            ..Default::default()
        };
        let mut handle: sys::esp_timer_handle_t = ptr::null_mut();
        // SAFETY: args and handle are valid stack pointers for the call.
        esp!(unsafe { sys::esp_timer_create(&args, &raw mut handle) })
            .map_err(|_| TimerError::CreateFailed)?;
        Ok(EspStableTimer { handle })
    }

    fn release(&mut self, timer: Self::Timer) {
        // SAFETY: the handle came from esp_timer_create and is not used
        // again after this call.
        unsafe {
            let _ = sys::esp_timer_stop(timer.handle);
            let _ = sys::esp_timer_delete(timer.handle);
        }
    }
}
