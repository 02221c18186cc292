//! The device: owns the drivers, the dispatcher and the ten state workers.

use core::cell::Cell;

use embassy_futures::join::join_array;
use embassy_futures::select::{Either3, select3};
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use portable_atomic::{AtomicBool, Ordering};

use crate::config::{DeviceConfig, RejectPolicy};
use crate::drivers::Board;
use crate::error::Fault;
use crate::settings::Settings;
use crate::states::State;
use crate::tasks::button_input::InputBindings;
use crate::tasks::countdown::Countdowns;
use crate::tasks::display::DisplayArbiter;
use crate::tasks::state_machine::TransitionInbox;

pub type WorkerSignal = Signal<CriticalSectionRawMutex, ()>;

/// A work/rest timer. Powers on in RESET and hands off to NONE as soon as
/// [`run`](Device::run) is polled.
pub struct Device<B: Board> {
    pub(crate) inbox: &'static TransitionInbox,
    pub(crate) settings: Settings,
    pub(crate) reject_policy: RejectPolicy,
    pub(crate) finished_alarm_duration: Duration,
    pub(crate) current: BlockingMutex<CriticalSectionRawMutex, Cell<State>>,
    pub(crate) active_worker: BlockingMutex<CriticalSectionRawMutex, Cell<Option<State>>>,
    pub(crate) bindings: InputBindings<B::Buttons>,
    pub(crate) countdowns: Mutex<CriticalSectionRawMutex, Countdowns<B::Timer>>,
    pub(crate) panel: DisplayArbiter<B::Display, B::Buzzer>,
    pub(crate) wake: [WorkerSignal; State::COUNT],
    pub(crate) fault: Signal<CriticalSectionRawMutex, Fault>,
    halted: AtomicBool,
}

impl<B: Board> Device<B> {
    pub fn new(
        inbox: &'static TransitionInbox,
        timer: B::Timer,
        display: B::Display,
        buzzer: B::Buzzer,
        buttons: B::Buttons,
        config: DeviceConfig,
    ) -> Self {
        Self {
            inbox,
            settings: Settings::new(config.work_duration_s, config.rest_duration_s),
            reject_policy: config.reject_policy,
            finished_alarm_duration: Duration::from_millis(config.finished_alarm_duration_ms),
            current: BlockingMutex::new(Cell::new(State::Reset)),
            active_worker: BlockingMutex::new(Cell::new(None)),
            bindings: InputBindings::new(buttons),
            countdowns: Mutex::new(Countdowns::new(timer)),
            panel: DisplayArbiter::new(display, buzzer),
            wake: [const { Signal::new() }; State::COUNT],
            fault: Signal::new(),
            halted: AtomicBool::new(false),
        }
    }

    /// Runs the dispatcher and every state worker until a fault halts the
    /// device, and returns that fault. `delay` paces the workers; each
    /// worker gets its own clone.
    ///
    /// Must only be polled once per device.
    pub async fn run<Y: DelayNs + Clone>(&self, delay: Y) -> Fault {
        info!("Starting work/rest timer in {}", self.current_state().name());

        let workers =
            join_array(State::ALL.map(|state| self.state_worker_task(state, delay.clone())));

        // RESET's worker requests NONE right away.
        let initial = self.current_state();
        if let Err(fault) = self.bindings.bind(initial) {
            self.halt(fault);
            return fault;
        }
        self.activate_worker(initial);

        let fault = match select3(self.state_machine_task(), workers, self.fault.wait()).await {
            Either3::First(fault) => fault,
            Either3::Second([never, ..]) => match never {},
            Either3::Third(fault) => fault,
        };
        self.halt(fault);
        fault
    }

    /// Asks the dispatcher for a transition. Never blocks; returns `false`
    /// when another request is already pending and this one was dropped.
    pub fn request_transition(&self, to: State) -> bool {
        self.inbox.request_transition(to)
    }

    /// Interrupt-safe form of [`request_transition`](Self::request_transition).
    /// Returns whether the dispatcher must be woken on interrupt return.
    pub fn request_transition_from_interrupt(&self, to: State) -> bool {
        self.inbox.request_transition_from_interrupt(to)
    }

    /// The current state. Never observed half-way through a transition by
    /// the workers, which are locked out of the panel while it happens.
    pub fn current_state(&self) -> State {
        self.current.lock(|current| current.get())
    }

    /// The worker that currently owns the display.
    pub fn active_worker(&self) -> Option<State> {
        self.active_worker.lock(|active| active.get())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn bindings(&self) -> &InputBindings<B::Buttons> {
        &self.bindings
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    pub(crate) fn is_active(&self, state: State) -> bool {
        self.active_worker() == Some(state)
    }

    /// Makes `state`'s worker the only active one and wakes it.
    pub(crate) fn activate_worker(&self, state: State) {
        self.active_worker.lock(|active| active.set(Some(state)));
        self.wake[state.index()].signal(());
    }

    /// Reports a fault from a worker; `run` picks it up and returns.
    pub(crate) fn raise(&self, fault: Fault) {
        self.fault.signal(fault);
    }

    fn halt(&self, fault: Fault) {
        error!("Device halted: {:?}", fault);
        self.halted.store(true, Ordering::Release);
        self.active_worker.lock(|active| active.set(None));
        if let Some(state) = self.bindings.registered_state() {
            if self.bindings.unbind(state).is_err() {
                warn!("Could not unregister buttons of {}", state.name());
            }
        }
        match self.panel.try_lock() {
            Some(mut panel) => {
                if panel.set_alert(false).is_err() {
                    warn!("Could not silence the buzzer");
                }
            }
            None => warn!("Front panel busy, buzzer left as is"),
        }
    }
}
