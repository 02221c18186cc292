//! Simulated board for driving a `Device` on the host.
//!
//! Every driver writes into one shared `Hw` record so tests can inspect the
//! order of driver calls across timer, display, buzzer and buttons.
#![allow(dead_code)]

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use embassy_futures::block_on;
use embassy_futures::select::{Either, select};
use embassy_futures::yield_now;
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use worktimer::{
    Board, Button, ButtonInput, Buzzer, CountdownTimer, Device, DeviceConfig, DriverError, Expiry,
    Fault, Gesture, Press, Rendered, SegmentDisplay, State, TransitionInbox,
};

const SETTLE_POLLS: usize = 64;
const MAX_POLLS: usize = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Create(u32, State),
    SetCountdown(u32, u64),
    Enable(u32),
    Start(u32),
    Stop(u32),
    Disable(u32),
    Destroy(u32),
    Tone(bool),
    Register(Button, Press, State),
    Unregister(Button, Press),
}

pub struct SimCountdown {
    pub id: u32,
    pub expiry: Expiry,
    pub duration_ms: u64,
    pub remaining_ms: u64,
    pub enabled: bool,
    pub running: bool,
}

#[derive(Default)]
pub struct HwState {
    next_id: u32,
    pub ops: Vec<Op>,
    pub countdowns: Vec<SimCountdown>,
    pub rendered: Vec<Rendered>,
    pub tone: bool,
    pub registered: Vec<(Button, Press, State)>,
    pub gestures: Vec<(Button, Gesture)>,
    pub fail_create: bool,
    pub fail_display: bool,
    pub fail_buzzer: bool,
}

impl HwState {
    fn countdown(&mut self, id: u32) -> Result<&mut SimCountdown, DriverError> {
        self.countdowns
            .iter_mut()
            .find(|countdown| countdown.id == id)
            .ok_or(DriverError::InvalidArgument)
    }

    fn render(&mut self, rendered: Rendered) {
        if self.rendered.last() != Some(&rendered) {
            self.rendered.push(rendered);
        }
    }

    /// Targets of the countdowns that currently exist.
    pub fn live_targets(&self) -> Vec<State> {
        self.countdowns.iter().map(|countdown| countdown.expiry.target()).collect()
    }

    pub fn last_rendered(&self) -> Option<Rendered> {
        self.rendered.last().copied()
    }

    pub fn payload_of(&self, button: Button, press: Press) -> Option<State> {
        self.registered
            .iter()
            .find(|(b, p, _)| *b == button && *p == press)
            .map(|(_, _, payload)| *payload)
    }
}

pub type Hw = Rc<RefCell<HwState>>;

pub struct SimTimer(Hw);
pub struct SimDisplay(Hw);
pub struct SimBuzzer(Hw);
pub struct SimButtons(Hw);

impl CountdownTimer for SimTimer {
    type Handle = u32;

    fn create(&mut self, resolution_hz: u32, on_expiry: Expiry) -> Result<u32, DriverError> {
        let mut hw = self.0.borrow_mut();
        if hw.fail_create {
            return Err(DriverError::NoResource);
        }
        assert_eq!(resolution_hz, 1_000);
        hw.next_id += 1;
        let id = hw.next_id;
        hw.countdowns.push(SimCountdown {
            id,
            expiry: on_expiry,
            duration_ms: 0,
            remaining_ms: 0,
            enabled: false,
            running: false,
        });
        hw.ops.push(Op::Create(id, on_expiry.target()));
        Ok(id)
    }

    fn set_countdown(&mut self, handle: &mut u32, duration: Duration) -> Result<(), DriverError> {
        let mut hw = self.0.borrow_mut();
        let countdown = hw.countdown(*handle)?;
        countdown.duration_ms = duration.as_millis();
        countdown.remaining_ms = duration.as_millis();
        hw.ops.push(Op::SetCountdown(*handle, duration.as_millis()));
        Ok(())
    }

    fn enable(&mut self, handle: &mut u32) -> Result<(), DriverError> {
        let mut hw = self.0.borrow_mut();
        hw.countdown(*handle)?.enabled = true;
        hw.ops.push(Op::Enable(*handle));
        Ok(())
    }

    fn start(&mut self, handle: &mut u32) -> Result<(), DriverError> {
        let mut hw = self.0.borrow_mut();
        let countdown = hw.countdown(*handle)?;
        if !countdown.enabled || countdown.running {
            return Err(DriverError::InvalidState);
        }
        countdown.running = true;
        hw.ops.push(Op::Start(*handle));
        Ok(())
    }

    fn stop(&mut self, handle: &mut u32) -> Result<(), DriverError> {
        let mut hw = self.0.borrow_mut();
        let countdown = hw.countdown(*handle)?;
        if !countdown.running {
            return Err(DriverError::InvalidState);
        }
        countdown.running = false;
        hw.ops.push(Op::Stop(*handle));
        Ok(())
    }

    fn disable(&mut self, handle: &mut u32) -> Result<(), DriverError> {
        let mut hw = self.0.borrow_mut();
        let countdown = hw.countdown(*handle)?;
        if countdown.running {
            return Err(DriverError::InvalidState);
        }
        countdown.enabled = false;
        hw.ops.push(Op::Disable(*handle));
        Ok(())
    }

    fn destroy(&mut self, handle: u32) -> Result<(), DriverError> {
        let mut hw = self.0.borrow_mut();
        if hw.countdown(handle)?.enabled {
            return Err(DriverError::InvalidState);
        }
        hw.countdowns.retain(|countdown| countdown.id != handle);
        hw.ops.push(Op::Destroy(handle));
        Ok(())
    }

    fn read_remaining(&mut self, handle: &u32) -> Result<Duration, DriverError> {
        let mut hw = self.0.borrow_mut();
        Ok(Duration::from_millis(hw.countdown(*handle)?.remaining_ms))
    }
}

impl SegmentDisplay for SimDisplay {
    fn write_number(&mut self, value: u16) -> Result<(), DriverError> {
        let mut hw = self.0.borrow_mut();
        if hw.fail_display {
            return Err(DriverError::Hardware);
        }
        hw.render(Rendered::Number(value));
        Ok(())
    }

    fn write_number_with_indicator(
        &mut self,
        value: u16,
        show_indicator: bool,
    ) -> Result<(), DriverError> {
        let mut hw = self.0.borrow_mut();
        if hw.fail_display {
            return Err(DriverError::Hardware);
        }
        hw.render(Rendered::NumberWithIndicator(value, show_indicator));
        Ok(())
    }

    fn write_segment_raw(&mut self, index: u8, pattern: u8) -> Result<(), DriverError> {
        let mut hw = self.0.borrow_mut();
        if hw.fail_display {
            return Err(DriverError::Hardware);
        }
        if index >= 4 {
            return Err(DriverError::InvalidArgument);
        }
        if index == 3 && pattern == 0 {
            hw.render(Rendered::Blank);
        }
        Ok(())
    }
}

impl Buzzer for SimBuzzer {
    fn set_tone(&mut self, on: bool) -> Result<(), DriverError> {
        let mut hw = self.0.borrow_mut();
        if hw.fail_buzzer {
            return Err(DriverError::Hardware);
        }
        hw.tone = on;
        hw.ops.push(Op::Tone(on));
        Ok(())
    }
}

impl ButtonInput for SimButtons {
    fn register(&self, button: Button, press: Press, payload: State) -> Result<(), DriverError> {
        let mut hw = self.0.borrow_mut();
        if hw.payload_of(button, press).is_some() {
            return Err(DriverError::InvalidState);
        }
        hw.registered.push((button, press, payload));
        hw.ops.push(Op::Register(button, press, payload));
        Ok(())
    }

    fn unregister(&self, button: Button, press: Press) -> Result<(), DriverError> {
        let mut hw = self.0.borrow_mut();
        if hw.payload_of(button, press).is_none() {
            return Err(DriverError::InvalidState);
        }
        hw.registered.retain(|(b, p, _)| !(*b == button && *p == press));
        hw.ops.push(Op::Unregister(button, press));
        Ok(())
    }

    fn current_gesture(&self, button: Button) -> Option<Gesture> {
        let hw = self.0.borrow();
        hw.gestures
            .iter()
            .find(|(b, _)| *b == button)
            .map(|(_, gesture)| *gesture)
    }
}

pub struct SimBoard;

impl Board for SimBoard {
    type Timer = SimTimer;
    type Display = SimDisplay;
    type Buzzer = SimBuzzer;
    type Buttons = SimButtons;
}

/// Delay that only yields, so simulated time is measured in polls.
#[derive(Clone)]
pub struct SimDelay;

impl DelayNs for SimDelay {
    async fn delay_ns(&mut self, _ns: u32) {
        yield_now().await;
    }
}

pub struct Rig {
    pub hw: Hw,
    pub inbox: &'static TransitionInbox,
    pub device: Device<SimBoard>,
}

impl Rig {
    pub fn new(config: DeviceConfig) -> Self {
        let hw = Hw::default();
        let inbox: &'static TransitionInbox = Box::leak(Box::new(TransitionInbox::new()));
        let device = Device::new(
            inbox,
            SimTimer(hw.clone()),
            SimDisplay(hw.clone()),
            SimBuzzer(hw.clone()),
            SimButtons(hw.clone()),
            config,
        );
        Self { hw, inbox, device }
    }

    /// Runs the device alongside `script`. Returns the device's fault if it
    /// halted before the script finished.
    pub fn run(&self, script: impl Future<Output = ()>) -> Option<Fault> {
        match block_on(select(self.device.run(SimDelay), script)) {
            Either::First(fault) => Some(fault),
            Either::Second(()) => None,
        }
    }

    /// Delivers a press the way the button driver does: only for registered
    /// callbacks, with the registered payload.
    pub fn press(&self, button: Button, press: Press) -> bool {
        let payload = self.hw.borrow().payload_of(button, press);
        match payload {
            Some(payload) => self.device.handle_button(button, press, payload),
            None => false,
        }
    }

    pub fn hold(&self, button: Button, gesture: Gesture) {
        let mut hw = self.hw.borrow_mut();
        hw.gestures.retain(|(b, _)| *b != button);
        hw.gestures.push((button, gesture));
    }

    pub fn release_all(&self) {
        self.hw.borrow_mut().gestures.clear();
    }

    /// Fires the live countdown that expires into `target`, like its alarm
    /// interrupt would.
    pub fn fire(&self, target: State) -> bool {
        let expiry = {
            let mut hw = self.hw.borrow_mut();
            let countdown = hw
                .countdowns
                .iter_mut()
                .find(|countdown| countdown.running && countdown.expiry.target() == target)
                .unwrap_or_else(|| panic!("no running countdown expires into {}", target));
            countdown.remaining_ms = 0;
            countdown.expiry
        };
        expiry.fire()
    }

    pub fn set_remaining_ms(&self, target: State, remaining_ms: u64) {
        let mut hw = self.hw.borrow_mut();
        let countdown = hw
            .countdowns
            .iter_mut()
            .find(|countdown| countdown.expiry.target() == target)
            .unwrap_or_else(|| panic!("no countdown expires into {}", target));
        countdown.remaining_ms = remaining_ms;
    }

    pub fn ops(&self) -> Vec<Op> {
        self.hw.borrow().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.hw.borrow_mut().ops.clear();
    }

    pub fn last_rendered(&self) -> Option<Rendered> {
        self.hw.borrow().last_rendered()
    }

    /// True once no request is pending and `state` is current and owns the
    /// display.
    pub fn is_settled_in(&self, state: State) -> bool {
        !self.inbox.is_pending()
            && self.device.current_state() == state
            && self.device.active_worker() == Some(state)
    }

    /// Waits until the device has settled in `state`.
    pub async fn reach(&self, state: State) {
        wait_until(|| self.is_settled_in(state)).await;
        settle().await;
        assert!(self.is_settled_in(state), "left {} while settling", state);
    }

    /// Waits until the device has settled in whatever state it is heading to.
    pub async fn quiesce(&self) {
        wait_until(|| {
            let current = self.device.current_state();
            current != State::Reset && self.is_settled_in(current)
        })
        .await;
        settle().await;
    }
}

/// Gives every task a bounded number of polls.
pub async fn settle() {
    for _ in 0..SETTLE_POLLS {
        yield_now().await;
    }
}

pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..MAX_POLLS {
        if condition() {
            return;
        }
        yield_now().await;
    }
    panic!("condition not reached after {} polls", MAX_POLLS);
}
