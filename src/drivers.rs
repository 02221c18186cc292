//! Contracts for the hardware collaborators the state machine drives.
//!
//! The drivers themselves (timer peripheral, 7-segment controller, buzzer
//! output, debounced buttons) live in the board crate. Everything here is
//! what the core needs from them.

use embassy_time::Duration;

use crate::error::DriverError;
use crate::states::State;
use crate::tasks::button_input::{Button, Gesture, Press};
use crate::tasks::state_machine::TransitionInbox;

/// Groups the driver types of one board.
pub trait Board {
    type Timer: CountdownTimer;
    type Display: SegmentDisplay;
    type Buzzer: Buzzer;
    type Buttons: ButtonInput;
}

/// Completion callback attached to a countdown when it is created.
///
/// The timer driver calls [`Expiry::fire`] from its alarm interrupt when the
/// count reaches zero.
#[derive(Clone, Copy)]
pub struct Expiry {
    inbox: &'static TransitionInbox,
    target: State,
}

impl Expiry {
    pub const fn new(inbox: &'static TransitionInbox, target: State) -> Self {
        Self { inbox, target }
    }

    pub const fn target(&self) -> State {
        self.target
    }

    /// Requests the transition bound to this countdown. Interrupt safe.
    /// Returns whether the dispatcher has to be woken on interrupt return.
    pub fn fire(&self) -> bool {
        self.inbox.request_transition_from_interrupt(self.target)
    }
}

/// One-shot down-counting hardware timer.
///
/// Handles are owned values: `destroy` consumes them, so a handle can never
/// be used after it was released.
pub trait CountdownTimer {
    type Handle;

    fn create(
        &mut self,
        resolution_hz: u32,
        on_expiry: Expiry,
    ) -> Result<Self::Handle, DriverError>;
    fn set_countdown(
        &mut self,
        handle: &mut Self::Handle,
        duration: Duration,
    ) -> Result<(), DriverError>;
    fn enable(&mut self, handle: &mut Self::Handle) -> Result<(), DriverError>;
    fn start(&mut self, handle: &mut Self::Handle) -> Result<(), DriverError>;
    fn stop(&mut self, handle: &mut Self::Handle) -> Result<(), DriverError>;
    fn disable(&mut self, handle: &mut Self::Handle) -> Result<(), DriverError>;
    fn destroy(&mut self, handle: Self::Handle) -> Result<(), DriverError>;
    fn read_remaining(&mut self, handle: &Self::Handle) -> Result<Duration, DriverError>;
}

/// Four digit 7-segment display. Not required to be reentrant; the display
/// arbiter guarantees exclusive access.
pub trait SegmentDisplay {
    /// Shows `value` (0..=9999).
    fn write_number(&mut self, value: u16) -> Result<(), DriverError>;
    /// Shows `value` with the decimal point indicator on or off.
    fn write_number_with_indicator(
        &mut self,
        value: u16,
        show_indicator: bool,
    ) -> Result<(), DriverError>;
    fn write_segment_raw(&mut self, index: u8, pattern: u8) -> Result<(), DriverError>;
}

pub trait Buzzer {
    fn set_tone(&mut self, on: bool) -> Result<(), DriverError>;
}

/// Debounced button input with per-gesture callback registration.
///
/// Shared between the dispatcher and interrupt-adjacent event delivery, so
/// every method takes `&self`. For each registered `(button, press)` the
/// driver calls `Device::handle_button` with the payload it was given.
pub trait ButtonInput {
    fn register(&self, button: Button, press: Press, payload: State) -> Result<(), DriverError>;
    fn unregister(&self, button: Button, press: Press) -> Result<(), DriverError>;
    /// Gesture the button is currently in, if any.
    fn current_gesture(&self, button: Button) -> Option<Gesture>;
}
