use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::config::{LONG_PRESS_STEP_S, SHORT_PRESS_STEP_S};
use crate::device::Device;
use crate::drivers::{Board, ButtonInput};
use crate::error::Fault;
use crate::settings::Interval;
use crate::states::State;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    Mode,
    Plus,
    Minus,
    Play,
}

impl Button {
    pub const ALL: [Button; 4] = [Button::Mode, Button::Plus, Button::Minus, Button::Play];

    pub const fn name(self) -> &'static str {
        match self {
            Button::Mode => "MODE",
            Button::Plus => "PLUS",
            Button::Minus => "MINUS",
            Button::Play => "PLAY",
        }
    }

    /// The other adjustment button, for the plus/minus pair.
    pub const fn opposite(self) -> Option<Button> {
        match self {
            Button::Plus => Some(Button::Minus),
            Button::Minus => Some(Button::Plus),
            _ => None,
        }
    }
}

/// Press kinds a callback can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Press {
    Short,
    Long,
}

impl Press {
    pub const ALL: [Press; 2] = [Press::Short, Press::Long];
}

/// What a button is doing right now, as reported by the input driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gesture {
    PressDown,
    PressUp,
    SingleClick,
    LongPressStart,
    LongPressHold,
}

impl Gesture {
    pub const fn is_long_press(self) -> bool {
        matches!(self, Gesture::LongPressStart | Gesture::LongPressHold)
    }
}

/// Effect of a button press in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    Request(State),
    Increase(Interval, u32),
    Decrease(Interval, u32),
    ToggleCountDirection,
}

const fn setting_for(state: State) -> Option<Interval> {
    match state {
        State::SetWorking => Some(Interval::Work),
        State::SetResting => Some(Interval::Rest),
        _ => None,
    }
}

const fn step_for(press: Press) -> u32 {
    match press {
        Press::Short => SHORT_PRESS_STEP_S,
        Press::Long => LONG_PRESS_STEP_S,
    }
}

/// The button map. `None` means the press is not bound in `state`.
pub const fn action_for(state: State, button: Button, press: Press) -> Option<Action> {
    match (button, press) {
        (Button::Mode, Press::Short) => match state {
            State::None => Some(Action::Request(State::SetWorking)),
            State::SetWorking => Some(Action::Request(State::SetResting)),
            State::SetResting => Some(Action::Request(State::None)),
            _ => None,
        },
        (Button::Mode, Press::Long) => match state {
            State::None | State::SetWorking | State::SetResting => {
                Some(Action::ToggleCountDirection)
            }
            _ => None,
        },
        (Button::Plus, _) => match setting_for(state) {
            Some(interval) => Some(Action::Increase(interval, step_for(press))),
            None => None,
        },
        (Button::Minus, _) => match setting_for(state) {
            Some(interval) => Some(Action::Decrease(interval, step_for(press))),
            None => None,
        },
        (Button::Play, Press::Short) => match state {
            State::None | State::PausedWorking | State::FinishedResting => {
                Some(Action::Request(State::Working))
            }
            State::Working => Some(Action::Request(State::PausedWorking)),
            State::Resting => Some(Action::Request(State::PausedResting)),
            State::PausedResting | State::FinishedWorking => Some(Action::Request(State::Resting)),
            _ => None,
        },
        (Button::Play, Press::Long) => match state {
            State::SetWorking | State::SetResting | State::Reset => None,
            _ => Some(Action::Request(State::Reset)),
        },
    }
}

#[derive(Clone, Copy)]
struct Binding {
    /// State the driver callbacks are registered for.
    registered: Option<State>,
    /// Cleared while a transition is being dispatched.
    live: bool,
}

/// Registers the current state's button callbacks with the input driver and
/// remembers which state they were registered for.
pub struct InputBindings<I: ButtonInput> {
    buttons: I,
    binding: Mutex<CriticalSectionRawMutex, Cell<Binding>>,
}

impl<I: ButtonInput> InputBindings<I> {
    pub fn new(buttons: I) -> Self {
        Self {
            buttons,
            binding: Mutex::new(Cell::new(Binding {
                registered: None,
                live: false,
            })),
        }
    }

    pub fn buttons(&self) -> &I {
        &self.buttons
    }

    /// State whose callbacks are currently accepted, if any.
    pub fn bound_state(&self) -> Option<State> {
        let binding = self.binding.lock(|binding| binding.get());
        binding.registered.filter(|_| binding.live)
    }

    pub(crate) fn registered_state(&self) -> Option<State> {
        self.binding.lock(|binding| binding.get().registered)
    }

    /// Stops accepting events without touching the driver registrations.
    pub(crate) fn mute(&self) {
        self.binding.lock(|binding| {
            binding.set(Binding {
                live: false,
                ..binding.get()
            })
        });
    }

    pub(crate) fn unmute(&self) {
        self.binding.lock(|binding| {
            let current = binding.get();
            binding.set(Binding {
                live: current.registered.is_some(),
                ..current
            })
        });
    }

    pub(crate) fn bind(&self, state: State) -> Result<(), Fault> {
        for button in Button::ALL {
            for press in Press::ALL {
                if action_for(state, button, press).is_some() {
                    self.buttons
                        .register(button, press, state)
                        .map_err(Fault::Input)?;
                }
            }
        }
        self.binding.lock(|binding| {
            binding.set(Binding {
                registered: Some(state),
                live: true,
            })
        });
        Ok(())
    }

    pub(crate) fn unbind(&self, state: State) -> Result<(), Fault> {
        self.binding.lock(|binding| {
            binding.set(Binding {
                registered: None,
                live: false,
            })
        });
        for button in Button::ALL {
            for press in Press::ALL {
                if action_for(state, button, press).is_some() {
                    self.buttons.unregister(button, press).map_err(Fault::Input)?;
                }
            }
        }
        Ok(())
    }
}

impl<B: Board> Device<B> {
    /// Entry point for the button driver's callbacks. `payload` is the state
    /// the callback was registered with. Safe to call from interrupt context.
    /// Returns whether the dispatcher has to be woken.
    pub fn handle_button(&self, button: Button, press: Press, payload: State) -> bool {
        if self.is_halted() {
            return false;
        }

        debug!("Button {} {:?} press: {}", button.name(), press, payload.name());

        if self.bindings.bound_state() != Some(payload) {
            debug!("Ignoring stale binding for {}", payload.name());
            return false;
        }

        let Some(action) = action_for(payload, button, press) else {
            return false;
        };

        match action {
            Action::Request(to) => self.inbox.request_transition_from_interrupt(to),
            Action::Increase(interval, step) => {
                if self.opposite_held(button, press) {
                    self.settings.snap_to_min(interval);
                } else {
                    self.settings.increase(interval, step);
                }
                false
            }
            Action::Decrease(interval, step) => {
                if self.opposite_held(button, press) {
                    self.settings.snap_to_min(interval);
                } else {
                    self.settings.decrease(interval, step);
                }
                false
            }
            Action::ToggleCountDirection => {
                self.settings.toggle_count_direction();
                false
            }
        }
    }

    /// Long press while the other adjustment button is also long-held.
    fn opposite_held(&self, button: Button, press: Press) -> bool {
        press == Press::Long
            && button.opposite().is_some_and(|other| {
                self.bindings
                    .buttons()
                    .current_gesture(other)
                    .is_some_and(Gesture::is_long_press)
            })
    }
}
