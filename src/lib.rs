//! State machine core of a work/rest interval timer.
//!
//! The device counts down a work interval, announces its end, counts down a
//! rest interval, announces that, and starts over. Four buttons start,
//! pause, reset and edit the intervals; a 4-digit 7-segment display and a
//! buzzer are the only outputs.
//!
//! Transitions are requested through a single-slot [`TransitionInbox`] that
//! timer and button interrupts can post to. [`Device::run`] drives the
//! dispatcher and one worker per [`State`]; the board supplies the drivers
//! through the [`Board`] trait.
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod config;
pub mod device;
pub mod drivers;
pub mod error;
pub mod settings;
pub mod states;
pub mod tasks;

pub use config::{DeviceConfig, RejectPolicy};
pub use device::Device;
pub use drivers::{Board, ButtonInput, Buzzer, CountdownTimer, Expiry, SegmentDisplay};
pub use error::{DriverError, Fault};
pub use settings::{CountDirection, Interval, Settings};
pub use states::{State, is_allowed};
pub use tasks::button_input::{Action, Button, Gesture, InputBindings, Press, action_for};
pub use tasks::countdown::CountdownSlot;
pub use tasks::display::Rendered;
pub use tasks::state_machine::TransitionInbox;
