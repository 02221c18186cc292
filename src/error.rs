use core::fmt;

use crate::states::State;
use crate::tasks::countdown::CountdownSlot;

/// Error kind reported by the collaborator drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// The driver ran out of hardware units or memory.
    NoResource,
    /// The call is not valid in the peripheral's current state.
    InvalidState,
    InvalidArgument,
    Hardware,
}

/// Unrecoverable condition. Once raised the device halts until power cycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// A request named an edge that is not in the transition table.
    RejectedTransition { from: State, to: State },
    Timer(DriverError),
    Display(DriverError),
    Buzzer(DriverError),
    Input(DriverError),
    /// A countdown had to be resumed but was never armed.
    MissingCountdown(CountdownSlot),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DriverError::NoResource => "no resource",
            DriverError::InvalidState => "invalid state",
            DriverError::InvalidArgument => "invalid argument",
            DriverError::Hardware => "hardware error",
        };
        f.write_str(text)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::RejectedTransition { from, to } => {
                write!(f, "transition {} -> {} is not allowed", from, to)
            }
            Fault::Timer(e) => write!(f, "timer driver failed: {}", e),
            Fault::Display(e) => write!(f, "display driver failed: {}", e),
            Fault::Buzzer(e) => write!(f, "buzzer driver failed: {}", e),
            Fault::Input(e) => write!(f, "button driver failed: {}", e),
            Fault::MissingCountdown(slot) => write!(f, "countdown {} is not armed", slot.name()),
        }
    }
}
