//! The fixed state set and the transition table.

/// Device activity. Exactly one is current at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum State {
    None = 0,
    Working,
    Resting,
    PausedWorking,
    PausedResting,
    FinishedWorking,
    FinishedResting,
    SetWorking,
    SetResting,
    Reset,
}

impl State {
    pub const COUNT: usize = 10;

    pub const ALL: [State; State::COUNT] = [
        State::None,
        State::Working,
        State::Resting,
        State::PausedWorking,
        State::PausedResting,
        State::FinishedWorking,
        State::FinishedResting,
        State::SetWorking,
        State::SetResting,
        State::Reset,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            State::None => "NONE",
            State::Working => "WORKING",
            State::Resting => "RESTING",
            State::PausedWorking => "PAUSED_WORKING",
            State::PausedResting => "PAUSED_RESTING",
            State::FinishedWorking => "FINISHED_WORKING",
            State::FinishedResting => "FINISHED_RESTING",
            State::SetWorking => "SET_WORKING",
            State::SetResting => "SET_RESTING",
            State::Reset => "RESET",
        }
    }

    /// Outgoing edges of the transition table.
    pub const fn allowed_targets(self) -> &'static [State] {
        match self {
            State::None => &[State::Working, State::SetWorking, State::Reset],
            State::Working => &[State::PausedWorking, State::FinishedWorking, State::Reset],
            State::PausedWorking => &[State::Working, State::Reset],
            State::FinishedWorking => &[State::Resting, State::Reset],
            State::Resting => &[State::PausedResting, State::FinishedResting, State::Reset],
            State::PausedResting => &[State::Resting, State::Reset],
            State::FinishedResting => &[State::Working, State::Reset],
            State::SetWorking => &[State::SetResting],
            State::SetResting => &[State::None],
            State::Reset => &[State::None],
        }
    }

    pub fn can_transition_to(self, to: State) -> bool {
        self.allowed_targets().contains(&to)
    }
}

impl core::fmt::Display for State {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns whether `from -> to` is an edge of the transition table.
pub fn is_allowed(from: State, to: State) -> bool {
    from.can_transition_to(to)
}
