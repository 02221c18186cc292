//! Entry and exit actions. Run by the dispatcher, one at a time, while it
//! holds the front panel and the countdowns.

use embassy_time::Duration;

use crate::drivers::{Board, Expiry};
use crate::error::Fault;
use crate::settings::{Interval, Settings};
use crate::states::State;
use crate::tasks::countdown::{CountdownSlot, Countdowns};
use crate::tasks::display::Panel;
use crate::tasks::state_machine::TransitionInbox;

pub(crate) struct HookContext<'a, B: Board> {
    pub countdowns: &'a mut Countdowns<B::Timer>,
    pub panel: &'a mut Panel<B::Display, B::Buzzer>,
    pub settings: &'a Settings,
    pub inbox: &'static TransitionInbox,
    pub finished_alarm_duration: Duration,
}

impl<B: Board> HookContext<'_, B> {
    fn arm(&mut self, slot: CountdownSlot, duration: Duration, then: State) -> Result<(), Fault> {
        self.countdowns.arm(slot, duration, Expiry::new(self.inbox, then))
    }

    fn arm_interval(
        &mut self,
        slot: CountdownSlot,
        interval: Interval,
        then: State,
    ) -> Result<(), Fault> {
        let duration = self.settings.duration(interval);
        self.arm(slot, duration, then)
    }

    fn arm_alarm(&mut self, slot: CountdownSlot, then: State) -> Result<(), Fault> {
        let duration = self.finished_alarm_duration;
        self.arm(slot, duration, then)
    }

    fn end_alarm(&mut self, slot: CountdownSlot) -> Result<(), Fault> {
        self.panel.set_alert(false)?;
        self.countdowns.release(slot)
    }
}

/// Runs `state`'s entry action after arriving from `old`.
pub(crate) fn on_entry<B: Board>(
    state: State,
    old: State,
    cx: &mut HookContext<'_, B>,
) -> Result<(), Fault> {
    match (state, old) {
        (State::Working, State::None | State::FinishedResting) => {
            cx.arm_interval(CountdownSlot::Work, Interval::Work, State::FinishedWorking)
        }
        (State::Working, State::PausedWorking) => cx.countdowns.resume(CountdownSlot::Work),
        (State::Resting, State::FinishedWorking) => {
            cx.arm_interval(CountdownSlot::Rest, Interval::Rest, State::FinishedResting)
        }
        (State::Resting, State::PausedResting) => cx.countdowns.resume(CountdownSlot::Rest),
        (State::FinishedWorking, _) => cx.arm_alarm(CountdownSlot::WorkFinished, State::Resting),
        (State::FinishedResting, _) => cx.arm_alarm(CountdownSlot::RestFinished, State::Working),
        // Paused, set, NONE and RESET states only change what is rendered.
        _ => Ok(()),
    }
}

/// Runs `state`'s exit action before leaving for `new`.
pub(crate) fn on_exit<B: Board>(
    state: State,
    new: State,
    cx: &mut HookContext<'_, B>,
) -> Result<(), Fault> {
    match (state, new) {
        (State::Working, State::PausedWorking) => cx.countdowns.pause(CountdownSlot::Work),
        (State::Working, State::FinishedWorking | State::Reset) => {
            cx.countdowns.release(CountdownSlot::Work)
        }
        (State::PausedWorking, State::Reset) => cx.countdowns.release(CountdownSlot::Work),
        (State::Resting, State::PausedResting) => cx.countdowns.pause(CountdownSlot::Rest),
        (State::Resting, State::FinishedResting | State::Reset) => {
            cx.countdowns.release(CountdownSlot::Rest)
        }
        (State::PausedResting, State::Reset) => cx.countdowns.release(CountdownSlot::Rest),
        (State::FinishedWorking, State::Resting | State::Reset) => {
            cx.end_alarm(CountdownSlot::WorkFinished)
        }
        (State::FinishedResting, State::Working | State::Reset) => {
            cx.end_alarm(CountdownSlot::RestFinished)
        }
        _ => Ok(()),
    }
}
