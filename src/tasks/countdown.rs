//! Countdown lifecycle: create/start, pause/resume and release of the
//! hardware timers owned by the timed states.

use embassy_time::Duration;

use crate::config::{DISPLAY_MAX_VALUE, TIMER_RESOLUTION_HZ};
use crate::drivers::{CountdownTimer, Expiry};
use crate::error::Fault;

/// The four countdowns a state can own. Each one belongs to exactly one
/// state family: `Work` to WORKING/PAUSED_WORKING, `Rest` to
/// RESTING/PAUSED_RESTING, and the alarm windows to the finished states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CountdownSlot {
    Work,
    Rest,
    WorkFinished,
    RestFinished,
}

impl CountdownSlot {
    pub const COUNT: usize = 4;

    pub const fn index(self) -> usize {
        match self {
            CountdownSlot::Work => 0,
            CountdownSlot::Rest => 1,
            CountdownSlot::WorkFinished => 2,
            CountdownSlot::RestFinished => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            CountdownSlot::Work => "work",
            CountdownSlot::Rest => "rest",
            CountdownSlot::WorkFinished => "work alarm",
            CountdownSlot::RestFinished => "rest alarm",
        }
    }
}

struct Countdown<H> {
    handle: H,
    total: Duration,
    running: bool,
}

pub struct Countdowns<T: CountdownTimer> {
    timer: T,
    slots: [Option<Countdown<T::Handle>>; CountdownSlot::COUNT],
}

impl<T: CountdownTimer> Countdowns<T> {
    pub fn new(timer: T) -> Self {
        Self {
            timer,
            slots: [None, None, None, None],
        }
    }

    /// Creates a countdown of `duration` in `slot` and starts it.
    pub fn arm(
        &mut self,
        slot: CountdownSlot,
        duration: Duration,
        on_expiry: Expiry,
    ) -> Result<(), Fault> {
        if self.slots[slot.index()].is_some() {
            warn!("Countdown {} still armed, releasing it first", slot.name());
            self.release(slot)?;
        }

        let timer = &mut self.timer;
        let mut handle = timer
            .create(TIMER_RESOLUTION_HZ, on_expiry)
            .map_err(Fault::Timer)?;
        timer.set_countdown(&mut handle, duration).map_err(Fault::Timer)?;
        timer.enable(&mut handle).map_err(Fault::Timer)?;
        timer.start(&mut handle).map_err(Fault::Timer)?;

        debug!(
            "Countdown {} armed for {}ms, expires into {}",
            slot.name(),
            duration.as_millis(),
            on_expiry.target().name()
        );

        self.slots[slot.index()] = Some(Countdown {
            handle,
            total: duration,
            running: true,
        });
        Ok(())
    }

    /// Stops the countdown but keeps its handle for a later resume.
    pub fn pause(&mut self, slot: CountdownSlot) -> Result<(), Fault> {
        let Some(countdown) = self.slots[slot.index()].as_mut() else {
            debug!("Countdown {} not armed, nothing to pause", slot.name());
            return Ok(());
        };
        if countdown.running {
            self.timer.stop(&mut countdown.handle).map_err(Fault::Timer)?;
            countdown.running = false;
            debug!("Countdown {} paused", slot.name());
        }
        Ok(())
    }

    /// Restarts a paused countdown without recreating it.
    pub fn resume(&mut self, slot: CountdownSlot) -> Result<(), Fault> {
        let Some(countdown) = self.slots[slot.index()].as_mut() else {
            return Err(Fault::MissingCountdown(slot));
        };
        if !countdown.running {
            self.timer.start(&mut countdown.handle).map_err(Fault::Timer)?;
            countdown.running = true;
            debug!("Countdown {} resumed", slot.name());
        }
        Ok(())
    }

    /// Stops, disables and destroys the countdown. No-op when the slot is empty.
    pub fn release(&mut self, slot: CountdownSlot) -> Result<(), Fault> {
        let Some(mut countdown) = self.slots[slot.index()].take() else {
            debug!("Countdown {} not armed, nothing to release", slot.name());
            return Ok(());
        };
        let timer = &mut self.timer;
        if countdown.running {
            timer.stop(&mut countdown.handle).map_err(Fault::Timer)?;
        }
        timer.disable(&mut countdown.handle).map_err(Fault::Timer)?;
        timer.destroy(countdown.handle).map_err(Fault::Timer)?;
        debug!("Countdown {} released", slot.name());
        Ok(())
    }

    #[cfg(test)]
    fn is_armed(&self, slot: CountdownSlot) -> bool {
        self.slots[slot.index()].is_some()
    }

    #[cfg(test)]
    fn is_running(&self, slot: CountdownSlot) -> bool {
        self.slots[slot.index()]
            .as_ref()
            .is_some_and(|countdown| countdown.running)
    }

    /// Duration the countdown in `slot` was armed with.
    pub fn total(&self, slot: CountdownSlot) -> Option<Duration> {
        self.slots[slot.index()].as_ref().map(|countdown| countdown.total)
    }

    pub fn remaining(&mut self, slot: CountdownSlot) -> Result<Option<Duration>, Fault> {
        match self.slots[slot.index()].as_ref() {
            Some(countdown) => self
                .timer
                .read_remaining(&countdown.handle)
                .map(Some)
                .map_err(Fault::Timer),
            None => Ok(None),
        }
    }
}

/// Remaining time in whole minutes, rounded up and capped at what the
/// display can show.
pub fn ceil_minutes(remaining: Duration) -> u16 {
    let minutes = remaining.as_millis().div_ceil(60_000);
    minutes.min(DISPLAY_MAX_VALUE as u64) as u16
}

/// Elapsed time in whole minutes, rounded down.
pub fn elapsed_minutes(total: Duration, remaining: Duration) -> u16 {
    let elapsed_ms = total.as_millis().saturating_sub(remaining.as_millis());
    (elapsed_ms / 60_000).min(DISPLAY_MAX_VALUE as u64) as u16
}
