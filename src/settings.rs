//! Work/rest duration settings shared with interrupt-context button handlers.

use embassy_time::Duration;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::{MAX_DURATION_S, MIN_DURATION_S};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Interval {
    Work,
    Rest,
}

impl Interval {
    pub const fn name(self) -> &'static str {
        match self {
            Interval::Work => "work",
            Interval::Rest => "rest",
        }
    }
}

/// Whether running intervals show the minutes left or the minutes elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CountDirection {
    Down,
    Up,
}

pub const fn clamp_duration_s(seconds: u32) -> u32 {
    if seconds < MIN_DURATION_S {
        MIN_DURATION_S
    } else if seconds > MAX_DURATION_S {
        MAX_DURATION_S
    } else {
        seconds
    }
}

pub struct Settings {
    work_s: AtomicU32,
    rest_s: AtomicU32,
    count_up: AtomicBool,
}

impl Settings {
    pub const fn new(work_s: u32, rest_s: u32) -> Self {
        Self {
            work_s: AtomicU32::new(clamp_duration_s(work_s)),
            rest_s: AtomicU32::new(clamp_duration_s(rest_s)),
            count_up: AtomicBool::new(false),
        }
    }

    fn cell(&self, interval: Interval) -> &AtomicU32 {
        match interval {
            Interval::Work => &self.work_s,
            Interval::Rest => &self.rest_s,
        }
    }

    pub fn seconds(&self, interval: Interval) -> u32 {
        self.cell(interval).load(Ordering::Relaxed)
    }

    pub fn duration(&self, interval: Interval) -> Duration {
        Duration::from_secs(self.seconds(interval) as u64)
    }

    pub fn minutes(&self, interval: Interval) -> u16 {
        (self.seconds(interval) / 60) as u16
    }

    fn update(&self, interval: Interval, f: impl Fn(u32) -> u32) -> u32 {
        let cell = self.cell(interval);
        let mut current = cell.load(Ordering::Relaxed);
        loop {
            let next = clamp_duration_s(f(current));
            match cell.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    /// Adds `step_s`, saturating at the maximum. Returns the new value.
    pub fn increase(&self, interval: Interval, step_s: u32) -> u32 {
        let value = self.update(interval, |s| s.saturating_add(step_s));
        debug!("{} duration increased to {}s", interval.name(), value);
        value
    }

    /// Subtracts `step_s`, saturating at the minimum. Returns the new value.
    pub fn decrease(&self, interval: Interval, step_s: u32) -> u32 {
        let value = self.update(interval, |s| s.saturating_sub(step_s));
        debug!("{} duration decreased to {}s", interval.name(), value);
        value
    }

    pub fn snap_to_min(&self, interval: Interval) -> u32 {
        self.cell(interval).store(MIN_DURATION_S, Ordering::Relaxed);
        debug!("{} duration reset to {}s", interval.name(), MIN_DURATION_S);
        MIN_DURATION_S
    }

    pub fn count_direction(&self) -> CountDirection {
        if self.count_up.load(Ordering::Relaxed) {
            CountDirection::Up
        } else {
            CountDirection::Down
        }
    }

    pub fn toggle_count_direction(&self) -> CountDirection {
        self.count_up.fetch_xor(true, Ordering::Relaxed);
        let direction = self.count_direction();
        debug!("Count direction now {:?}", direction);
        direction
    }
}
