// Default interval lengths used until the user edits them in the set states.
pub const DEFAULT_WORK_DURATION_S: u32 = 25 * 60; // s
pub const DEFAULT_REST_DURATION_S: u32 = 5 * 60; // s

// Bounds for both interval settings: 1 minute to 9999 minutes.
pub const MIN_DURATION_S: u32 = 60; // s
pub const MAX_DURATION_S: u32 = 9999 * 60; // s

// Adjustment steps for the plus/minus buttons
pub const SHORT_PRESS_STEP_S: u32 = 60; // s
pub const LONG_PRESS_STEP_S: u32 = 10 * 60; // s

// How long the finished states announce themselves before moving on.
pub const DEFAULT_FINISHED_ALARM_DURATION_MS: u64 = 5_000; // ms

pub const TIMER_RESOLUTION_HZ: u32 = 1_000;

// Worker cadences
pub const RENDER_PERIOD_MS: u32 = 10; // ms
pub const PAUSED_FLASH_PERIOD_MS: u32 = 500; // ms; on for one period, blank for the next
pub const INDICATOR_BLINK_PERIOD_MS: u32 = 500; // ms
pub const BEEP_PERIOD_MS: u32 = 250; // ms

pub const DISPLAY_DIGITS: u8 = 4;
pub const DISPLAY_MAX_VALUE: u16 = 9999;
pub const BLANK_SEGMENT: u8 = 0x00;

/// What the dispatcher does with a request for an edge that is not in the
/// transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RejectPolicy {
    /// Raise `Fault::RejectedTransition` and halt the device.
    Halt,
    /// Log the request and keep running in the current state.
    Ignore,
}

pub const DEFAULT_REJECT_POLICY: RejectPolicy = RejectPolicy::Halt;

/// Runtime configuration handed to `Device::new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    pub work_duration_s: u32,
    pub rest_duration_s: u32,
    pub finished_alarm_duration_ms: u64,
    pub reject_policy: RejectPolicy,
}

impl DeviceConfig {
    pub const fn new() -> Self {
        Self {
            work_duration_s: DEFAULT_WORK_DURATION_S,
            rest_duration_s: DEFAULT_REST_DURATION_S,
            finished_alarm_duration_ms: DEFAULT_FINISHED_ALARM_DURATION_MS,
            reject_policy: DEFAULT_REJECT_POLICY,
        }
    }

    pub const fn with_durations(mut self, work_duration_s: u32, rest_duration_s: u32) -> Self {
        self.work_duration_s = work_duration_s;
        self.rest_duration_s = rest_duration_s;
        self
    }

    pub const fn with_finished_alarm_duration_ms(mut self, duration_ms: u64) -> Self {
        self.finished_alarm_duration_ms = duration_ms;
        self
    }

    pub const fn with_reject_policy(mut self, policy: RejectPolicy) -> Self {
        self.reject_policy = policy;
        self
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::new()
    }
}
