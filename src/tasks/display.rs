use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};

use crate::config::{BLANK_SEGMENT, DISPLAY_DIGITS, DISPLAY_MAX_VALUE};
use crate::drivers::{Buzzer, SegmentDisplay};
use crate::error::Fault;

/// What the display currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rendered {
    Number(u16),
    NumberWithIndicator(u16, bool),
    Blank,
}

/// The front panel: display plus buzzer. Only reachable through the
/// [`DisplayArbiter`].
pub struct Panel<D, Z> {
    display: D,
    buzzer: Z,
    last: Option<Rendered>,
    tone: bool,
}

impl<D: SegmentDisplay, Z: Buzzer> Panel<D, Z> {
    fn new(display: D, buzzer: Z) -> Self {
        Self {
            display,
            buzzer,
            last: None,
            tone: false,
        }
    }

    fn note(&mut self, rendered: Rendered) {
        if self.last != Some(rendered) {
            debug!("Display: {:?}", rendered);
            self.last = Some(rendered);
        }
    }

    pub fn show_number(&mut self, value: u16) -> Result<(), Fault> {
        let value = value.min(DISPLAY_MAX_VALUE);
        self.display.write_number(value).map_err(Fault::Display)?;
        self.note(Rendered::Number(value));
        Ok(())
    }

    pub fn show_number_with_indicator(
        &mut self,
        value: u16,
        show_indicator: bool,
    ) -> Result<(), Fault> {
        let value = value.min(DISPLAY_MAX_VALUE);
        self.display
            .write_number_with_indicator(value, show_indicator)
            .map_err(Fault::Display)?;
        self.note(Rendered::NumberWithIndicator(value, show_indicator));
        Ok(())
    }

    pub fn blank(&mut self) -> Result<(), Fault> {
        for index in 0..DISPLAY_DIGITS {
            self.display
                .write_segment_raw(index, BLANK_SEGMENT)
                .map_err(Fault::Display)?;
        }
        self.note(Rendered::Blank);
        Ok(())
    }

    /// Switches the buzzer; only touches the driver on a change.
    pub fn set_alert(&mut self, on: bool) -> Result<(), Fault> {
        if self.tone != on {
            self.buzzer.set_tone(on).map_err(Fault::Buzzer)?;
            self.tone = on;
        }
        Ok(())
    }

}

/// Serializes every access to the front panel. Holding the guard is the
/// critical section; it is released when the guard drops.
pub struct DisplayArbiter<D, Z> {
    panel: Mutex<CriticalSectionRawMutex, Panel<D, Z>>,
}

impl<D: SegmentDisplay, Z: Buzzer> DisplayArbiter<D, Z> {
    pub fn new(display: D, buzzer: Z) -> Self {
        Self {
            panel: Mutex::new(Panel::new(display, buzzer)),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, CriticalSectionRawMutex, Panel<D, Z>> {
        self.panel.lock().await
    }

    /// Non-waiting form of [`lock`](Self::lock), for use outside the tasks.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, CriticalSectionRawMutex, Panel<D, Z>>> {
        self.panel.try_lock().ok()
    }
}
