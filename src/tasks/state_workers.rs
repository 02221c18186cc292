//! One worker per state. A worker sleeps on its wake signal while its state
//! is inactive and renders to the front panel while it is active.

use core::convert::Infallible;

use embedded_hal_async::delay::DelayNs;

use crate::config::{
    BEEP_PERIOD_MS, INDICATOR_BLINK_PERIOD_MS, PAUSED_FLASH_PERIOD_MS, RENDER_PERIOD_MS,
};
use crate::device::Device;
use crate::drivers::Board;
use crate::error::Fault;
use crate::settings::{CountDirection, Interval};
use crate::states::State;
use crate::tasks::countdown::{CountdownSlot, ceil_minutes, elapsed_minutes};
use crate::tasks::display::Panel;

type PanelOf<B> = Panel<<B as Board>::Display, <B as Board>::Buzzer>;

impl<B: Board> Device<B> {
    pub(crate) async fn state_worker_task<Y: DelayNs>(
        &self,
        state: State,
        mut delay: Y,
    ) -> Infallible {
        loop {
            self.wake[state.index()].wait().await;
            trace!("Worker {} resumed", state.name());

            if let Err(fault) = self.run_state(state, &mut delay).await {
                error!("Worker {} failed: {:?}", state.name(), fault);
                self.raise(fault);
                core::future::pending::<()>().await;
            }
        }
    }

    async fn run_state<Y: DelayNs>(&self, state: State, delay: &mut Y) -> Result<(), Fault> {
        match state {
            State::None => self.show_configured(state).await,
            State::Working => self.show_running(state, CountdownSlot::Work, delay).await,
            State::Resting => self.show_running(state, CountdownSlot::Rest, delay).await,
            State::PausedWorking => self.show_paused(state, CountdownSlot::Work, delay).await,
            State::PausedResting => self.show_paused(state, CountdownSlot::Rest, delay).await,
            State::FinishedWorking | State::FinishedResting => {
                self.show_finished(state, delay).await
            }
            State::SetWorking => self.show_setting(state, Interval::Work, delay).await,
            State::SetResting => self.show_setting(state, Interval::Rest, delay).await,
            State::Reset => self.hand_off(state, State::None, delay).await,
        }
    }

    /// Runs `f` on the panel if `state` still owns it. Returns `Ok(false)`
    /// when another worker took over, in which case nothing was written.
    async fn render(
        &self,
        state: State,
        f: impl FnOnce(&mut PanelOf<B>) -> Result<(), Fault>,
    ) -> Result<bool, Fault> {
        let mut panel = self.panel.lock().await;
        if !self.is_active(state) {
            return Ok(false);
        }
        f(&mut *panel)?;
        Ok(true)
    }

    /// Minutes to show for the countdown in `slot`, honouring the count
    /// direction. `None` if the countdown is not armed.
    async fn displayed_minutes(&self, slot: CountdownSlot) -> Result<Option<u16>, Fault> {
        let mut countdowns = self.countdowns.lock().await;
        let Some(remaining) = countdowns.remaining(slot)? else {
            return Ok(None);
        };
        let minutes = match (self.settings.count_direction(), countdowns.total(slot)) {
            (CountDirection::Up, Some(total)) => elapsed_minutes(total, remaining),
            _ => ceil_minutes(remaining),
        };
        Ok(Some(minutes))
    }

    /// NONE: show the configured work duration once, then go dormant.
    async fn show_configured(&self, state: State) -> Result<(), Fault> {
        let minutes = self.settings.minutes(Interval::Work);
        self.render(state, |panel| panel.show_number(minutes)).await?;
        Ok(())
    }

    async fn show_running<Y: DelayNs>(
        &self,
        state: State,
        slot: CountdownSlot,
        delay: &mut Y,
    ) -> Result<(), Fault> {
        while self.is_active(state) {
            if let Some(minutes) = self.displayed_minutes(slot).await? {
                if !self.render(state, |panel| panel.show_number(minutes)).await? {
                    break;
                }
            }
            delay.delay_ms(RENDER_PERIOD_MS).await;
        }
        Ok(())
    }

    /// Paused states flash the frozen value: on for one period, blank for
    /// the next.
    async fn show_paused<Y: DelayNs>(
        &self,
        state: State,
        slot: CountdownSlot,
        delay: &mut Y,
    ) -> Result<(), Fault> {
        while self.is_active(state) {
            if let Some(minutes) = self.displayed_minutes(slot).await? {
                if !self.render(state, |panel| panel.show_number(minutes)).await? {
                    break;
                }
            }
            delay.delay_ms(PAUSED_FLASH_PERIOD_MS).await;

            if !self.render(state, |panel| panel.blank()).await? {
                break;
            }
            delay.delay_ms(PAUSED_FLASH_PERIOD_MS).await;
        }
        Ok(())
    }

    /// Finished states show 0 and beep until their alarm window expires.
    async fn show_finished<Y: DelayNs>(&self, state: State, delay: &mut Y) -> Result<(), Fault> {
        let beep_ticks = BEEP_PERIOD_MS / RENDER_PERIOD_MS;
        let mut tone = true;
        let mut counter = beep_ticks;

        while self.is_active(state) {
            if counter == 0 {
                tone = !tone;
                counter = beep_ticks;
            }
            let rendered = self
                .render(state, |panel| {
                    panel.show_number(0)?;
                    panel.set_alert(tone)
                })
                .await?;
            if !rendered {
                break;
            }
            counter -= 1;
            delay.delay_ms(RENDER_PERIOD_MS).await;
        }
        Ok(())
    }

    /// Set states show the setting being edited with a blinking indicator.
    async fn show_setting<Y: DelayNs>(
        &self,
        state: State,
        interval: Interval,
        delay: &mut Y,
    ) -> Result<(), Fault> {
        let blink_ticks = INDICATOR_BLINK_PERIOD_MS / RENDER_PERIOD_MS;
        let mut show_indicator = true;
        let mut counter = blink_ticks;

        while self.is_active(state) {
            if counter == 0 {
                show_indicator = !show_indicator;
                counter = blink_ticks;
            }
            let minutes = self.settings.minutes(interval);
            if !self
                .render(state, |panel| panel.show_number_with_indicator(minutes, show_indicator))
                .await?
            {
                break;
            }
            counter -= 1;
            delay.delay_ms(RENDER_PERIOD_MS).await;
        }
        Ok(())
    }

    /// RESET: pass straight through to `to`. The request is handed to the
    /// dispatcher and this worker returns to its wait without waiting for
    /// the transition, so it never blocks on its own deactivation.
    async fn hand_off<Y: DelayNs>(
        &self,
        state: State,
        to: State,
        delay: &mut Y,
    ) -> Result<(), Fault> {
        while self.is_active(state) {
            if self.inbox.request_transition(to) {
                trace!("{} handed off to {}", state.name(), to.name());
                break;
            }
            // Something else is pending; it gets dispatched first.
            delay.delay_ms(RENDER_PERIOD_MS).await;
        }
        Ok(())
    }
}
