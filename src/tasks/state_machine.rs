use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel;

use crate::config::RejectPolicy;
use crate::device::Device;
use crate::drivers::Board;
use crate::error::Fault;
use crate::states::State;
use crate::tasks::state_hooks::{self, HookContext};

/// Single-slot request buffer. A request arriving while one is pending is
/// dropped.
pub type TransitionChannelType = channel::Channel<CriticalSectionRawMutex, State, 1>;

/// The dispatcher's inbox. Placed in a `static` so timer and button
/// interrupts can reach it.
pub struct TransitionInbox {
    channel: TransitionChannelType,
}

impl TransitionInbox {
    pub const fn new() -> Self {
        Self {
            channel: channel::Channel::new(),
        }
    }

    /// Queues `to` unless a request is already pending. Never blocks.
    /// Returns whether the request was accepted.
    pub fn request_transition(&self, to: State) -> bool {
        match self.channel.try_send(to) {
            Ok(()) => true,
            Err(_) => {
                debug!("Request for {} dropped, another one is pending", to.name());
                false
            }
        }
    }

    /// Interrupt-context form of [`request_transition`](Self::request_transition).
    ///
    /// The channel is guarded by a critical section and never waits, so this
    /// is safe to call from an ISR. Returns whether the dispatcher was handed
    /// work, i.e. whether it must be woken when the interrupt returns.
    pub fn request_transition_from_interrupt(&self, to: State) -> bool {
        self.request_transition(to)
    }

    pub fn is_pending(&self) -> bool {
        !self.channel.is_empty()
    }

    pub(crate) async fn next_request(&self) -> State {
        self.channel.receive().await
    }
}

impl Default for TransitionInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Board> Device<B> {
    /// The dispatcher. Waits on the inbox and performs one transition per
    /// request. Only returns when a fault stops the device.
    pub(crate) async fn state_machine_task(&self) -> Fault {
        info!("State machine task initialized");

        loop {
            let to = self.inbox.next_request().await;
            // Presses that land before the old bindings are removed would
            // otherwise repeat the request from the new state.
            self.bindings.mute();
            if let Err(fault) = self.dispatch(to).await {
                return fault;
            }
        }
    }

    async fn dispatch(&self, to: State) -> Result<(), Fault> {
        let from = self.current_state();

        if !from.can_transition_to(to) {
            return match self.reject_policy {
                RejectPolicy::Halt => {
                    error!("Transition from {} to {} is not allowed", from.name(), to.name());
                    Err(Fault::RejectedTransition { from, to })
                }
                RejectPolicy::Ignore => {
                    warn!("Ignoring transition from {} to {}", from.name(), to.name());
                    self.bindings.unmute();
                    Ok(())
                }
            };
        }

        info!("Transitioning from {} to {}", from.name(), to.name());

        // Holding the panel for the whole transition keeps every worker off
        // the display until the new state is fully set up.
        let mut panel = self.panel.lock().await;
        let mut countdowns = self.countdowns.lock().await;

        self.bindings.unbind(from)?;

        let mut cx = HookContext::<B> {
            countdowns: &mut *countdowns,
            panel: &mut *panel,
            settings: &self.settings,
            inbox: self.inbox,
            finished_alarm_duration: self.finished_alarm_duration,
        };
        state_hooks::on_exit(from, to, &mut cx)?;
        self.current.lock(|current| current.set(to));
        state_hooks::on_entry(to, from, &mut cx)?;

        self.bindings.bind(to)?;

        // The outgoing worker is never waited on: it notices it lost the
        // display at its next write and goes dormant by itself. A worker that
        // requested its own exit (RESET) has already returned to its wait.
        self.activate_worker(to);

        Ok(())
    }
}
