pub mod button_input;
pub mod countdown;
pub mod display;
pub(crate) mod state_hooks;
pub mod state_machine;
pub(crate) mod state_workers;
