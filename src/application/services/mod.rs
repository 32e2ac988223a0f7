//! Application services - startup orchestration and the runtime pieces it wires

pub mod bootstrap;
pub mod bot_context;
pub mod command_service;
pub mod presence;
pub mod shutdown;
pub mod startup;

#[cfg(test)]
pub(crate) mod test_session;

pub use bot_context::BotContext;
pub use shutdown::termination_signal;
pub use startup::{start, StartupOutcome};
