//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: startup orchestration, session bootstrap, shutdown
//! - Commands: the bot's chat commands
//! - Errors: Domain-specific errors
//! - Messaging: prefix parsing, event waiting, reply tracking

pub mod commands;
pub mod errors;
pub mod messaging;
pub mod services;
