//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Database: Per-guild settings persistence
//! - Adapters: Platform integrations (Discord)

pub mod adapters;
pub mod config;
pub mod database;
