//! Domain layer - Core business objects and the seams to infrastructure
//! 
//! This layer contains:
//! - Entities: Core business objects (User, Message, Command, Presence, Session inputs)
//! - Traits: Abstractions for infrastructure (GatewayClient, GatewaySession, SettingsStore)

pub mod entities;
pub mod traits;
