//! Domain traits - Abstractions for infrastructure implementations

pub mod gateway;
pub mod store;

pub use gateway::{EventListener, GatewayClient, GatewaySession, ProfileEdit};
pub use store::SettingsStore;
