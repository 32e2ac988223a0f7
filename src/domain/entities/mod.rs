//! Domain entities - Core business objects with no external dependencies

pub mod user;
pub mod message;
pub mod command;
pub mod event;
pub mod presence;
pub mod session;
pub mod settings;

pub use user::User;
pub use message::{Content, Message};
pub use command::{Category, Command, CommandEvent, CommandRegistry, CommandResult, Emojis};
pub use event::GatewayEvent;
pub use presence::{Activity, OnlineStatus, Presence, PresenceDirective};
pub use session::{CacheFlag, Intents, Permissions, SessionConfig, SessionSpec};
pub use settings::{GuildSettings, RepeatMode, MAX_VOLUME};
