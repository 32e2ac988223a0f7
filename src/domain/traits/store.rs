use crate::application::errors::StorageError;
use crate::domain::entities::GuildSettings;

/// Per-guild settings persistence
pub trait SettingsStore: Send + Sync {
    /// Stored settings, or defaults when the guild has none.
    fn get_settings(&self, guild_id: &str) -> Result<GuildSettings, StorageError>;

    fn save_settings(&self, settings: &GuildSettings) -> Result<(), StorageError>;

    fn remove_settings(&self, guild_id: &str) -> Result<bool, StorageError>;

    /// Guild-specific command prefix, if one was set.
    fn prefix(&self, guild_id: &str) -> Option<String> {
        self.get_settings(guild_id).ok().and_then(|s| s.prefix)
    }
}
