//! SQLite-backed guild settings

use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::path::Path;
use std::sync::Mutex;

use crate::application::errors::StorageError;
use crate::domain::entities::{GuildSettings, RepeatMode};
use crate::domain::traits::SettingsStore;

pub struct SettingsManager {
    conn: Mutex<Connection>,
}

impl SettingsManager {
    pub fn new(path: impl AsRef<Path>) -> SqliteResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> SqliteResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> SqliteResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS guild_settings (
                guild_id TEXT PRIMARY KEY NOT NULL,
                text_channel_id TEXT,
                voice_channel_id TEXT,
                dj_role_id TEXT,
                volume INTEGER NOT NULL DEFAULT 100,
                default_playlist TEXT,
                repeat_mode TEXT NOT NULL DEFAULT 'off',
                prefix TEXT,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Number of guilds with stored settings.
    pub fn count(&self) -> Result<usize, StorageError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM guild_settings", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl SettingsStore for SettingsManager {
    fn get_settings(&self, guild_id: &str) -> Result<GuildSettings, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT text_channel_id, voice_channel_id, dj_role_id, volume, default_playlist, repeat_mode, prefix
             FROM guild_settings WHERE guild_id = ?1",
        )?;

        let settings = stmt
            .query_row([guild_id], |row| {
                let repeat: String = row.get(5)?;
                let volume: i64 = row.get(3)?;
                Ok(GuildSettings {
                    guild_id: guild_id.to_string(),
                    text_channel_id: row.get(0)?,
                    voice_channel_id: row.get(1)?,
                    dj_role_id: row.get(2)?,
                    volume: volume.max(0) as u32,
                    default_playlist: row.get(4)?,
                    repeat_mode: RepeatMode::parse(&repeat).unwrap_or_default(),
                    prefix: row.get(6)?,
                })
            })
            .optional()?;

        Ok(settings.unwrap_or_else(|| GuildSettings::new(guild_id)))
    }

    fn save_settings(&self, settings: &GuildSettings) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO guild_settings
                (guild_id, text_channel_id, voice_channel_id, dj_role_id, volume, default_playlist, repeat_mode, prefix, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))
             ON CONFLICT(guild_id) DO UPDATE SET
                text_channel_id = excluded.text_channel_id,
                voice_channel_id = excluded.voice_channel_id,
                dj_role_id = excluded.dj_role_id,
                volume = excluded.volume,
                default_playlist = excluded.default_playlist,
                repeat_mode = excluded.repeat_mode,
                prefix = excluded.prefix,
                updated_at = datetime('now')",
            params![
                settings.guild_id,
                settings.text_channel_id,
                settings.voice_channel_id,
                settings.dj_role_id,
                settings.volume as i64,
                settings.default_playlist,
                settings.repeat_mode.as_str(),
                settings.prefix,
            ],
        )?;
        Ok(())
    }

    fn remove_settings(&self, guild_id: &str) -> Result<bool, StorageError> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM guild_settings WHERE guild_id = ?1", [guild_id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_guild_gets_defaults() {
        let manager = SettingsManager::in_memory().unwrap();
        let settings = manager.get_settings("g1").unwrap();
        assert_eq!(settings, GuildSettings::new("g1"));
        assert_eq!(manager.prefix("g1"), None);
        assert_eq!(manager.count().unwrap(), 0);
    }

    #[test]
    fn save_then_update_then_remove() {
        let manager = SettingsManager::in_memory().unwrap();
        let mut settings = GuildSettings::new("g1");
        settings.prefix = Some("?".to_string());
        settings.volume = 40;
        settings.repeat_mode = RepeatMode::Single;
        manager.save_settings(&settings).unwrap();

        assert_eq!(manager.get_settings("g1").unwrap(), settings);
        assert_eq!(manager.prefix("g1").as_deref(), Some("?"));

        settings.dj_role_id = Some("555".to_string());
        manager.save_settings(&settings).unwrap();
        assert_eq!(manager.get_settings("g1").unwrap().dj_role_id.as_deref(), Some("555"));
        assert_eq!(manager.count().unwrap(), 1);

        assert!(manager.remove_settings("g1").unwrap());
        assert!(!manager.remove_settings("g1").unwrap());
        assert_eq!(manager.get_settings("g1").unwrap(), GuildSettings::new("g1"));
    }
}
