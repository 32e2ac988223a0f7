use chrono::Utc;
use std::sync::Arc;

use crate::application::services::BotContext;
use crate::domain::entities::{Category, Command};

pub fn ping() -> Command {
    Command::new("ping")
        .with_description("checks the bot's latency")
        .with_aliases(&["pong"])
        .with_category(Category::General)
        .allow_direct_messages()
        .with_handler(|event| {
            let latency = (Utc::now() - event.message.timestamp).num_milliseconds().max(0);
            Ok(format!("Pong! {}ms", latency))
        })
}

pub fn settings(bot: Arc<BotContext>) -> Command {
    Command::new("settings")
        .with_description("shows the bot's settings")
        .with_aliases(&["status"])
        .with_category(Category::General)
        .with_handler(move |event| {
            let guild_id = event.guild_id()?;
            let settings = bot
                .settings()
                .get_settings(guild_id)
                .map_err(super::storage_failure)?;
            let mention = |id: &Option<String>, fmt: &str| {
                id.as_ref()
                    .map(|id| fmt.replace("{}", id))
                    .unwrap_or_else(|| "Any".to_string())
            };

            Ok(format!(
                "**Settings**\n\
                 Text Channel: {}\n\
                 Voice Channel: {}\n\
                 DJ Role: {}\n\
                 Custom Prefix: {}\n\
                 Repeat Mode: {}\n\
                 Default Playlist: {}\n\
                 Volume: {}",
                mention(&settings.text_channel_id, "<#{}>"),
                mention(&settings.voice_channel_id, "<#{}>"),
                settings
                    .dj_role_id
                    .as_ref()
                    .map(|id| format!("<@&{}>", id))
                    .unwrap_or_else(|| "None".to_string()),
                settings.prefix.as_deref().unwrap_or("None"),
                settings.repeat_mode,
                settings.default_playlist.as_deref().unwrap_or("None"),
                settings.volume,
            ))
        })
}
