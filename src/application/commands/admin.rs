//! Guild administration commands: per-guild prefix and channel/role bindings

use std::sync::Arc;

use super::{parse_id, storage_failure};
use crate::application::errors::CommandError;
use crate::application::services::BotContext;
use crate::domain::entities::{Category, Command, GuildSettings};

fn admin(name: &str, description: &str) -> Command {
    Command::new(name)
        .with_description(description)
        .with_category(Category::Admin)
}

/// Load, modify and save the invoking guild's settings.
fn update(
    bot: &BotContext,
    guild_id: &str,
    change: impl FnOnce(&mut GuildSettings),
) -> Result<(), CommandError> {
    let store = bot.settings();
    let mut settings = store.get_settings(guild_id).map_err(storage_failure)?;
    change(&mut settings);
    store.save_settings(&settings).map_err(storage_failure)
}

pub fn prefix(bot: Arc<BotContext>) -> Command {
    admin("prefix", "sets a server-specific prefix")
        .with_usage("<prefix|NONE>")
        .with_aliases(&["setprefix"])
        .with_handler(move |event| {
            let guild_id = event.guild_id()?;
            let arg = event.args.trim();
            if arg.is_empty() {
                return Err(CommandError::InvalidArgs("please include a prefix or NONE".to_string()));
            }

            if arg.eq_ignore_ascii_case("none") {
                update(&bot, guild_id, |s| s.prefix = None)?;
                return Ok(event.success("Prefix cleared."));
            }
            update(&bot, guild_id, |s| s.prefix = Some(arg.to_string()))?;
            Ok(event.success(format!("Custom prefix set to `{}`", arg)))
        })
}

pub fn setdj(bot: Arc<BotContext>) -> Command {
    admin("setdj", "sets the DJ role for certain music commands")
        .with_usage("<rolename|NONE>")
        .with_handler(move |event| {
            let guild_id = event.guild_id()?;
            let role = parse_id(&event.args)?;
            let reply = match &role {
                Some(id) => event.success(format!("DJ commands can now be used by users with the <@&{}> role.", id)),
                None => event.success("DJ role cleared; only Admins can use the DJ commands."),
            };
            update(&bot, guild_id, |s| s.dj_role_id = role)?;
            Ok(reply)
        })
}

pub fn settc(bot: Arc<BotContext>) -> Command {
    admin("settc", "sets the text channel for music commands")
        .with_usage("<channel|NONE>")
        .with_handler(move |event| {
            let guild_id = event.guild_id()?;
            let channel = parse_id(&event.args)?;
            let reply = match &channel {
                Some(id) => event.success(format!("Music commands can now only be used in <#{}>", id)),
                None => event.success("Music commands can now be used in any channel"),
            };
            update(&bot, guild_id, |s| s.text_channel_id = channel)?;
            Ok(reply)
        })
}

pub fn setvc(bot: Arc<BotContext>) -> Command {
    admin("setvc", "sets the voice channel for playing music")
        .with_usage("<channel|NONE>")
        .with_handler(move |event| {
            let guild_id = event.guild_id()?;
            let channel = parse_id(&event.args)?;
            let reply = match &channel {
                Some(id) => event.success(format!("Music can now only be played in <#{}>", id)),
                None => event.success("Music can now be played in any channel"),
            };
            update(&bot, guild_id, |s| s.voice_channel_id = channel)?;
            Ok(reply)
        })
}
