//! DJ commands

use std::sync::Arc;

use super::storage_failure;
use crate::application::errors::CommandError;
use crate::application::services::BotContext;
use crate::domain::entities::{Category, Command, CommandEvent, CommandResult, RepeatMode, MAX_VOLUME};

fn dj(name: &str, description: &str) -> Command {
    Command::new(name)
        .with_description(description)
        .with_category(Category::Dj)
}

fn nothing_playing(event: CommandEvent) -> CommandResult {
    event.guild_id()?;
    Ok(event.warning("There is no music playing!"))
}

pub fn forceremove() -> Command {
    dj("forceremove", "removes all entries by a user from the queue")
        .with_usage("<user>")
        .with_aliases(&["forcedelete", "modremove", "moddelete"])
        .with_handler(|event| Ok(event.error("There is nothing in the queue!")))
}

pub fn forceskip() -> Command {
    dj("forceskip", "skips the current song")
        .with_aliases(&["modskip"])
        .with_handler(nothing_playing)
}

pub fn movetrack() -> Command {
    dj("movetrack", "move a track in the current queue to a different position")
        .with_usage("<from> <to>")
        .with_aliases(&["move"])
        .with_handler(|event| {
            let positions: Vec<&str> = event.args.split_whitespace().collect();
            if positions.len() != 2 || positions.iter().any(|p| p.parse::<usize>().is_err()) {
                return Err(CommandError::InvalidArgs("please include two valid indexes".to_string()));
            }
            Ok(event.error("There is nothing in the queue!"))
        })
}

pub fn pause() -> Command {
    dj("pause", "pauses the current song").with_handler(nothing_playing)
}

pub fn playnext() -> Command {
    dj("playnext", "plays a single song next")
        .with_usage("<title|URL>")
        .with_handler(|event| {
            if event.args.trim().is_empty() {
                return Err(CommandError::InvalidArgs("please include a song title or URL".to_string()));
            }
            Ok(event.error("Audio playback is not available on this bot."))
        })
}

pub fn repeat(bot: Arc<BotContext>) -> Command {
    dj("repeat", "re-adds music to the queue when finished")
        .with_usage("[off|all|single]")
        .with_handler(move |event| {
            let guild_id = event.guild_id()?;
            let store = bot.settings();
            let mut settings = store.get_settings(guild_id).map_err(storage_failure)?;

            let mode = if event.args.trim().is_empty() {
                match settings.repeat_mode {
                    RepeatMode::Off => RepeatMode::All,
                    _ => RepeatMode::Off,
                }
            } else {
                RepeatMode::parse(&event.args).ok_or_else(|| {
                    CommandError::InvalidArgs("valid options are `off`, `all` or `single`".to_string())
                })?
            };

            settings.repeat_mode = mode;
            store.save_settings(&settings).map_err(storage_failure)?;
            Ok(event.success(format!("Repeat mode is now `{}`", mode)))
        })
}

pub fn skipto() -> Command {
    dj("skipto", "skips to the specified song")
        .with_usage("<position>")
        .with_aliases(&["jumpto"])
        .with_handler(|event| {
            if event.args.trim().parse::<usize>().is_err() {
                return Err(CommandError::InvalidArgs(format!(
                    "`{}` is not a valid integer!",
                    event.args.trim()
                )));
            }
            nothing_playing(event)
        })
}

pub fn stop() -> Command {
    dj("stop", "stops the current song and clears the queue")
        .with_handler(|event| Ok(event.success("The player has stopped and the queue has been cleared.")))
}

pub fn volume(bot: Arc<BotContext>) -> Command {
    dj("volume", "sets or shows volume")
        .with_usage("[0-150]")
        .with_aliases(&["vol"])
        .with_handler(move |event| {
            let guild_id = event.guild_id()?;
            let store = bot.settings();
            let mut settings = store.get_settings(guild_id).map_err(storage_failure)?;

            let arg = event.args.trim();
            if arg.is_empty() {
                return Ok(format!("Current volume is `{}`", settings.volume));
            }
            let volume = arg
                .parse::<u32>()
                .ok()
                .filter(|v| *v <= MAX_VOLUME)
                .ok_or_else(|| CommandError::InvalidArgs(format!("volume must be an integer between 0 and {}", MAX_VOLUME)))?;

            let previous = settings.volume;
            settings.volume = volume;
            store.save_settings(&settings).map_err(storage_failure)?;
            Ok(event.success(format!("Volume changed from `{}` to `{}`", previous, volume)))
        })
}
