//! Music commands. Audio playback is not wired in, so every command
//! reports the empty player state.

use crate::application::errors::CommandError;
use crate::domain::entities::{Category, Command, CommandEvent, CommandResult};

const NOTHING_PLAYING: &str = "There is no music playing!";
const NO_PLAYER: &str = "Audio playback is not available on this bot.";

fn music(name: &str, description: &str) -> Command {
    Command::new(name)
        .with_description(description)
        .with_category(Category::Music)
}

fn nothing_playing(event: CommandEvent) -> CommandResult {
    event.guild_id()?;
    Ok(event.warning(NOTHING_PLAYING))
}

fn needs_query(event: CommandEvent) -> CommandResult {
    if event.args.trim().is_empty() {
        return Err(CommandError::InvalidArgs("please include a query".to_string()));
    }
    Ok(event.error(NO_PLAYER))
}

pub fn lyrics() -> Command {
    music("lyrics", "shows the lyrics of a song")
        .with_usage("[song name]")
        .with_handler(|event| {
            if event.args.trim().is_empty() {
                nothing_playing(event)
            } else {
                Ok(event.error(format!("Lyrics for `{}` could not be found!", event.args.trim())))
            }
        })
}

pub fn nowplaying() -> Command {
    music("nowplaying", "shows the song that is currently playing")
        .with_aliases(&["np", "current"])
        .with_handler(nothing_playing)
}

pub fn play() -> Command {
    music("play", "plays the provided song")
        .with_usage("<title|URL|subcommand>")
        .with_handler(needs_query)
}

pub fn playlists() -> Command {
    music("playlists", "shows the available playlists")
        .with_aliases(&["pls"])
        .with_handler(|event| Ok(event.warning("There are no playlists available!")))
}

pub fn queue() -> Command {
    music("queue", "shows the current queue")
        .with_usage("[pagenum]")
        .with_aliases(&["list"])
        .with_handler(|event| Ok(event.warning("There is no music in the queue!")))
}

pub fn remove() -> Command {
    music("remove", "removes a song from the queue")
        .with_usage("<position|ALL>")
        .with_aliases(&["delete"])
        .with_handler(|event| Ok(event.error("There is nothing in the queue!")))
}

pub fn search() -> Command {
    music("search", "searches Youtube for a provided query")
        .with_usage("<query>")
        .with_aliases(&["ytsearch"])
        .with_handler(needs_query)
}

pub fn scsearch() -> Command {
    music("scsearch", "searches Soundcloud for a provided query")
        .with_usage("<query>")
        .with_handler(needs_query)
}

pub fn shuffle() -> Command {
    music("shuffle", "shuffles songs you have added")
        .with_handler(|event| Ok(event.error("You don't have any music in the queue to shuffle!")))
}

pub fn skip() -> Command {
    music("skip", "votes to skip the current song")
        .with_aliases(&["voteskip"])
        .with_handler(nothing_playing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::test_support::event;

    #[tokio::test]
    async fn reports_empty_player() {
        let reply = nowplaying().handler.as_ref().unwrap().call(event("")).await.unwrap();
        assert_eq!(reply, "W There is no music playing!");
    }

    #[tokio::test]
    async fn play_requires_a_query() {
        let handler = play().handler.unwrap();
        assert!(matches!(handler.call(event("  ")).await, Err(CommandError::InvalidArgs(_))));
        assert!(handler.call(event("never gonna")).await.unwrap().starts_with("E "));
    }
}
