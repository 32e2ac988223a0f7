//! The bot's command set, bound to the shared [`BotContext`]

use std::sync::Arc;

use crate::application::errors::CommandError;
use crate::application::services::BotContext;
use crate::domain::entities::Command;

pub mod admin;
pub mod dj;
pub mod general;
pub mod music;
pub mod owner;

pub use owner::eval;

/// Every unconditional command, in registration order.
pub fn standard(bot: &Arc<BotContext>) -> Vec<Command> {
    vec![
        general::ping(),
        general::settings(bot.clone()),
        music::lyrics(),
        music::nowplaying(),
        music::play(),
        music::playlists(),
        music::queue(),
        music::remove(),
        music::search(),
        music::scsearch(),
        music::shuffle(),
        music::skip(),
        dj::forceremove(),
        dj::forceskip(),
        dj::movetrack(),
        dj::pause(),
        dj::playnext(),
        dj::repeat(bot.clone()),
        dj::skipto(),
        dj::stop(),
        dj::volume(bot.clone()),
        admin::prefix(bot.clone()),
        admin::setdj(bot.clone()),
        admin::settc(bot.clone()),
        admin::setvc(bot.clone()),
        owner::autoplaylist(bot.clone()),
        owner::debug(bot.clone()),
        owner::playlist(),
        owner::setavatar(bot.clone()),
        owner::setgame(bot.clone()),
        owner::setname(bot.clone()),
        owner::setstatus(bot.clone()),
        owner::shutdown(bot.clone()),
    ]
}

/// Accepts `<#id>`, `<@&id>`, `<@id>` or a bare id; `none` clears.
pub(crate) fn parse_id(args: &str) -> Result<Option<String>, CommandError> {
    let arg = args.trim();
    if arg.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let id = arg
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim_start_matches(|c| matches!(c, '#' | '@' | '&' | '!'));
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Ok(Some(id.to_string()))
    } else {
        Err(CommandError::InvalidArgs(format!("`{}` is not a channel, role or id", arg)))
    }
}

fn storage_failure(e: impl std::fmt::Display) -> CommandError {
    CommandError::ExecutionFailed(format!("could not update settings: {}", e))
}
