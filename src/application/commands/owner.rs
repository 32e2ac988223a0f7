//! Owner commands

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use super::storage_failure;
use crate::application::errors::CommandError;
use crate::application::services::BotContext;
use crate::domain::entities::{Activity, Command, GatewayEvent, OnlineStatus, Presence};
use crate::domain::traits::{GatewaySession, ProfileEdit};

/// How long `shutdown` waits for a confirmation.
pub const CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);

fn owner(name: &str, description: &str) -> Command {
    Command::new(name).with_description(description).owner_only()
}

fn live_session(bot: &BotContext) -> Result<Arc<dyn GatewaySession>, CommandError> {
    bot.session()
        .cloned()
        .ok_or_else(|| CommandError::ExecutionFailed("not connected".to_string()))
}

fn uptime(bot: &BotContext) -> String {
    let secs = (Utc::now() - bot.started_at()).num_seconds().max(0);
    format!("{}h {}m {}s", secs / 3600, secs / 60 % 60, secs % 60)
}

pub fn autoplaylist(bot: Arc<BotContext>) -> Command {
    owner("autoplaylist", "sets the default playlist for the server")
        .with_usage("<name|NONE>")
        .with_handler(move |event| {
            let guild_id = event.guild_id()?;
            let name = event.args.trim();
            if name.is_empty() {
                return Err(CommandError::InvalidArgs("please include a playlist name or NONE".to_string()));
            }

            let store = bot.settings();
            let mut settings = store.get_settings(guild_id).map_err(storage_failure)?;
            let reply = if name.eq_ignore_ascii_case("none") {
                settings.default_playlist = None;
                event.success("Cleared the default playlist")
            } else {
                settings.default_playlist = Some(name.replace(' ', "_"));
                event.success(format!("The default playlist is now `{}`", name))
            };
            store.save_settings(&settings).map_err(storage_failure)?;
            Ok(reply)
        })
}

pub fn debug(bot: Arc<BotContext>) -> Command {
    owner("debug", "shows debug info")
        .allow_direct_messages()
        .with_handler(move |_event| {
            let config = bot.config();
            let mut info = String::from("```\nSystem Properties:");
            info.push_str(&format!("\n  version = {}", env!("CARGO_PKG_VERSION")));
            info.push_str(&format!("\n  os = {} {}", std::env::consts::OS, std::env::consts::ARCH));
            info.push_str(&format!("\n  uptime = {}", uptime(&bot)));
            info.push_str("\n\nConfig:");
            info.push_str(&format!("\n  location = {}", config.location));
            info.push_str(&format!("\n  owner = {}", config.owner_id));
            info.push_str(&format!("\n  prefix = {}", config.prefix));
            info.push_str(&format!("\n  altprefix = {}", config.alt_prefix.as_deref().unwrap_or("NONE")));
            info.push_str(&format!("\n  eval = {}", config.eval));
            if let Some(session) = bot.session() {
                let me = session.self_user();
                info.push_str("\n\nDiscord:");
                info.push_str(&format!("\n  id = {}", me.id));
                info.push_str(&format!("\n  guilds = {}", session.guild_count()));
                info.push_str(&format!("\n  status = {}", session.presence().status.key()));
            }
            info.push_str("\n```");
            Ok(info)
        })
}

pub fn playlist() -> Command {
    owner("playlist", "playlist management")
        .with_usage("<append|delete|make|setdefault|all>")
        .with_aliases(&["pl"])
        .with_handler(|event| Ok(event.warning("Playlists are not available on this bot.")))
}

pub fn setavatar(bot: Arc<BotContext>) -> Command {
    owner("setavatar", "sets the avatar of the bot")
        .with_usage("<url | attachment>")
        .allow_direct_messages()
        .with_async_handler(move |event| {
            let bot = bot.clone();
            async move {
                let url = match event.args.trim() {
                    "" => event.message.attachments.first().cloned().unwrap_or_default(),
                    arg => arg.to_string(),
                };
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(CommandError::InvalidArgs("please provide an image URL".to_string()));
                }
                let session = live_session(&bot)?;
                session
                    .edit_profile(ProfileEdit {
                        username: None,
                        avatar_url: Some(url),
                    })
                    .await
                    .map_err(|e| CommandError::ExecutionFailed(format!("could not set avatar: {}", e)))?;
                Ok(event.success("Successfully changed avatar."))
            }
        })
}

pub fn setgame(bot: Arc<BotContext>) -> Command {
    owner("setgame", "sets the game the bot is playing")
        .with_usage("[action] [game]")
        .allow_direct_messages()
        .with_handler(move |event| {
            let session = live_session(&bot)?;
            let activity = Activity::parse(&event.args);
            let reply = match &activity {
                Some(a) => event.success(format!("**{}** is now {}", session.self_user().display_name(), a)),
                None => event.success(format!("**{}** is no longer playing anything.", session.self_user().display_name())),
            };
            let status = session.presence().status;
            session
                .update_presence(Presence::new(status, activity))
                .map_err(|e| CommandError::ExecutionFailed(format!("could not set the game: {}", e)))?;
            Ok(reply)
        })
}

pub fn setname(bot: Arc<BotContext>) -> Command {
    owner("setname", "sets the name of the bot")
        .with_usage("<name>")
        .allow_direct_messages()
        .with_async_handler(move |event| {
            let bot = bot.clone();
            async move {
                let name = event.args.trim().to_string();
                let len = name.chars().count();
                if !(2..=32).contains(&len) {
                    return Err(CommandError::InvalidArgs("name must be between 2 and 32 characters".to_string()));
                }
                let session = live_session(&bot)?;
                let old = session.self_user().display_name();
                session
                    .edit_profile(ProfileEdit {
                        username: Some(name.clone()),
                        avatar_url: None,
                    })
                    .await
                    .map_err(|e| CommandError::ExecutionFailed(format!("could not set the name: {}", e)))?;
                Ok(event.success(format!("Name changed from `{}` to `{}`", old, name)))
            }
        })
}

pub fn setstatus(bot: Arc<BotContext>) -> Command {
    owner("setstatus", "sets the status the bot displays")
        .with_usage("<status>")
        .allow_direct_messages()
        .with_handler(move |event| {
            let status = OnlineStatus::from_key(&event.args);
            if status == OnlineStatus::Unknown {
                return Err(CommandError::InvalidArgs(
                    "please include one of: online, idle, dnd, invisible".to_string(),
                ));
            }
            let session = live_session(&bot)?;
            let current = session.presence();
            session
                .update_presence(Presence::new(status, current.activity))
                .map_err(|e| CommandError::ExecutionFailed(format!("could not set the status: {}", e)))?;
            Ok(event.success(format!("Set the status to `{}`", status.key().to_uppercase())))
        })
}

pub fn shutdown(bot: Arc<BotContext>) -> Command {
    owner("shutdown", "safely shuts down")
        .allow_direct_messages()
        .with_async_handler(move |event| {
            let bot = bot.clone();
            async move {
                let session = live_session(&bot)?;
                let channel = event.message.channel_id.clone();
                let author = event.author_id().map(str::to_string);

                session
                    .send_message(&channel, &event.warning("Are you sure you want to shut down? Reply `yes` to confirm."))
                    .await
                    .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;

                let confirm_channel = channel.clone();
                let confirmation = bot
                    .waiter()
                    .wait_for(
                        move |e| match e {
                            GatewayEvent::MessageCreate(m) => {
                                m.channel_id == confirm_channel
                                    && m.sender.as_ref().map(|u| &u.id) == author.as_ref()
                            }
                            _ => false,
                        },
                        Some(CONFIRM_TIMEOUT),
                    )
                    .await;

                let confirmed = matches!(
                    &confirmation,
                    Some(GatewayEvent::MessageCreate(m))
                        if m.content.text().map(|t| t.trim().eq_ignore_ascii_case("yes")).unwrap_or(false)
                );
                if !confirmed {
                    return Ok(event.warning("Shutdown cancelled."));
                }

                if let Err(e) = session.send_message(&channel, &event.warning("Shutting down...")).await {
                    tracing::warn!("Failed to announce shutdown: {}", e);
                }
                bot.shutdown();
                Ok(String::new())
            }
        })
}

/// Evaluate a read-only expression against the running bot.
fn evaluate(bot: &BotContext, expression: &str) -> Result<String, String> {
    let config = bot.config();
    let session = bot.session();
    let value = match expression.trim() {
        "guilds" => session.map(|s| s.guild_count().to_string()).unwrap_or_else(|| "0".to_string()),
        "uptime" => uptime(bot),
        "prefix" => config.prefix.clone(),
        "owner" => config.owner_id.to_string(),
        "version" => env!("CARGO_PKG_VERSION").to_string(),
        "config.location" => config.location.clone(),
        "session" => match session {
            Some(s) => s.self_user().to_string(),
            None => "null".to_string(),
        },
        "presence" => match session {
            Some(s) => s.presence().to_json().to_string(),
            None => "null".to_string(),
        },
        "" => return Err("nothing to evaluate".to_string()),
        other => return Err(format!("unknown expression `{}`", other)),
    };
    Ok(value)
}

pub fn eval(bot: Arc<BotContext>) -> Command {
    owner("eval", "evaluates an expression against the running bot")
        .with_usage("<expression>")
        .allow_direct_messages()
        .with_handler(move |event| {
            Ok(match evaluate(&bot, &event.args) {
                Ok(value) => event.success(format!("Evaluated successfully:\n```\n{}\n```", value)),
                Err(e) => event.error(format!("An exception was thrown:\n```\n{}\n```", e)),
            })
        })
}
