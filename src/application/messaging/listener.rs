//! Primary listener - lifecycle bookkeeping outside of commands

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::services::bootstrap::invite_url;
use crate::application::services::BotContext;
use crate::domain::entities::GatewayEvent;
use crate::domain::traits::{EventListener, GatewaySession};

pub struct Listener {
    bot: Arc<BotContext>,
}

impl Listener {
    pub fn new(bot: Arc<BotContext>) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl EventListener for Listener {
    async fn on_event(&self, _session: &Arc<dyn GatewaySession>, event: &GatewayEvent) {
        match event {
            GatewayEvent::Ready { user, guild_ids } => {
                tracing::info!("Logged in as {} ({})", user, user.id);
                if guild_ids.is_empty() {
                    tracing::warn!(
                        "This bot is not on any guilds! Use the following link to add the bot to your guilds!\n{}",
                        invite_url(&user.id)
                    );
                } else {
                    tracing::info!("Serving {} guilds", guild_ids.len());
                }
            }
            GatewayEvent::GuildCreate { guild_id, name } => {
                tracing::debug!("Guild available: {} ({})", name.as_deref().unwrap_or("?"), guild_id);
            }
            GatewayEvent::GuildDelete { guild_id, unavailable } => {
                // An outage is not a removal; keep settings until we are kicked.
                if *unavailable {
                    return;
                }
                match self.bot.settings().remove_settings(guild_id) {
                    Ok(true) => tracing::info!("Removed settings for departed guild {}", guild_id),
                    Ok(false) => {}
                    Err(e) => tracing::warn!("Failed to remove settings for {}: {}", guild_id, e),
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::bot_context::test_support;
    use crate::application::services::test_session::FakeSession;
    use crate::domain::entities::GuildSettings;

    #[tokio::test]
    async fn guild_removal_clears_settings_but_outages_do_not() {
        let bot = test_support::bot();
        let mut guild = GuildSettings::new("g1");
        guild.prefix = Some("?".to_string());
        bot.settings().save_settings(&guild).unwrap();
        let listener = Listener::new(bot.clone());
        let session: Arc<dyn GatewaySession> = Arc::new(FakeSession::new());

        let outage = GatewayEvent::GuildDelete { guild_id: "g1".to_string(), unavailable: true };
        listener.on_event(&session, &outage).await;
        assert_eq!(bot.settings().prefix("g1").as_deref(), Some("?"));

        let kicked = GatewayEvent::GuildDelete { guild_id: "g1".to_string(), unavailable: false };
        listener.on_event(&session, &kicked).await;
        assert_eq!(bot.settings().prefix("g1"), None);
    }
}
