use async_trait::async_trait;
use std::sync::Arc;

use crate::application::errors::{BotError, SessionError};
use crate::domain::entities::{GatewayEvent, Presence, SessionConfig, User};

/// Gateway client - builds live sessions on a messaging platform
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Log in and open a session, attaching `listeners` in order.
    ///
    /// Resolves once the platform has accepted the identification, so this
    /// suspends for as long as the remote handshake takes.
    async fn connect(
        &self,
        config: SessionConfig,
        listeners: Vec<Arc<dyn EventListener>>,
    ) -> Result<Arc<dyn GatewaySession>, SessionError>;
}

/// A live connection handle shared with commands and listeners
#[async_trait]
pub trait GatewaySession: Send + Sync {
    /// The account this session is logged in as.
    fn self_user(&self) -> User;

    /// Number of guilds the bot is currently in.
    fn guild_count(&self) -> usize;

    /// Send a text message, returning the new message id.
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError>;

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), BotError>;

    /// The presence most recently requested.
    fn presence(&self) -> Presence;

    /// Queue a presence update on the gateway.
    fn update_presence(&self, presence: Presence) -> Result<(), BotError>;

    /// Change the bot account's username and/or avatar.
    async fn edit_profile(&self, edit: ProfileEdit) -> Result<(), BotError>;

    /// Close the connection. Safe to call more than once.
    fn shutdown(&self);

    /// Resolves when the connection has ended for good.
    async fn closed(&self);
}

/// Receives every event of a session, in attachment order
#[async_trait]
pub trait EventListener: Send + Sync {
    async fn on_event(&self, session: &Arc<dyn GatewaySession>, event: &GatewayEvent);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileEdit {
    pub username: Option<String>,
    /// Image URL to download and upload as the new avatar.
    pub avatar_url: Option<String>,
}
