//! Session bootstrap - one attempt to open the gateway session

use std::sync::Arc;

use super::presence::{login_status, PresenceSelection};
use crate::application::errors::{BotError, SessionError};
use crate::domain::entities::{CacheFlag, Intents, OnlineStatus, Permissions, SessionConfig};
use crate::domain::traits::{EventListener, GatewayClient, GatewaySession};

/// Gateway intents requested by every session of this process.
pub const INTENTS: Intents = Intents::DIRECT_MESSAGES
    .union(Intents::GUILD_MESSAGES)
    .union(Intents::GUILD_MESSAGE_REACTIONS)
    .union(Intents::GUILD_VOICE_STATES);

/// Permissions requested by the invite link.
pub const RECOMMENDED_PERMISSIONS: Permissions = Permissions::VIEW_CHANNEL
    .union(Permissions::SEND_MESSAGES)
    .union(Permissions::READ_MESSAGE_HISTORY)
    .union(Permissions::ADD_REACTIONS)
    .union(Permissions::EMBED_LINKS)
    .union(Permissions::ATTACH_FILES)
    .union(Permissions::MANAGE_MESSAGES)
    .union(Permissions::USE_EXTERNAL_EMOJIS)
    .union(Permissions::MANAGE_CHANNELS)
    .union(Permissions::CONNECT)
    .union(Permissions::SPEAK)
    .union(Permissions::CHANGE_NICKNAME);

pub const ENABLED_CACHE: [CacheFlag; 2] = [CacheFlag::MemberOverrides, CacheFlag::VoiceState];

pub const DISABLED_CACHE: [CacheFlag; 4] = [
    CacheFlag::Activity,
    CacheFlag::ClientStatus,
    CacheFlag::Emote,
    CacheFlag::OnlineStatus,
];

pub fn invite_url(client_id: &str) -> String {
    format!(
        "https://discord.com/oauth2/authorize?client_id={}&scope=bot&permissions={}",
        client_id,
        RECOMMENDED_PERMISSIONS.bits()
    )
}

/// Result of the single session-establishment attempt.
pub enum BootstrapOutcome {
    Success(Arc<dyn GatewaySession>),
    /// The platform rejected the token.
    AuthFailure(String),
    /// Some construction input was malformed; carries the failure text.
    ArgFailure(String),
}

impl std::fmt::Debug for BootstrapOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BootstrapOutcome::Success(_) => f.write_str("Success"),
            BootstrapOutcome::AuthFailure(d) => f.debug_tuple("AuthFailure").field(d).finish(),
            BootstrapOutcome::ArgFailure(d) => f.debug_tuple("ArgFailure").field(d).finish(),
        }
    }
}

pub fn auth_failure_message(location: &str) -> String {
    format!(
        "Please make sure you are editing the correct config file, and that you have used the \
         correct token (not the 'secret'!)\nConfig Location: {}",
        location
    )
}

pub fn arg_failure_message(detail: &str, location: &str) -> String {
    format!(
        "Some aspect of the configuration is invalid: {}\nConfig Location: {}",
        detail, location
    )
}

/// Session inputs: fixed intents and cache lists, the loading presence
/// and the login status derived from the configured one.
pub fn session_config(token: &str, selection: &PresenceSelection, configured: OnlineStatus) -> SessionConfig {
    SessionConfig {
        token: token.to_string(),
        intents: INTENTS,
        enabled_cache: ENABLED_CACHE.to_vec(),
        disabled_cache: DISABLED_CACHE.to_vec(),
        activity: selection.loading_activity(),
        status: login_status(configured),
        split_bulk_deletes: true,
    }
}

/// Open the session. Authentication and argument failures come back as
/// outcomes; anything else is an error for the caller to surface.
pub async fn bootstrap(
    client: &dyn GatewayClient,
    config: SessionConfig,
    listeners: Vec<Arc<dyn EventListener>>,
) -> Result<BootstrapOutcome, BotError> {
    match client.connect(config, listeners).await {
        Ok(session) => Ok(BootstrapOutcome::Success(session)),
        Err(e @ SessionError::Authentication(_)) => Ok(BootstrapOutcome::AuthFailure(e.to_string())),
        Err(e @ SessionError::InvalidArgument(_)) => Ok(BootstrapOutcome::ArgFailure(e.to_string())),
        Err(SessionError::Other(e)) => Err(e),
    }
}
