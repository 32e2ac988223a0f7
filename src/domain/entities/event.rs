use super::{Message, User};

/// Events delivered to listeners once a session is running.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    Ready {
        user: User,
        guild_ids: Vec<String>,
    },
    MessageCreate(Message),
    MessageDelete {
        channel_id: String,
        message_id: String,
        guild_id: Option<String>,
    },
    /// Only emitted when bulk-delete splitting is disabled.
    MessageDeleteBulk {
        channel_id: String,
        message_ids: Vec<String>,
        guild_id: Option<String>,
    },
    ReactionAdd {
        channel_id: String,
        message_id: String,
        user_id: String,
        emoji: String,
    },
    GuildCreate {
        guild_id: String,
        name: Option<String>,
    },
    GuildDelete {
        guild_id: String,
        unavailable: bool,
    },
    VoiceStateUpdate {
        guild_id: Option<String>,
        user_id: String,
        channel_id: Option<String>,
    },
    /// Any dispatch we do not model, by name.
    Other(String),
}

impl GatewayEvent {
    pub fn name(&self) -> &str {
        match self {
            GatewayEvent::Ready { .. } => "READY",
            GatewayEvent::MessageCreate(_) => "MESSAGE_CREATE",
            GatewayEvent::MessageDelete { .. } => "MESSAGE_DELETE",
            GatewayEvent::MessageDeleteBulk { .. } => "MESSAGE_DELETE_BULK",
            GatewayEvent::ReactionAdd { .. } => "MESSAGE_REACTION_ADD",
            GatewayEvent::GuildCreate { .. } => "GUILD_CREATE",
            GatewayEvent::GuildDelete { .. } => "GUILD_DELETE",
            GatewayEvent::VoiceStateUpdate { .. } => "VOICE_STATE_UPDATE",
            GatewayEvent::Other(name) => name,
        }
    }
}
