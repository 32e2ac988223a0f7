//! Chat messages as seen by listeners and commands

use super::User;
use chrono::{DateTime, Utc};

/// Message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    /// A recognised invocation, filled in by the dispatcher.
    Command { name: String, args: String },
    /// No text: attachment-only, or withheld by the gateway.
    Empty,
}

impl Content {
    pub fn text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A message in a guild channel or a direct message
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    /// `None` for direct messages.
    pub guild_id: Option<String>,
    pub sender: Option<User>,
    pub content: Content,
    /// URLs of attached files, in upload order.
    pub attachments: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub raw: Option<serde_json::Value>,
}

impl Message {
    pub fn new(channel_id: impl Into<String>, content: Content) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            channel_id: channel_id.into(),
            guild_id: None,
            sender: None,
            content,
            attachments: Vec::new(),
            timestamp: Utc::now(),
            raw: None,
        }
    }

    pub fn from_text(channel_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(channel_id, Content::Text(text.into()))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn with_sender(mut self, user: User) -> Self {
        self.sender = Some(user);
        self
    }

    pub fn with_attachment(mut self, url: impl Into<String>) -> Self {
        self.attachments.push(url.into());
        self
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }

    pub fn is_from_bot(&self) -> bool {
        self.sender.as_ref().map(|u| u.is_bot).unwrap_or(false)
    }

    pub fn is_direct(&self) -> bool {
        self.guild_id.is_none()
    }
}
