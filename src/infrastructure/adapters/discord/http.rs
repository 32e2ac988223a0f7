//! Discord REST calls used by a session

use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::application::errors::{BotError, SessionError};
use crate::domain::entities::User;

const API_BASE: &str = "https://discord.com/api/v10";

/// Longest message body the API accepts, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// User object as returned by the API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WireUser {
    pub id: String,
    pub username: Option<String>,
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        User {
            id: wire.id,
            username: wire.username,
            global_name: wire.global_name,
            is_bot: wire.bot,
        }
    }
}

/// Authenticated REST client
pub struct DiscordHttp {
    token: String,
    client: Client,
}

impl DiscordHttp {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", API_BASE, path)
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Fetch the account behind the token. A 401 means the token was rejected.
    pub async fn current_user(&self) -> Result<User, SessionError> {
        let response = self
            .client
            .get(self.api_url("/users/@me"))
            .header("Authorization", self.auth())
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(SessionError::Authentication(StatusCode::UNAUTHORIZED.to_string())),
            status if !status.is_success() => {
                Err(BotError::Network(format!("Discord API error: {}", status)).into())
            }
            _ => {
                let user: WireUser = response
                    .json()
                    .await
                    .map_err(|e| BotError::Parse(e.to_string()))?;
                Ok(user.into())
            }
        }
    }

    /// Post a message, returning its id.
    pub async fn create_message(&self, channel_id: &str, text: &str) -> Result<String, BotError> {
        #[derive(Serialize)]
        struct CreateMessage<'a> {
            content: &'a str,
        }

        #[derive(Deserialize)]
        struct Created {
            id: String,
        }

        let content = truncate(text, MAX_MESSAGE_LENGTH);
        let response = self
            .client
            .post(self.api_url(&format!("/channels/{}/messages", channel_id)))
            .header("Authorization", self.auth())
            .json(&CreateMessage { content })
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!("Discord API error: {}", response.status())));
        }

        let created: Created = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;
        Ok(created.id)
    }

    pub async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), BotError> {
        let response = self
            .client
            .delete(self.api_url(&format!("/channels/{}/messages/{}", channel_id, message_id)))
            .header("Authorization", self.auth())
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        // Already gone is as good as deleted.
        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(BotError::Network(format!("Discord API error: {}", response.status())))
        }
    }

    /// Change the bot's username and/or avatar (a `data:` URI).
    pub async fn modify_current_user(&self, username: Option<&str>, avatar: Option<&str>) -> Result<User, BotError> {
        #[derive(Serialize)]
        struct ModifyUser<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            username: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            avatar: Option<&'a str>,
        }

        let response = self
            .client
            .patch(self.api_url("/users/@me"))
            .header("Authorization", self.auth())
            .json(&ModifyUser { username, avatar })
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::Network(format!("Discord API error: {} {}", status, body)));
        }

        let user: WireUser = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;
        Ok(user.into())
    }

    /// Download an image and encode it as a `data:` URI for upload.
    pub async fn image_data_uri(&self, url: &str) -> Result<String, BotError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!("Image download failed: {}", response.status())));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(BotError::Parse(format!("Not an image: {}", content_type)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;
        Ok(data_uri(&content_type, &bytes))
    }
}

pub fn data_uri(content_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        content_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Cut `text` to at most `max` characters on a char boundary.
pub fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("short", 2000), "short");
        let long = "🎶".repeat(2100);
        assert_eq!(truncate(&long, MAX_MESSAGE_LENGTH).chars().count(), 2000);
    }

    #[test]
    fn encodes_images_as_data_uris() {
        assert_eq!(data_uri("image/png", b"abc"), "data:image/png;base64,YWJj");
    }

    #[test]
    fn wire_user_maps_to_domain_user() {
        let wire: WireUser =
            serde_json::from_str(r#"{"id":"42","username":"encore","global_name":null,"bot":true}"#).unwrap();
        let user = User::from(wire);
        assert_eq!(user.id, "42");
        assert!(user.is_bot);
        assert_eq!(user.display_name(), "encore");
    }
}
