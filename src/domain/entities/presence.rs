//! Presence: online status and the activity line shown under the bot's name

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Online status as configured and as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OnlineStatus {
    Online,
    Idle,
    DoNotDisturb,
    Invisible,
    Offline,
    /// Unrecognised or unspecified; leaves the platform default in place.
    Unknown,
}

impl OnlineStatus {
    /// Parse a status key case-insensitively. Anything unrecognised is `Unknown`.
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_lowercase().as_str() {
            "online" => OnlineStatus::Online,
            "idle" => OnlineStatus::Idle,
            "dnd" | "do_not_disturb" | "donotdisturb" => OnlineStatus::DoNotDisturb,
            "invisible" => OnlineStatus::Invisible,
            "offline" => OnlineStatus::Offline,
            _ => OnlineStatus::Unknown,
        }
    }

    /// Gateway key for this status.
    pub fn key(&self) -> &'static str {
        match self {
            OnlineStatus::Online => "online",
            OnlineStatus::Idle => "idle",
            OnlineStatus::DoNotDisturb => "dnd",
            OnlineStatus::Invisible => "invisible",
            OnlineStatus::Offline => "offline",
            OnlineStatus::Unknown => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    Playing,
    Streaming,
    Listening,
    Watching,
    Competing,
}

impl ActivityKind {
    fn wire_type(&self) -> u8 {
        match self {
            ActivityKind::Playing => 0,
            ActivityKind::Streaming => 1,
            ActivityKind::Listening => 2,
            ActivityKind::Watching => 3,
            ActivityKind::Competing => 5,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            ActivityKind::Playing => "Playing",
            ActivityKind::Streaming => "Streaming",
            ActivityKind::Listening => "Listening to",
            ActivityKind::Watching => "Watching",
            ActivityKind::Competing => "Competing in",
        }
    }
}

/// Zero-width space; the platform rejects empty activity names.
const EMPTY_NAME: &str = "\u{200B}";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub name: String,
    pub url: Option<String>,
}

impl Activity {
    fn of(kind: ActivityKind, name: &str) -> Self {
        let name = name.trim();
        Self {
            kind,
            name: if name.is_empty() { EMPTY_NAME.to_string() } else { name.to_string() },
            url: None,
        }
    }

    pub fn playing(name: impl AsRef<str>) -> Self {
        Self::of(ActivityKind::Playing, name.as_ref())
    }

    pub fn listening(name: impl AsRef<str>) -> Self {
        Self::of(ActivityKind::Listening, name.as_ref())
    }

    pub fn watching(name: impl AsRef<str>) -> Self {
        Self::of(ActivityKind::Watching, name.as_ref())
    }

    pub fn competing(name: impl AsRef<str>) -> Self {
        Self::of(ActivityKind::Competing, name.as_ref())
    }

    pub fn streaming(name: impl AsRef<str>, url: impl Into<String>) -> Self {
        let mut activity = Self::of(ActivityKind::Streaming, name.as_ref());
        activity.url = Some(url.into());
        activity
    }

    /// Parse a human-written activity line such as `listening to lofi` or
    /// `streaming someuser Late night set`. Blank or `default` yields `None`;
    /// text without a known verb is treated as a game being played.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() || text.eq_ignore_ascii_case("default") {
            return None;
        }
        let lower = text.to_lowercase();
        let rest = |verb: &str| text[verb.len()..].trim();

        let activity = if lower.starts_with("playing") {
            Activity::playing(rest("playing"))
        } else if lower.starts_with("listening to") {
            Activity::listening(rest("listening to"))
        } else if lower.starts_with("listening") {
            Activity::listening(rest("listening"))
        } else if lower.starts_with("watching") {
            Activity::watching(rest("watching"))
        } else if lower.starts_with("competing in") {
            Activity::competing(rest("competing in"))
        } else if lower.starts_with("competing") {
            Activity::competing(rest("competing"))
        } else if lower.starts_with("streaming") {
            let mut parts = rest("streaming").splitn(2, char::is_whitespace);
            match (parts.next(), parts.next()) {
                (Some(user), Some(title)) if !user.is_empty() => {
                    Activity::streaming(title, format!("https://twitch.tv/{}", user))
                }
                _ => Activity::playing(text),
            }
        } else {
            Activity::playing(text)
        };
        Some(activity)
    }

    /// Whether this activity is the "show nothing" sentinel.
    pub fn is_none_sentinel(&self) -> bool {
        self.name.eq_ignore_ascii_case("none")
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut value = json!({ "name": self.name, "type": self.kind.wire_type() });
        if let Some(url) = &self.url {
            value["url"] = json!(url);
        }
        value
    }
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind.verb(), self.name)
    }
}

/// How the initial activity is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceDirective {
    /// Let the command dispatcher pick its default ("Playing <prefix><help>").
    UseDefault,
    /// Show no activity at all.
    Suppress,
    Explicit(Activity),
}

/// A full presence update as sent over the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    pub status: OnlineStatus,
    pub activity: Option<Activity>,
}

impl Presence {
    pub fn new(status: OnlineStatus, activity: Option<Activity>) -> Self {
        Self { status, activity }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let status = match self.status {
            OnlineStatus::Unknown => OnlineStatus::Online.key(),
            other => other.key(),
        };
        json!({
            "since": null,
            "activities": self.activity.iter().map(Activity::to_json).collect::<Vec<_>>(),
            "status": status,
            "afk": false,
        })
    }
}
