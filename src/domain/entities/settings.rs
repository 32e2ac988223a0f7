use std::fmt;

/// Queue repeat behaviour stored per guild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    Single,
}

impl RepeatMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "off" | "false" => Some(RepeatMode::Off),
            "all" | "on" | "true" => Some(RepeatMode::All),
            "one" | "single" => Some(RepeatMode::Single),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatMode::Off => "off",
            RepeatMode::All => "all",
            RepeatMode::Single => "single",
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_VOLUME: u32 = 100;
pub const MAX_VOLUME: u32 = 150;

/// Per-guild settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildSettings {
    pub guild_id: String,
    pub text_channel_id: Option<String>,
    pub voice_channel_id: Option<String>,
    pub dj_role_id: Option<String>,
    pub volume: u32,
    pub default_playlist: Option<String>,
    pub repeat_mode: RepeatMode,
    pub prefix: Option<String>,
}

impl GuildSettings {
    pub fn new(guild_id: impl Into<String>) -> Self {
        Self {
            guild_id: guild_id.into(),
            text_channel_id: None,
            voice_channel_id: None,
            dj_role_id: None,
            volume: DEFAULT_VOLUME,
            default_playlist: None,
            repeat_mode: RepeatMode::Off,
            prefix: None,
        }
    }
}
