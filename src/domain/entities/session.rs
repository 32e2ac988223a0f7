//! Inputs for building a gateway session

use bitflags::bitflags;
use std::collections::BTreeSet;

use super::presence::{Activity, OnlineStatus, Presence};
use crate::application::errors::SessionError;

bitflags! {
    /// Gateway intents: which event groups the platform sends us.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Intents: u64 {
        const GUILDS = 1 << 0;
        const GUILD_MEMBERS = 1 << 1;
        const GUILD_EMOJIS = 1 << 3;
        const GUILD_VOICE_STATES = 1 << 7;
        const GUILD_PRESENCES = 1 << 8;
        const GUILD_MESSAGES = 1 << 9;
        const GUILD_MESSAGE_REACTIONS = 1 << 10;
        const DIRECT_MESSAGES = 1 << 12;
        const MESSAGE_CONTENT = 1 << 15;
    }
}

bitflags! {
    /// Channel permissions, used to build the invite link.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u64 {
        const MANAGE_CHANNELS = 1 << 4;
        const ADD_REACTIONS = 1 << 6;
        const VIEW_CHANNEL = 1 << 10;
        const SEND_MESSAGES = 1 << 11;
        const MANAGE_MESSAGES = 1 << 13;
        const EMBED_LINKS = 1 << 14;
        const ATTACH_FILES = 1 << 15;
        const READ_MESSAGE_HISTORY = 1 << 16;
        const USE_EXTERNAL_EMOJIS = 1 << 18;
        const CONNECT = 1 << 20;
        const SPEAK = 1 << 21;
        const CHANGE_NICKNAME = 1 << 26;
    }
}

/// Client-side caches the session may keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheFlag {
    Activity,
    ClientStatus,
    Emote,
    MemberOverrides,
    OnlineStatus,
    VoiceState,
}

impl CacheFlag {
    /// Intent the platform must deliver for this cache to be fillable.
    pub fn required_intent(&self) -> Option<Intents> {
        match self {
            CacheFlag::Activity | CacheFlag::ClientStatus | CacheFlag::OnlineStatus => {
                Some(Intents::GUILD_PRESENCES)
            }
            CacheFlag::Emote => Some(Intents::GUILD_EMOJIS),
            CacheFlag::VoiceState => Some(Intents::GUILD_VOICE_STATES),
            CacheFlag::MemberOverrides => None,
        }
    }
}

/// Everything a gateway client needs to open a session, filled in field
/// by field and checked once by [`SessionConfig::finalize`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub token: String,
    pub intents: Intents,
    pub enabled_cache: Vec<CacheFlag>,
    pub disabled_cache: Vec<CacheFlag>,
    /// Activity shown while logging in.
    pub activity: Option<Activity>,
    pub status: OnlineStatus,
    pub split_bulk_deletes: bool,
}

/// A validated [`SessionConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSpec {
    pub token: String,
    /// Intents as sent on the wire; always includes `GUILDS`.
    pub intents: Intents,
    pub cache: BTreeSet<CacheFlag>,
    pub presence: Presence,
    pub split_bulk_deletes: bool,
}

impl SessionConfig {
    pub fn new(token: impl Into<String>, intents: Intents) -> Self {
        Self {
            token: token.into(),
            intents,
            enabled_cache: Vec::new(),
            disabled_cache: Vec::new(),
            activity: None,
            status: OnlineStatus::Online,
            split_bulk_deletes: true,
        }
    }

    pub fn finalize(self) -> Result<SessionSpec, SessionError> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err(SessionError::InvalidArgument("Token may not be empty".to_string()));
        }
        if token.chars().any(char::is_whitespace) {
            return Err(SessionError::InvalidArgument(
                "Token may not contain whitespace".to_string(),
            ));
        }
        if self.intents.is_empty() {
            return Err(SessionError::InvalidArgument(
                "At least one gateway intent is required".to_string(),
            ));
        }

        let mut cache = BTreeSet::new();
        for flag in &self.enabled_cache {
            if self.disabled_cache.contains(flag) {
                return Err(SessionError::InvalidArgument(format!(
                    "Cache flag {:?} cannot be both enabled and disabled",
                    flag
                )));
            }
            if let Some(intent) = flag.required_intent() {
                if !self.intents.contains(intent) {
                    return Err(SessionError::InvalidArgument(format!(
                        "Cannot enable cache flag {:?} without intent {:?}",
                        flag, intent
                    )));
                }
            }
            cache.insert(*flag);
        }

        let status = match self.status {
            OnlineStatus::Unknown => {
                return Err(SessionError::InvalidArgument(
                    "Cannot request the UNKNOWN status".to_string(),
                ))
            }
            other => other,
        };

        Ok(SessionSpec {
            token: token.to_string(),
            intents: self.intents | Intents::GUILDS,
            cache,
            presence: Presence::new(status, self.activity),
            split_bulk_deletes: self.split_bulk_deletes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig::new("abc.def.ghi", Intents::GUILD_MESSAGES | Intents::GUILD_VOICE_STATES)
    }

    #[test]
    fn finalize_adds_guilds_intent() {
        let spec = config().finalize().unwrap();
        assert!(spec.intents.contains(Intents::GUILDS));
        assert!(spec.intents.contains(Intents::GUILD_MESSAGES));
        assert!(spec.split_bulk_deletes);
    }

    #[test]
    fn blank_or_spaced_tokens_are_rejected() {
        let mut blank = config();
        blank.token = "   ".to_string();
        assert!(matches!(blank.finalize(), Err(SessionError::InvalidArgument(_))));

        let mut spaced = config();
        spaced.token = "abc def".to_string();
        assert!(matches!(spaced.finalize(), Err(SessionError::InvalidArgument(_))));
    }

    #[test]
    fn empty_intents_are_rejected() {
        let mut cfg = config();
        cfg.intents = Intents::empty();
        assert!(matches!(cfg.finalize(), Err(SessionError::InvalidArgument(_))));
    }

    #[test]
    fn conflicting_cache_flags_are_rejected() {
        let mut cfg = config();
        cfg.enabled_cache = vec![CacheFlag::VoiceState];
        cfg.disabled_cache = vec![CacheFlag::VoiceState];
        let err = cfg.finalize().unwrap_err();
        assert!(err.to_string().contains("VoiceState"));
    }

    #[test]
    fn cache_flag_needs_its_intent() {
        let mut cfg = config();
        cfg.enabled_cache = vec![CacheFlag::Activity];
        assert!(matches!(cfg.finalize(), Err(SessionError::InvalidArgument(_))));

        let mut cfg = config();
        cfg.enabled_cache = vec![CacheFlag::MemberOverrides, CacheFlag::VoiceState];
        let spec = cfg.finalize().unwrap();
        assert_eq!(spec.cache.len(), 2);
    }
}
