//! Initial presence selection

use crate::domain::entities::{Activity, OnlineStatus, PresenceDirective};
use crate::infrastructure::config::Config;

/// Activity shown while the session is logging in.
pub const LOADING_ACTIVITY: &str = "loading...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceSelection {
    /// `None` leaves the platform default in place.
    pub status: Option<OnlineStatus>,
    pub directive: PresenceDirective,
    pub no_activity: bool,
}

impl PresenceSelection {
    /// Pre-login activity: a fixed placeholder unless activity is suppressed.
    pub fn loading_activity(&self) -> Option<Activity> {
        (!self.no_activity).then(|| Activity::playing(LOADING_ACTIVITY))
    }
}

pub fn select_presence(config: &Config) -> PresenceSelection {
    let status = match config.status {
        OnlineStatus::Unknown => None,
        other => Some(other),
    };

    let (directive, no_activity) = match &config.game {
        None => (PresenceDirective::UseDefault, false),
        Some(game) if game.is_none_sentinel() => (PresenceDirective::Suppress, true),
        Some(game) => (PresenceDirective::Explicit(game.clone()), false),
    };

    PresenceSelection {
        status,
        directive,
        no_activity,
    }
}

/// Status requested while logging in: hidden bots stay hidden, everyone
/// else shows as do-not-disturb until ready.
pub fn login_status(configured: OnlineStatus) -> OnlineStatus {
    match configured {
        OnlineStatus::Invisible | OnlineStatus::Offline => OnlineStatus::Invisible,
        _ => OnlineStatus::DoNotDisturb,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::bot_context::test_support;

    fn with(status: OnlineStatus, game: Option<Activity>) -> Config {
        Config {
            status,
            game,
            ..test_support::config()
        }
    }

    #[test]
    fn absent_activity_uses_default() {
        let selection = select_presence(&with(OnlineStatus::Online, None));
        assert_eq!(selection.directive, PresenceDirective::UseDefault);
        assert!(!selection.no_activity);
        assert_eq!(selection.status, Some(OnlineStatus::Online));
        assert_eq!(selection.loading_activity(), Some(Activity::playing("loading...")));
    }

    #[test]
    fn none_in_any_casing_suppresses() {
        for name in ["NONE", "none", "NoNe"] {
            let selection = select_presence(&with(OnlineStatus::Idle, Some(Activity::playing(name))));
            assert_eq!(selection.directive, PresenceDirective::Suppress);
            assert!(selection.no_activity);
            assert_eq!(selection.loading_activity(), None);
        }
    }

    #[test]
    fn other_activities_are_explicit() {
        let game = Activity::watching("the charts");
        let selection = select_presence(&with(OnlineStatus::Online, Some(game.clone())));
        assert_eq!(selection.directive, PresenceDirective::Explicit(game));
        assert!(!selection.no_activity);
    }

    #[test]
    fn unknown_status_is_left_unset() {
        let selection = select_presence(&with(OnlineStatus::Unknown, None));
        assert_eq!(selection.status, None);
    }

    #[test]
    fn login_status_hides_or_goes_dnd() {
        assert_eq!(login_status(OnlineStatus::Invisible), OnlineStatus::Invisible);
        assert_eq!(login_status(OnlineStatus::Offline), OnlineStatus::Invisible);
        for status in [
            OnlineStatus::Online,
            OnlineStatus::Idle,
            OnlineStatus::DoNotDisturb,
            OnlineStatus::Unknown,
        ] {
            assert_eq!(login_status(status), OnlineStatus::DoNotDisturb);
        }
    }
}
