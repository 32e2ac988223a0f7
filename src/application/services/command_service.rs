//! Command client - the immutable command dispatcher attached to a session

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::application::errors::{CommandError, ConfigError};
use crate::application::messaging::{LinkedCache, MessageParser};
use crate::domain::entities::{
    Activity, Category, Command, CommandEvent, CommandRegistry, CommandResult, Content, Emojis,
    GatewayEvent, Message, OnlineStatus, Presence, PresenceDirective, User,
};
use crate::domain::traits::{EventListener, GatewaySession, SettingsStore};

/// How many invoking messages are tracked for reply cleanup.
pub const LINKED_CACHE_SIZE: usize = 200;

/// Settings for a [`CommandClient`], filled field by field and checked by
/// [`CommandClientConfig::finalize`].
pub struct CommandClientConfig {
    pub prefix: Option<String>,
    pub alt_prefix: Option<String>,
    pub owner_id: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
    pub error: Option<String>,
    pub help_word: Option<String>,
    pub linked_cache_size: usize,
    pub settings: Option<Arc<dyn SettingsStore>>,
    pub status: Option<OnlineStatus>,
    pub directive: PresenceDirective,
    commands: CommandRegistry,
}

impl Default for CommandClientConfig {
    fn default() -> Self {
        Self {
            prefix: None,
            alt_prefix: None,
            owner_id: None,
            success: None,
            warning: None,
            error: None,
            help_word: None,
            linked_cache_size: LINKED_CACHE_SIZE,
            settings: None,
            status: None,
            directive: PresenceDirective::UseDefault,
            commands: CommandRegistry::new(),
        }
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(ConfigError::InvalidValue(format!("{} may not be blank", field))),
        None => Err(ConfigError::MissingField(field.to_string())),
    }
}

impl CommandClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_command(&mut self, command: Command) {
        self.commands.register(command);
    }

    pub fn add_commands(&mut self, commands: impl IntoIterator<Item = Command>) {
        for command in commands {
            self.commands.register(command);
        }
    }

    pub fn finalize(self) -> Result<CommandClient, ConfigError> {
        let prefix = required(self.prefix, "prefix")?;
        let alt_prefix = match self.alt_prefix {
            Some(p) if p.trim().is_empty() => {
                return Err(ConfigError::InvalidValue("alternate prefix may not be blank".to_string()))
            }
            other => other,
        };

        let owner_id = required(self.owner_id, "owner id")?;
        if !owner_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::InvalidValue(format!("owner id is not numeric: {}", owner_id)));
        }

        let emojis = Emojis {
            success: required(self.success, "success emoji")?,
            warning: required(self.warning, "warning emoji")?,
            error: required(self.error, "error emoji")?,
        };

        let help_word = required(self.help_word, "help word")?;
        if help_word.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidValue(format!("help word contains whitespace: {:?}", help_word)));
        }

        if self.linked_cache_size == 0 {
            return Err(ConfigError::InvalidValue("linked cache size must be positive".to_string()));
        }

        let settings = self
            .settings
            .ok_or_else(|| ConfigError::MissingField("settings manager".to_string()))?;

        Ok(CommandClient {
            parser: MessageParser::new(prefix, alt_prefix),
            owner_id,
            emojis,
            help_word,
            settings,
            status: self.status,
            directive: self.directive,
            commands: self.commands,
            linked: Mutex::new(LinkedCache::new(self.linked_cache_size)),
        })
    }
}

/// Routes incoming messages to commands and applies the ready presence
pub struct CommandClient {
    parser: MessageParser,
    owner_id: String,
    emojis: Emojis,
    help_word: String,
    settings: Arc<dyn SettingsStore>,
    status: Option<OnlineStatus>,
    directive: PresenceDirective,
    commands: CommandRegistry,
    linked: Mutex<LinkedCache>,
}

impl CommandClient {
    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn directive(&self) -> &PresenceDirective {
        &self.directive
    }

    /// The prefix as users should type it.
    fn text_prefix(&self, me: &User) -> String {
        match self.parser.prefix() {
            Some(prefix) => prefix.to_string(),
            None => format!("@{} ", me.display_name()),
        }
    }

    /// Presence applied once the session is ready.
    pub fn ready_presence(&self, me: &User) -> Presence {
        let activity = match &self.directive {
            PresenceDirective::UseDefault => {
                Some(Activity::playing(format!("Type {}{}", self.text_prefix(me), self.help_word)))
            }
            PresenceDirective::Suppress => None,
            PresenceDirective::Explicit(activity) => Some(activity.clone()),
        };
        Presence::new(self.status.unwrap_or(OnlineStatus::Online), activity)
    }

    fn help_text(&self, me: &User, is_owner: bool) -> String {
        let prefix = self.text_prefix(me);
        let mut help = format!("**{}** commands:\n", me.display_name());
        let mut current: Option<Category> = None;
        for cmd in self.commands.all() {
            if cmd.owner_only && !is_owner {
                continue;
            }
            if current != Some(cmd.category) {
                current = Some(cmd.category);
                help.push_str(&format!("\n__{}__\n", cmd.category.title()));
            }
            help.push_str(&format!("`{}{}", prefix, cmd.name));
            if let Some(usage) = &cmd.usage {
                help.push_str(&format!(" {}", usage));
            }
            help.push_str(&format!("` - {}\n", cmd.description.as_deref().unwrap_or("")));
        }
        help.push_str(&format!("\nFor additional help, contact <@{}>", self.owner_id));
        help
    }

    async fn run(&self, command: &Command, message: &Message, args: String, is_owner: bool) -> CommandResult {
        if command.owner_only && !is_owner {
            return Err(CommandError::OwnerOnly);
        }
        if command.guild_only && message.is_direct() {
            return Err(CommandError::GuildOnly);
        }
        let Some(handler) = &command.handler else {
            return Ok(format!("{} `{}` is not available", self.emojis.warning, command.name));
        };

        let message = Message {
            content: Content::Command {
                name: command.name.clone(),
                args: args.clone(),
            },
            ..message.clone()
        };
        handler
            .call(CommandEvent {
                message,
                args,
                emojis: self.emojis.clone(),
                is_owner,
            })
            .await
    }

    pub async fn handle_message(&self, session: &Arc<dyn GatewaySession>, message: &Message) {
        if message.is_from_bot() {
            return;
        }
        let Some(text) = message.content.text() else {
            return;
        };

        let me = session.self_user();
        let guild_prefix = message.guild_id.as_deref().and_then(|g| self.settings.prefix(g));
        let Some(invocation) = self.parser.parse(text, &me.mentions(), guild_prefix.as_deref()) else {
            return;
        };

        let is_owner = message
            .sender
            .as_ref()
            .map(|u| u.id == self.owner_id)
            .unwrap_or(false);

        let response = if invocation.name.eq_ignore_ascii_case(&self.help_word) {
            self.help_text(&me, is_owner)
        } else {
            let Some(command) = self.commands.find(&invocation.name) else {
                return;
            };
            tracing::debug!("[{}] {} {}", message.channel_id, command.name, invocation.args);
            match self.run(command, message, invocation.args, is_owner).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!("Command {} failed: {}", command.name, e);
                    format!("{} {}", self.emojis.error, e)
                }
            }
        };

        if response.is_empty() {
            return;
        }
        match session.send_message(&message.channel_id, &response).await {
            Ok(reply_id) => {
                if let Ok(mut linked) = self.linked.lock() {
                    linked.link(&message.id, &message.channel_id, &reply_id);
                }
            }
            Err(e) => tracing::warn!("Failed to send reply in {}: {}", message.channel_id, e),
        }
    }

    async fn handle_delete(&self, session: &Arc<dyn GatewaySession>, message_id: &str) {
        let replies = match self.linked.lock() {
            Ok(mut linked) => linked.take(message_id),
            Err(_) => return,
        };
        for (channel_id, reply_id) in replies {
            if let Err(e) = session.delete_message(&channel_id, &reply_id).await {
                tracing::debug!("Failed to delete linked reply {}: {}", reply_id, e);
            }
        }
    }
}

#[async_trait]
impl EventListener for CommandClient {
    async fn on_event(&self, session: &Arc<dyn GatewaySession>, event: &GatewayEvent) {
        match event {
            GatewayEvent::Ready { user, .. } => {
                if let Err(e) = session.update_presence(self.ready_presence(user)) {
                    tracing::warn!("Failed to apply presence: {}", e);
                }
            }
            GatewayEvent::MessageCreate(message) => self.handle_message(session, message).await,
            GatewayEvent::MessageDelete { message_id, .. } => self.handle_delete(session, message_id).await,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_session::FakeSession;
    use crate::domain::entities::GuildSettings;
    use crate::infrastructure::database::SettingsManager;

    fn base_config(settings: Arc<dyn SettingsStore>) -> CommandClientConfig {
        let mut cfg = CommandClientConfig::new();
        cfg.prefix = Some("!".to_string());
        cfg.owner_id = Some("1000".to_string());
        cfg.success = Some("✅".to_string());
        cfg.warning = Some("⚠".to_string());
        cfg.error = Some("❌".to_string());
        cfg.help_word = Some("help".to_string());
        cfg.settings = Some(settings);
        cfg.add_command(Command::new("ping").with_description("pong").with_handler(|e| Ok(e.success("Pong"))));
        cfg.add_command(
            Command::new("stop")
                .owner_only()
                .with_description("stop the bot")
                .with_handler(|e| Ok(e.success("stopping"))),
        );
        cfg
    }

    fn settings() -> Arc<SettingsManager> {
        Arc::new(SettingsManager::in_memory().unwrap())
    }

    fn from(user: &str, text: &str) -> Message {
        Message::from_text("chan", text)
            .with_id(format!("msg-{}", text.len()))
            .with_guild("g1")
            .with_sender(User::new(user))
    }

    fn session() -> (Arc<FakeSession>, Arc<dyn GatewaySession>) {
        let fake = Arc::new(FakeSession::new());
        let dyn_session: Arc<dyn GatewaySession> = fake.clone();
        (fake, dyn_session)
    }

    #[test]
    fn finalize_rejects_malformed_settings() {
        let mut cfg = base_config(settings());
        cfg.prefix = Some(String::new());
        assert!(cfg.finalize().is_err());

        let mut cfg = base_config(settings());
        cfg.owner_id = Some("12ab".to_string());
        assert!(matches!(cfg.finalize(), Err(ConfigError::InvalidValue(_))));

        let mut cfg = base_config(settings());
        cfg.help_word = Some("get help".to_string());
        assert!(cfg.finalize().is_err());

        let mut cfg = base_config(settings());
        cfg.warning = Some(" ".to_string());
        assert!(cfg.finalize().is_err());

        let mut cfg = base_config(settings());
        cfg.settings = None;
        assert!(matches!(cfg.finalize(), Err(ConfigError::MissingField(_))));

        let mut cfg = base_config(settings());
        cfg.linked_cache_size = 0;
        assert!(cfg.finalize().is_err());
    }

    #[test]
    fn ready_presence_follows_directive() {
        let me = User::new("42").with_username("encore");

        let client = base_config(settings()).finalize().unwrap();
        let presence = client.ready_presence(&me);
        assert_eq!(presence.status, OnlineStatus::Online);
        assert_eq!(presence.activity, Some(Activity::playing("Type !help")));

        let mut cfg = base_config(settings());
        cfg.directive = PresenceDirective::Suppress;
        cfg.status = Some(OnlineStatus::Idle);
        let presence = cfg.finalize().unwrap().ready_presence(&me);
        assert_eq!(presence, Presence::new(OnlineStatus::Idle, None));

        let mut cfg = base_config(settings());
        cfg.directive = PresenceDirective::Explicit(Activity::listening("jazz"));
        let presence = cfg.finalize().unwrap().ready_presence(&me);
        assert_eq!(presence.activity, Some(Activity::listening("jazz")));
    }

    #[tokio::test]
    async fn ready_event_updates_presence() {
        let client = base_config(settings()).finalize().unwrap();
        let (fake, session) = session();
        let ready = GatewayEvent::Ready { user: session.self_user(), guild_ids: vec![] };
        client.on_event(&session, &ready).await;
        assert_eq!(fake.presences.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dispatches_commands_and_ignores_bots() {
        let client = base_config(settings()).finalize().unwrap();
        let (fake, session) = session();

        client.handle_message(&session, &from("7", "!ping")).await;
        client.handle_message(&session, &from("7", "just chatting")).await;
        client.handle_message(&session, &from("7", "!unknown")).await;
        let bot_msg = Message::from_text("chan", "!ping").with_sender(User::new("9").bot());
        client.handle_message(&session, &bot_msg).await;

        assert_eq!(fake.texts(), vec!["✅ Pong".to_string()]);
    }

    #[tokio::test]
    async fn owner_only_commands_are_refused_for_others() {
        let client = base_config(settings()).finalize().unwrap();
        let (fake, session) = session();

        client.handle_message(&session, &from("7", "!stop")).await;
        client.handle_message(&session, &from("1000", "!stop")).await;

        let texts = fake.texts();
        assert!(texts[0].starts_with("❌"));
        assert_eq!(texts[1], "✅ stopping");
    }

    #[tokio::test]
    async fn guild_only_commands_fail_in_direct_messages() {
        let client = base_config(settings()).finalize().unwrap();
        let (fake, session) = session();
        let dm = Message::from_text("dm", "!ping").with_sender(User::new("7"));
        client.handle_message(&session, &dm).await;
        assert!(fake.texts()[0].contains("direct messages"));
    }

    #[tokio::test]
    async fn help_lists_commands_by_category() {
        let client = base_config(settings()).finalize().unwrap();
        let (fake, session) = session();

        client.handle_message(&session, &from("7", "!help")).await;
        client.handle_message(&session, &from("1000", "!help")).await;

        let texts = fake.texts();
        assert!(texts[0].contains("`!ping` - pong"));
        assert!(!texts[0].contains("stop"));
        assert!(texts[1].contains("__Owner__"));
        assert!(texts[1].contains("<@1000>"));
    }

    #[tokio::test]
    async fn help_word_matches_regardless_of_case() {
        let mut cfg = base_config(settings());
        cfg.help_word = Some("Help".to_string());
        let client = cfg.finalize().unwrap();
        let (fake, session) = session();

        client.handle_message(&session, &from("7", "!Help")).await;
        client.handle_message(&session, &from("7", "!HELP")).await;

        let texts = fake.texts();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("`!ping` - pong"));
    }

    #[tokio::test]
    async fn command_handlers_see_the_invocation() {
        let mut cfg = base_config(settings());
        cfg.add_command(Command::new("echo").with_handler(|e| match &e.message.content {
            Content::Command { name, args } => Ok(format!("{}:{}", name, args)),
            _ => Ok("plain".to_string()),
        }));
        let client = cfg.finalize().unwrap();
        let (fake, session) = session();

        let msg = from("7", "!ECHO one two");
        client.handle_message(&session, &msg).await;

        assert_eq!(fake.texts(), vec!["echo:one two".to_string()]);
        assert_eq!(msg.content.text(), Some("!ECHO one two"));
    }

    #[tokio::test]
    async fn guild_prefix_and_mentions_work() {
        let store = settings();
        let mut guild = GuildSettings::new("g1");
        guild.prefix = Some("?".to_string());
        store.save_settings(&guild).unwrap();

        let client = base_config(store).finalize().unwrap();
        let (fake, session) = session();

        client.handle_message(&session, &from("7", "?ping")).await;
        client.handle_message(&session, &from("7", "<@42> ping")).await;
        assert_eq!(fake.texts().len(), 2);
    }

    #[tokio::test]
    async fn deleting_the_command_deletes_the_reply() {
        let client = base_config(settings()).finalize().unwrap();
        let (fake, session) = session();

        let msg = from("7", "!ping");
        client.handle_message(&session, &msg).await;
        let delete = GatewayEvent::MessageDelete {
            channel_id: "chan".to_string(),
            message_id: msg.id.clone(),
            guild_id: Some("g1".to_string()),
        };
        client.on_event(&session, &delete).await;
        client.on_event(&session, &delete).await;

        let deleted = fake.deleted.lock().unwrap().clone();
        assert_eq!(deleted, vec![("chan".to_string(), "reply-1".to_string())]);
    }
}
