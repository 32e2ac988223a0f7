use std::future::Future;
use std::pin::Pin;

use crate::application::errors::CommandError;
use crate::domain::entities::Message;

/// Grouping used by the help listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    General,
    Music,
    Dj,
    Admin,
    Owner,
}

impl Category {
    pub fn title(&self) -> &'static str {
        match self {
            Category::General => "General",
            Category::Music => "Music",
            Category::Dj => "DJ",
            Category::Admin => "Admin",
            Category::Owner => "Owner",
        }
    }
}

/// Reply decorations shared by every command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emojis {
    pub success: String,
    pub warning: String,
    pub error: String,
}

/// A parsed invocation handed to a command handler
#[derive(Debug, Clone)]
pub struct CommandEvent {
    pub message: Message,
    pub args: String,
    pub emojis: Emojis,
    pub is_owner: bool,
}

impl CommandEvent {
    pub fn success(&self, text: impl AsRef<str>) -> String {
        format!("{} {}", self.emojis.success, text.as_ref())
    }

    pub fn warning(&self, text: impl AsRef<str>) -> String {
        format!("{} {}", self.emojis.warning, text.as_ref())
    }

    pub fn error(&self, text: impl AsRef<str>) -> String {
        format!("{} {}", self.emojis.error, text.as_ref())
    }

    pub fn guild_id(&self) -> Result<&str, CommandError> {
        self.message.guild_id.as_deref().ok_or(CommandError::GuildOnly)
    }

    pub fn author_id(&self) -> Option<&str> {
        self.message.sender.as_ref().map(|u| u.id.as_str())
    }
}

pub type CommandResult = Result<String, CommandError>;
pub type HandlerFuture = Pin<Box<dyn Future<Output = CommandResult> + Send>>;

/// Command handler function type
pub enum CommandHandler {
    Sync(Box<dyn Fn(CommandEvent) -> CommandResult + Send + Sync>),
    Async(Box<dyn Fn(CommandEvent) -> HandlerFuture + Send + Sync>),
}

impl CommandHandler {
    pub async fn call(&self, event: CommandEvent) -> CommandResult {
        match self {
            CommandHandler::Sync(handler) => handler(event),
            CommandHandler::Async(handler) => handler(event).await,
        }
    }
}

/// Represents a bot command
pub struct Command {
    pub name: String,
    pub description: Option<String>,
    pub aliases: Vec<String>,
    pub usage: Option<String>,
    pub category: Category,
    pub owner_only: bool,
    pub guild_only: bool,
    pub handler: Option<CommandHandler>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            aliases: Vec::new(),
            usage: None,
            category: Category::General,
            owner_only: false,
            guild_only: true,
            handler: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn owner_only(mut self) -> Self {
        self.owner_only = true;
        self.category = Category::Owner;
        self
    }

    pub fn allow_direct_messages(mut self) -> Self {
        self.guild_only = false;
        self
    }

    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(CommandEvent) -> CommandResult + Send + Sync + 'static,
    {
        self.handler = Some(CommandHandler::Sync(Box::new(handler)));
        self
    }

    pub fn with_async_handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(CommandEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CommandResult> + Send + 'static,
    {
        self.handler = Some(CommandHandler::Async(Box::new(move |event| {
            Box::pin(handler(event))
        })));
        self
    }

    pub fn matches(&self, input: &str) -> bool {
        self.name.eq_ignore_ascii_case(input)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(input))
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("owner_only", &self.owner_only)
            .finish()
    }
}

/// Commands in registration order
#[derive(Default, Debug)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// First command whose name or alias matches, in registration order.
    pub fn find(&self, input: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.matches(input))
    }

    pub fn all(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
