//! Message parser - Splits prefixed text into a command name and arguments

use crate::infrastructure::config::MENTION_PREFIX;

/// A command name and its raw argument string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub args: String,
}

/// Recognises the configured prefixes at the start of a message
#[derive(Debug, Clone)]
pub struct MessageParser {
    prefix: Option<String>,
    alt_prefix: Option<String>,
}

impl MessageParser {
    /// `@mention` as the prefix means only mentions trigger commands.
    pub fn new(prefix: impl Into<String>, alt_prefix: Option<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: (prefix != MENTION_PREFIX).then_some(prefix),
            alt_prefix,
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Parse `text`, also accepting the given bot mentions and a guild prefix.
    pub fn parse(&self, text: &str, mentions: &[String], guild_prefix: Option<&str>) -> Option<Invocation> {
        let text = text.trim_start();

        let rest = mentions
            .iter()
            .find_map(|m| text.strip_prefix(m.as_str()))
            .or_else(|| self.prefix.as_deref().and_then(|p| text.strip_prefix(p)))
            .or_else(|| self.alt_prefix.as_deref().and_then(|p| text.strip_prefix(p)))
            .or_else(|| guild_prefix.and_then(|p| text.strip_prefix(p)))?;

        let rest = rest.trim_start();
        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().filter(|n| !n.is_empty())?;
        let args = parts.next().unwrap_or("").trim();

        Some(Invocation {
            name: name.to_lowercase(),
            args: args.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mentions() -> Vec<String> {
        vec!["<@42>".to_string(), "<@!42>".to_string()]
    }

    #[test]
    fn parses_prefix_and_alt_prefix() {
        let parser = MessageParser::new("!", Some("~".to_string()));
        assert_eq!(
            parser.parse("!play some song", &[], None),
            Some(Invocation { name: "play".to_string(), args: "some song".to_string() })
        );
        assert_eq!(parser.parse("~SKIP", &[], None).unwrap().name, "skip");
        assert_eq!(parser.parse("hello there", &[], None), None);
        assert_eq!(parser.parse("!", &[], None), None);
    }

    #[test]
    fn mention_prefix_only_accepts_mentions() {
        let parser = MessageParser::new(MENTION_PREFIX, None);
        assert_eq!(parser.prefix(), None);
        assert_eq!(parser.parse("@mention ping", &mentions(), None), None);
        assert_eq!(parser.parse("<@!42> ping", &mentions(), None).unwrap().name, "ping");
        assert_eq!(parser.parse("<@42>   queue  2 ", &mentions(), None).unwrap().args, "2");
    }

    #[test]
    fn guild_prefix_is_accepted() {
        let parser = MessageParser::new("!", None);
        assert_eq!(parser.parse("?volume 50", &[], Some("?")).unwrap().args, "50");
        assert_eq!(parser.parse("?volume 50", &[], None), None);
    }
}
