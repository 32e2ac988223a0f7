//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::application::errors::ConfigError;
use crate::domain::entities::{Activity, OnlineStatus};

/// Placeholder shipped in the generated config file.
pub const TOKEN_PLACEHOLDER: &str = "BOT_TOKEN_HERE";

/// Prefix value meaning "respond to mentions only".
pub const MENTION_PREFIX: &str = "@mention";

/// On-disk configuration file
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConfigFile {
    pub token: Option<String>,
    pub owner: Option<i64>,
    pub prefix: String,
    pub alt_prefix: Option<String>,
    pub help: String,
    pub status: String,
    pub game: Option<String>,
    pub success: String,
    pub warning: String,
    pub error: String,
    pub eval: bool,
    pub settings_db: PathBuf,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            token: Some(TOKEN_PLACEHOLDER.to_string()),
            owner: Some(0),
            prefix: MENTION_PREFIX.to_string(),
            alt_prefix: Some("NONE".to_string()),
            help: "help".to_string(),
            status: "ONLINE".to_string(),
            game: Some("DEFAULT".to_string()),
            success: "🎶".to_string(),
            warning: "💡".to_string(),
            error: "🚫".to_string(),
            eval: false,
            settings_db: PathBuf::from("serversettings.db"),
        }
    }
}

/// Validated bot configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub token: String,
    pub owner_id: u64,
    pub prefix: String,
    pub alt_prefix: Option<String>,
    pub help: String,
    pub status: OnlineStatus,
    pub game: Option<Activity>,
    pub success: String,
    pub warning: String,
    pub error: String,
    pub eval: bool,
    pub settings_db: PathBuf,
    /// Where the configuration came from, for diagnostics.
    pub location: String,
}

impl Config {
    fn from_file(file: ConfigFile, location: String) -> Result<Self, ConfigError> {
        let token = file
            .token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && t != TOKEN_PLACEHOLDER)
            .ok_or_else(|| ConfigError::MissingField("token".to_string()))?;

        let owner_id = match file.owner {
            Some(id) if id > 0 => id as u64,
            Some(id) => {
                return Err(ConfigError::InvalidValue(format!(
                    "owner must be a valid user id, got {}",
                    id
                )))
            }
            None => return Err(ConfigError::MissingField("owner".to_string())),
        };

        if file.prefix.trim().is_empty() {
            return Err(ConfigError::InvalidValue("prefix may not be empty".to_string()));
        }

        let alt_prefix = file
            .alt_prefix
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty() && !p.eq_ignore_ascii_case("none"));

        Ok(Self {
            token,
            owner_id,
            prefix: file.prefix,
            alt_prefix,
            help: file.help,
            status: OnlineStatus::from_key(&file.status),
            game: file.game.as_deref().and_then(Activity::parse),
            success: file.success,
            warning: file.warning,
            error: file.error,
            eval: file.eval,
            settings_db: file.settings_db,
            location,
        })
    }
}

/// Loads configuration once and records whether it can be used.
///
/// Loading never fails outright: read, parse and validation problems all
/// leave the gate in the invalid state.
#[derive(Debug)]
pub struct ConfigGate {
    location: String,
    loaded: Result<Config, ConfigError>,
}

impl ConfigGate {
    /// Load `path`, applying the `BOT_TOKEN` / `BOT_PREFIX` environment
    /// overrides and then `token_override`.
    pub fn load(path: impl AsRef<Path>, token_override: Option<String>) -> Self {
        let path = path.as_ref();
        let location = std::fs::canonicalize(path)
            .unwrap_or_else(|_| path.to_path_buf())
            .display()
            .to_string();

        let loaded = Self::read(path).and_then(|mut file| {
            if let Ok(token) = std::env::var("BOT_TOKEN") {
                file.token = Some(token);
            }
            if let Ok(prefix) = std::env::var("BOT_PREFIX") {
                file.prefix = prefix;
            }
            if let Some(token) = token_override {
                file.token = Some(token);
            }
            Config::from_file(file, location.clone())
        });

        Self { location, loaded }
    }

    /// Build a gate around already-parsed file contents.
    pub fn from_file(file: ConfigFile, location: impl Into<String>) -> Self {
        let location = location.into();
        let loaded = Config::from_file(file, location.clone());
        Self { location, loaded }
    }

    fn read(path: &Path) -> Result<ConfigFile, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn is_valid(&self) -> bool {
        self.loaded.is_ok()
    }

    /// The configuration, only when it passed validation.
    pub fn config(&self) -> Option<&Config> {
        self.loaded.as_ref().ok()
    }

    pub fn problem(&self) -> Option<&ConfigError> {
        self.loaded.as_ref().err()
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

/// Default configuration rendered as YAML, for `init-config`.
pub fn default_yaml() -> Result<String, ConfigError> {
    serde_yaml::to_string(&ConfigFile::default())
        .map_err(|e| ConfigError::Parse(format!("Failed to render config: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_file() -> ConfigFile {
        ConfigFile {
            token: Some("abc.def.ghi".to_string()),
            owner: Some(1234),
            ..ConfigFile::default()
        }
    }

    fn write_temp(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("encore-config-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_are_not_usable() {
        let gate = ConfigGate::from_file(ConfigFile::default(), "defaults");
        assert!(!gate.is_valid());
        assert_eq!(gate.problem(), Some(&ConfigError::MissingField("token".to_string())));
    }

    #[test]
    fn owner_must_be_positive() {
        let gate = ConfigGate::from_file(ConfigFile { owner: Some(0), ..valid_file() }, "x");
        assert!(matches!(gate.problem(), Some(ConfigError::InvalidValue(_))));

        let gate = ConfigGate::from_file(ConfigFile { owner: None, ..valid_file() }, "x");
        assert!(matches!(gate.problem(), Some(ConfigError::MissingField(_))));
    }

    #[test]
    fn alt_prefix_none_is_dropped() {
        let gate = ConfigGate::from_file(valid_file(), "x");
        assert_eq!(gate.config().unwrap().alt_prefix, None);

        let gate = ConfigGate::from_file(
            ConfigFile { alt_prefix: Some("!".to_string()), ..valid_file() },
            "x",
        );
        assert_eq!(gate.config().unwrap().alt_prefix.as_deref(), Some("!"));
    }

    #[test]
    fn game_and_status_are_parsed() {
        let gate = ConfigGate::from_file(
            ConfigFile {
                game: Some("listening to lofi".to_string()),
                status: "idle".to_string(),
                ..valid_file()
            },
            "x",
        );
        let config = gate.config().unwrap();
        assert_eq!(config.game, Some(Activity::listening("lofi")));
        assert_eq!(config.status, OnlineStatus::Idle);

        let gate = ConfigGate::from_file(valid_file(), "x");
        assert_eq!(gate.config().unwrap().game, None);
    }

    #[test]
    fn load_reads_yaml_and_records_location() {
        let path = write_temp("token: abc.def.ghi\nowner: 99\nprefix: \"!\"\neval: true\n");
        let gate = ConfigGate::load(&path, None);
        let config = gate.config().expect("config should be valid");
        assert_eq!(config.owner_id, 99);
        assert_eq!(config.prefix, "!");
        assert!(config.eval);
        assert_eq!(config.help, "help");
        assert!(gate.location().ends_with(path.file_name().unwrap().to_str().unwrap()));
        assert_eq!(config.location, gate.location());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_or_broken_files_are_invalid_not_errors() {
        let gate = ConfigGate::load("/definitely/not/here.yaml", None);
        assert!(!gate.is_valid());
        assert_eq!(gate.location(), "/definitely/not/here.yaml");

        let path = write_temp("token: [unclosed");
        let gate = ConfigGate::load(&path, None);
        assert!(matches!(gate.problem(), Some(ConfigError::Parse(_))));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn token_override_wins() {
        let path = write_temp("owner: 5\n");
        let gate = ConfigGate::load(&path, Some("from.cli.flag".to_string()));
        assert_eq!(gate.config().map(|c| c.token.as_str()), Some("from.cli.flag"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn default_yaml_round_trips_through_loader() {
        let yaml = default_yaml().unwrap();
        assert!(yaml.contains("alt-prefix"));
        let path = write_temp(&yaml);
        let gate = ConfigGate::load(&path, None);
        // Shipped defaults carry the placeholder token.
        assert!(!gate.is_valid());
        std::fs::remove_file(path).ok();
    }
}
