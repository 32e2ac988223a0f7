//! Startup orchestration: config gate, command client, presence, session, hook

use std::future::Future;
use std::sync::Arc;

use super::bootstrap::{arg_failure_message, auth_failure_message, bootstrap, session_config, BootstrapOutcome};
use super::command_service::{CommandClient, CommandClientConfig};
use super::presence::{select_presence, PresenceSelection};
use super::shutdown::ShutdownHook;
use super::BotContext;
use crate::application::commands;
use crate::application::errors::{BotError, StorageError};
use crate::application::messaging::{EventWaiter, Listener};
use crate::domain::traits::{EventListener, GatewayClient, SettingsStore};
use crate::infrastructure::config::{Config, ConfigGate, MENTION_PREFIX};

/// Process exit status for authentication and argument failures.
pub const EXIT_BOOTSTRAP_FAILURE: u8 = 1;

pub enum StartupOutcome {
    /// The configuration was rejected; nothing was started.
    ConfigInvalid,
    Running {
        bot: Arc<BotContext>,
        hook: ShutdownHook,
    },
    Failed {
        exit_code: u8,
        diagnostic: String,
    },
}

impl std::fmt::Debug for StartupOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartupOutcome::ConfigInvalid => f.write_str("ConfigInvalid"),
            StartupOutcome::Running { .. } => f.write_str("Running"),
            StartupOutcome::Failed { exit_code, diagnostic } => f
                .debug_struct("Failed")
                .field("exit_code", exit_code)
                .field("diagnostic", diagnostic)
                .finish(),
        }
    }
}

/// Build the dispatcher: settings first, then the fixed command list and
/// `eval` when enabled.
pub fn build_command_client(
    config: &Config,
    bot: &Arc<BotContext>,
    selection: &PresenceSelection,
) -> Result<CommandClient, BotError> {
    let mut cfg = CommandClientConfig::new();
    cfg.prefix = Some(config.prefix.clone());
    cfg.alt_prefix = config.alt_prefix.clone();
    cfg.owner_id = Some(config.owner_id.to_string());
    cfg.success = Some(config.success.clone());
    cfg.warning = Some(config.warning.clone());
    cfg.error = Some(config.error.clone());
    cfg.help_word = Some(config.help.clone());
    cfg.settings = Some(bot.settings().clone());
    cfg.status = selection.status;
    cfg.directive = selection.directive.clone();

    cfg.add_commands(commands::standard(bot));
    if config.eval {
        cfg.add_command(commands::eval(bot.clone()));
    }

    Ok(cfg.finalize()?)
}

/// Run startup up to a live session.
///
/// An invalid configuration stops here without touching the settings store
/// or the gateway. Authentication and argument failures come back as
/// [`StartupOutcome::Failed`] with the operator diagnostic; any other failure
/// is an error.
pub async fn start<O, S>(
    gate: &ConfigGate,
    client: &dyn GatewayClient,
    open_settings: O,
    signal: S,
) -> Result<StartupOutcome, BotError>
where
    O: FnOnce(&Config) -> Result<Arc<dyn SettingsStore>, StorageError>,
    S: Future<Output = ()> + Send + 'static,
{
    let Some(config) = gate.config() else {
        tracing::info!(
            "Config at {} is not usable: {}",
            gate.location(),
            gate.problem().map(|p| p.to_string()).unwrap_or_default()
        );
        return Ok(StartupOutcome::ConfigInvalid);
    };

    let waiter = Arc::new(EventWaiter::new());
    let settings = open_settings(config)?;
    let bot = Arc::new(BotContext::new(config.clone(), settings, waiter.clone()));

    let selection = select_presence(config);
    let command_client = Arc::new(build_command_client(config, &bot, &selection)?);

    tracing::info!("Loaded config from {}", config.location);
    if config.prefix == MENTION_PREFIX {
        tracing::debug!("Commands are only accepted by mention");
    }
    tracing::debug!("Registered {} commands", command_client.commands().len());

    let session_cfg = session_config(&config.token, &selection, config.status);
    let listeners: Vec<Arc<dyn EventListener>> = vec![
        command_client,
        waiter,
        Arc::new(Listener::new(bot.clone())),
    ];

    match bootstrap(client, session_cfg, listeners).await? {
        BootstrapOutcome::Success(session) => {
            bot.set_session(session)?;
            let hook = ShutdownHook::register_on(bot.clone(), signal);
            Ok(StartupOutcome::Running { bot, hook })
        }
        BootstrapOutcome::AuthFailure(detail) => {
            tracing::debug!("Login rejected: {}", detail);
            let diagnostic = auth_failure_message(&config.location);
            tracing::error!("{}", diagnostic);
            Ok(StartupOutcome::Failed {
                exit_code: EXIT_BOOTSTRAP_FAILURE,
                diagnostic,
            })
        }
        BootstrapOutcome::ArgFailure(detail) => {
            let diagnostic = arg_failure_message(&detail, &config.location);
            tracing::error!("{}", diagnostic);
            Ok(StartupOutcome::Failed {
                exit_code: EXIT_BOOTSTRAP_FAILURE,
                diagnostic,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::bot_context::test_support;
    use crate::application::services::test_session::{FakeBehaviour, FakeClient};
    use crate::domain::entities::{Activity, OnlineStatus, Presence};
    use crate::domain::traits::GatewaySession;
    use crate::infrastructure::config::ConfigFile;
    use crate::infrastructure::database::SettingsManager;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn gate(file: ConfigFile) -> ConfigGate {
        ConfigGate::from_file(file, "/etc/encore/config.yaml")
    }

    fn valid_file() -> ConfigFile {
        ConfigFile {
            token: Some("abc.def.ghi".to_string()),
            owner: Some(1000),
            prefix: "!".to_string(),
            ..ConfigFile::default()
        }
    }

    fn memory_settings(_: &Config) -> Result<Arc<dyn SettingsStore>, StorageError> {
        Ok(Arc::new(SettingsManager::in_memory()?))
    }

    #[tokio::test]
    async fn invalid_config_never_connects() {
        let client = FakeClient::new(FakeBehaviour::Accept);
        let opened = AtomicUsize::new(0);
        let file = ConfigFile {
            token: Some("BOT_TOKEN_HERE".to_string()),
            ..valid_file()
        };

        let outcome = start(
            &gate(file),
            &client,
            |c| {
                opened.fetch_add(1, Ordering::SeqCst);
                memory_settings(c)
            },
            std::future::pending(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, StartupOutcome::ConfigInvalid));
        assert_eq!(client.connect_calls(), 0);
        assert_eq!(opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_stores_session_and_applies_presence() {
        let client = FakeClient::new(FakeBehaviour::Accept);
        let outcome = start(&gate(valid_file()), &client, memory_settings, std::future::pending())
            .await
            .unwrap();

        let StartupOutcome::Running { bot, hook } = outcome else {
            panic!("expected a running bot, got {:?}", outcome);
        };
        assert_eq!(client.connect_calls(), 1);
        assert_eq!(client.listener_count.load(Ordering::SeqCst), 3);
        assert!(bot.session().is_some());
        assert!(!hook.has_fired());

        let spec = client.last_spec.lock().unwrap().clone().unwrap();
        assert_eq!(
            spec.presence,
            Presence::new(OnlineStatus::DoNotDisturb, Some(Activity::playing("loading...")))
        );
        // READY applied the default activity.
        assert_eq!(
            client.session.presence(),
            Presence::new(OnlineStatus::Online, Some(Activity::playing("Type !help")))
        );

        drop(hook);
        assert_eq!(client.session.shutdown_calls(), 1);
    }

    #[tokio::test]
    async fn rejected_token_exits_with_location() {
        let client = FakeClient::new(FakeBehaviour::RejectToken);
        let outcome = start(&gate(valid_file()), &client, memory_settings, std::future::pending())
            .await
            .unwrap();

        match outcome {
            StartupOutcome::Failed { exit_code, diagnostic } => {
                assert_eq!(exit_code, 1);
                assert!(diagnostic.contains("/etc/encore/config.yaml"));
                assert!(diagnostic.contains("not the 'secret'"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_token_is_an_argument_failure() {
        let client = FakeClient::new(FakeBehaviour::Accept);
        let file = ConfigFile {
            token: Some("abc def".to_string()),
            ..valid_file()
        };
        let outcome = start(&gate(file), &client, memory_settings, std::future::pending())
            .await
            .unwrap();

        match outcome {
            StartupOutcome::Failed { exit_code, diagnostic } => {
                assert_eq!(exit_code, 1);
                assert!(diagnostic.starts_with("Some aspect of the configuration is invalid: Invalid argument:"));
                assert!(diagnostic.ends_with("/etc/encore/config.yaml"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(client.connect_calls(), 1);
    }

    #[tokio::test]
    async fn other_failures_propagate() {
        let client = FakeClient::new(FakeBehaviour::Fail("connection refused".to_string()));
        let result = start(&gate(valid_file()), &client, memory_settings, std::future::pending()).await;
        assert!(matches!(result, Err(BotError::Network(_))));
    }

    #[test]
    fn eval_is_registered_once_when_enabled() {
        let count_eval = |eval: bool| {
            let config = Config {
                eval,
                ..test_support::config()
            };
            let bot = test_support::bot_with(config.clone());
            let client = build_command_client(&config, &bot, &select_presence(&config)).unwrap();
            let names = client.commands().names();
            assert_eq!(names[0], "ping");
            names.iter().filter(|n| **n == "eval").count()
        };
        assert_eq!(count_eval(false), 0);
        assert_eq!(count_eval(true), 1);

        let config = Config {
            eval: true,
            ..test_support::config()
        };
        let bot = test_support::bot_with(config.clone());
        let client = build_command_client(&config, &bot, &select_presence(&config)).unwrap();
        assert_eq!(client.commands().names().last(), Some(&"eval"));
        assert_eq!(client.commands().len(), 34);
    }
}
