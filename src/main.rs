use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

mod application;
mod domain;
mod infrastructure;

use application::errors::BotError;
use application::services::{start, termination_signal, StartupOutcome};
use domain::traits::SettingsStore;
use infrastructure::adapters::DiscordClient;
use infrastructure::config::{self, ConfigGate};
use infrastructure::database::SettingsManager;

/// How long to wait for the gateway to close cleanly on exit.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "encore-bot")]
#[command(about = "A self-hosted Discord music bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() -> Result<ExitCode, BotError> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => run_bot(cli.config, cli.token),
        Commands::Version => {
            println!("encore-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
        Commands::InitConfig => {
            init_config()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_bot(config_path: String, token_override: Option<String>) -> Result<ExitCode, BotError> {
    let gate = ConfigGate::load(&config_path, token_override);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| BotError::Internal(format!("Failed to start runtime: {}", e)))?;

    rt.block_on(async {
        let client = DiscordClient::new();
        let outcome = start(
            &gate,
            &client,
            |config| {
                let store: Arc<dyn SettingsStore> = Arc::new(SettingsManager::new(&config.settings_db)?);
                Ok(store)
            },
            termination_signal(),
        )
        .await?;

        match outcome {
            StartupOutcome::ConfigInvalid => Ok(ExitCode::SUCCESS),
            StartupOutcome::Failed { exit_code, .. } => Ok(ExitCode::from(exit_code)),
            StartupOutcome::Running { bot, hook } => {
                let Some(session) = bot.session().cloned() else {
                    return Err(BotError::Internal("session missing after startup".to_string()));
                };

                tokio::select! {
                    _ = bot.wait_for_shutdown() => {}
                    _ = session.closed() => {
                        tracing::warn!("Gateway session ended");
                    }
                }

                bot.shutdown();
                drop(hook);
                if tokio::time::timeout(CLOSE_GRACE, session.closed()).await.is_err() {
                    tracing::warn!("Gateway did not close within {}s", CLOSE_GRACE.as_secs());
                }
                tracing::info!("Goodbye");
                Ok(ExitCode::SUCCESS)
            }
        }
    })
}

fn init_config() -> Result<(), BotError> {
    let yaml = config::default_yaml()?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}
