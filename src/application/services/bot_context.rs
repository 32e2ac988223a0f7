//! Shared application state handed to every command and listener

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::application::errors::BotError;
use crate::application::messaging::EventWaiter;
use crate::domain::traits::{GatewaySession, SettingsStore};
use crate::infrastructure::config::Config;

pub struct BotContext {
    config: Config,
    settings: Arc<dyn SettingsStore>,
    waiter: Arc<EventWaiter>,
    session: OnceCell<Arc<dyn GatewaySession>>,
    started_at: DateTime<Utc>,
    shutting_down: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
}

impl BotContext {
    pub fn new(config: Config, settings: Arc<dyn SettingsStore>, waiter: Arc<EventWaiter>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            config,
            settings,
            waiter,
            session: OnceCell::new(),
            started_at: Utc::now(),
            shutting_down: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> &Arc<dyn SettingsStore> {
        &self.settings
    }

    pub fn waiter(&self) -> &Arc<EventWaiter> {
        &self.waiter
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Store the live session. The slot is written exactly once.
    pub fn set_session(&self, session: Arc<dyn GatewaySession>) -> Result<(), BotError> {
        self.session
            .set(session)
            .map_err(|_| BotError::Internal("session already assigned".to_string()))
    }

    pub fn session(&self) -> Option<&Arc<dyn GatewaySession>> {
        self.session.get()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Tear down the session. Only the first call does anything; the return
    /// value says whether this call was it.
    pub fn shutdown(&self) -> bool {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            return false;
        }
        tracing::info!("Shutting down");
        if let Some(session) = self.session.get() {
            session.shutdown();
        }
        self.shutdown_tx.send_replace(true);
        true
    }

    /// Resolves once [`BotContext::shutdown`] has run.
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.shutdown_tx.subscribe();
        let _ = rx.wait_for(|done| *done).await;
    }
}
