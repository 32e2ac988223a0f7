//! Discord adapter - REST plus gateway WebSocket behind the session traits

pub mod gateway;
pub mod http;

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::{mpsc, watch};

use crate::application::errors::{BotError, SessionError};
use crate::domain::entities::{GatewayEvent, Presence, SessionConfig, User};
use crate::domain::traits::{EventListener, GatewayClient, GatewaySession, ProfileEdit};
use gateway::{decode_dispatch, Driver, Outbound, ResumeState};
use http::DiscordHttp;

/// Opens Discord sessions
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscordClient;

impl DiscordClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GatewayClient for DiscordClient {
    async fn connect(
        &self,
        config: SessionConfig,
        listeners: Vec<Arc<dyn EventListener>>,
    ) -> Result<Arc<dyn GatewaySession>, SessionError> {
        let spec = config.finalize()?;
        let http = DiscordHttp::new(spec.token.clone());

        let me = http.current_user().await?;
        tracing::info!("Logging in as {}", me.display_name());

        let first = gateway::handshake(&spec, ResumeState::default()).await?;
        tracing::info!("Gateway ready");

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let session = Arc::new(DiscordSession::new(http, me, spec.presence.clone(), outbound_tx));

        for event in decode_dispatch("READY", &first.ready, spec.split_bulk_deletes) {
            let _ = events_tx.send(event);
        }

        let driver = Driver {
            spec,
            outbound: outbound_rx,
            events: events_tx,
        };
        let driver_session = session.clone();
        tokio::spawn(async move {
            driver.run(first).await;
            driver_session.mark_closed();
        });

        let handle: Arc<dyn GatewaySession> = session.clone();
        tokio::spawn(pump(session, handle.clone(), events_rx, Arc::new(listeners)));

        Ok(handle)
    }
}

/// Hand each event to the listeners, in attachment order, on its own task so
/// a listener waiting on a later event cannot stall delivery.
async fn pump(
    session: Arc<DiscordSession>,
    handle: Arc<dyn GatewaySession>,
    mut events: mpsc::UnboundedReceiver<GatewayEvent>,
    listeners: Arc<Vec<Arc<dyn EventListener>>>,
) {
    while let Some(event) = events.recv().await {
        session.track(&event);
        let handle = handle.clone();
        let listeners = listeners.clone();
        tokio::spawn(async move {
            for listener in listeners.iter() {
                listener.on_event(&handle, &event).await;
            }
        });
    }
    tracing::debug!("Event stream ended");
}

/// A live Discord connection
pub struct DiscordSession {
    http: DiscordHttp,
    user: RwLock<User>,
    guilds: Mutex<HashSet<String>>,
    presence: Mutex<Presence>,
    outbound: mpsc::UnboundedSender<Outbound>,
    closing: AtomicBool,
    closed: watch::Sender<bool>,
}

impl DiscordSession {
    fn new(http: DiscordHttp, user: User, presence: Presence, outbound: mpsc::UnboundedSender<Outbound>) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            http,
            user: RwLock::new(user),
            guilds: Mutex::new(HashSet::new()),
            presence: Mutex::new(presence),
            outbound,
            closing: AtomicBool::new(false),
            closed,
        }
    }

    /// Keep the self user and guild set current.
    fn track(&self, event: &GatewayEvent) {
        let mut guilds = self.guilds.lock().unwrap_or_else(|e| e.into_inner());
        match event {
            GatewayEvent::Ready { user, guild_ids } => {
                *self.user.write().unwrap_or_else(|e| e.into_inner()) = user.clone();
                guilds.clear();
                guilds.extend(guild_ids.iter().cloned());
            }
            GatewayEvent::GuildCreate { guild_id, .. } => {
                guilds.insert(guild_id.clone());
            }
            GatewayEvent::GuildDelete { guild_id, unavailable: false } => {
                guilds.remove(guild_id);
            }
            _ => {}
        }
    }

    fn mark_closed(&self) {
        self.closing.store(true, Ordering::SeqCst);
        self.closed.send_replace(true);
    }
}

#[async_trait]
impl GatewaySession for DiscordSession {
    fn self_user(&self) -> User {
        self.user.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn guild_count(&self) -> usize {
        self.guilds.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError> {
        self.http.create_message(channel_id, text).await
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), BotError> {
        self.http.delete_message(channel_id, message_id).await
    }

    fn presence(&self) -> Presence {
        self.presence.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn update_presence(&self, presence: Presence) -> Result<(), BotError> {
        let payload = presence.to_json();
        *self.presence.lock().unwrap_or_else(|e| e.into_inner()) = presence;
        self.outbound
            .send(Outbound::Presence(payload))
            .map_err(|_| BotError::Gateway("session is closed".to_string()))
    }

    async fn edit_profile(&self, edit: ProfileEdit) -> Result<(), BotError> {
        let avatar = match &edit.avatar_url {
            Some(url) => Some(self.http.image_data_uri(url).await?),
            None => None,
        };
        let user = self
            .http
            .modify_current_user(edit.username.as_deref(), avatar.as_deref())
            .await?;
        *self.user.write().unwrap_or_else(|e| e.into_inner()) = user;
        Ok(())
    }

    fn shutdown(&self) {
        if self.closing.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.outbound.send(Outbound::Close).is_err() {
            // Driver already gone.
            self.closed.send_replace(true);
        }
    }

    async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}
