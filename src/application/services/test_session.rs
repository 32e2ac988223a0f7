//! In-process gateway doubles for tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::application::errors::{BotError, SessionError};
use crate::domain::entities::{GatewayEvent, OnlineStatus, Presence, SessionConfig, SessionSpec, User};
use crate::domain::traits::{EventListener, GatewayClient, GatewaySession, ProfileEdit};

pub struct FakeSession {
    user: User,
    next_id: AtomicUsize,
    shutdowns: AtomicUsize,
    pub sent: Mutex<Vec<(String, String, String)>>,
    pub deleted: Mutex<Vec<(String, String)>>,
    pub presences: Mutex<Vec<Presence>>,
    pub profile_edits: Mutex<Vec<ProfileEdit>>,
    closed_tx: watch::Sender<bool>,
}

impl FakeSession {
    pub fn new() -> Self {
        let (closed_tx, _) = watch::channel(false);
        Self {
            user: User::new("42").with_username("encore").bot(),
            next_id: AtomicUsize::new(1),
            shutdowns: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            presences: Mutex::new(Vec::new()),
            profile_edits: Mutex::new(Vec::new()),
            closed_tx,
        }
    }

    pub fn shutdown_calls(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    /// Texts sent so far, in order.
    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, _, text)| text.clone()).collect()
    }
}

#[async_trait]
impl GatewaySession for FakeSession {
    fn self_user(&self) -> User {
        self.user.clone()
    }

    fn guild_count(&self) -> usize {
        3
    }

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError> {
        let id = format!("reply-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.sent
            .lock()
            .unwrap()
            .push((channel_id.to_string(), id.clone(), text.to_string()));
        Ok(id)
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), BotError> {
        self.deleted
            .lock()
            .unwrap()
            .push((channel_id.to_string(), message_id.to_string()));
        Ok(())
    }

    fn presence(&self) -> Presence {
        self.presences
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_else(|| Presence::new(OnlineStatus::Online, None))
    }

    fn update_presence(&self, presence: Presence) -> Result<(), BotError> {
        self.presences.lock().unwrap().push(presence);
        Ok(())
    }

    async fn edit_profile(&self, edit: ProfileEdit) -> Result<(), BotError> {
        self.profile_edits.lock().unwrap().push(edit);
        Ok(())
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        self.closed_tx.send_replace(true);
    }

    async fn closed(&self) {
        let mut rx = self.closed_tx.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

/// What the fake client does after validating its input
pub enum FakeBehaviour {
    Accept,
    RejectToken,
    Fail(String),
}

pub struct FakeClient {
    behaviour: FakeBehaviour,
    connects: AtomicUsize,
    pub session: Arc<FakeSession>,
    pub last_spec: Mutex<Option<SessionSpec>>,
    pub listener_count: AtomicUsize,
}

impl FakeClient {
    pub fn new(behaviour: FakeBehaviour) -> Self {
        Self {
            behaviour,
            connects: AtomicUsize::new(0),
            session: Arc::new(FakeSession::new()),
            last_spec: Mutex::new(None),
            listener_count: AtomicUsize::new(0),
        }
    }

    pub fn connect_calls(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GatewayClient for FakeClient {
    async fn connect(
        &self,
        config: SessionConfig,
        listeners: Vec<Arc<dyn EventListener>>,
    ) -> Result<Arc<dyn GatewaySession>, SessionError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let spec = config.finalize()?;
        *self.last_spec.lock().unwrap() = Some(spec);
        self.listener_count.store(listeners.len(), Ordering::SeqCst);

        match &self.behaviour {
            FakeBehaviour::Accept => {
                let session: Arc<dyn GatewaySession> = self.session.clone();
                let ready = GatewayEvent::Ready {
                    user: session.self_user(),
                    guild_ids: vec!["g1".to_string()],
                };
                for listener in &listeners {
                    listener.on_event(&session, &ready).await;
                }
                Ok(session)
            }
            FakeBehaviour::RejectToken => {
                Err(SessionError::Authentication("401: Unauthorized".to_string()))
            }
            FakeBehaviour::Fail(reason) => Err(SessionError::Other(BotError::Network(reason.clone()))),
        }
    }
}
