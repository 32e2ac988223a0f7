//! Event waiter - lets a command await a follow-up event

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::domain::entities::GatewayEvent;
use crate::domain::traits::{EventListener, GatewaySession};

type Predicate = Box<dyn Fn(&GatewayEvent) -> bool + Send + Sync>;

struct Pending {
    predicate: Predicate,
    tx: oneshot::Sender<GatewayEvent>,
}

/// Resolves registered waits with the first matching event
#[derive(Default)]
pub struct EventWaiter {
    pending: Mutex<Vec<Pending>>,
}

impl EventWaiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the next event matching `predicate`, or `None` on timeout.
    pub async fn wait_for<P>(&self, predicate: P, timeout: Option<Duration>) -> Option<GatewayEvent>
    where
        P: Fn(&GatewayEvent) -> bool + Send + Sync + 'static,
    {
        let (tx, rx) = oneshot::channel();
        match self.pending.lock() {
            Ok(mut pending) => pending.push(Pending {
                predicate: Box::new(predicate),
                tx,
            }),
            Err(_) => {
                tracing::error!("Event waiter lock poisoned");
                return None;
            }
        }

        match timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received.ok(),
                Err(_) => {
                    self.prune();
                    None
                }
            },
            None => rx.await.ok(),
        }
    }

    /// Number of waits still outstanding. Abandoned waits are not counted.
    pub fn waiting(&self) -> usize {
        self.pending
            .lock()
            .map(|p| p.iter().filter(|w| !w.tx.is_closed()).count())
            .unwrap_or(0)
    }

    fn prune(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.retain(|w| !w.tx.is_closed());
        }
    }

    pub fn dispatch(&self, event: &GatewayEvent) {
        let Ok(mut pending) = self.pending.lock() else {
            return;
        };
        let mut still_waiting = Vec::with_capacity(pending.len());
        for wait in pending.drain(..) {
            if wait.tx.is_closed() {
                continue;
            }
            if (wait.predicate)(event) {
                let _ = wait.tx.send(event.clone());
            } else {
                still_waiting.push(wait);
            }
        }
        *pending = still_waiting;
    }
}

#[async_trait]
impl EventListener for EventWaiter {
    async fn on_event(&self, _session: &Arc<dyn GatewaySession>, event: &GatewayEvent) {
        self.dispatch(event);
    }
}
