//! Shutdown hook - one termination callback per process

use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::BotContext;

/// Runs [`BotContext::shutdown`] when the process is told to stop, and
/// again (as a no-op if already done) when the hook is dropped, so teardown
/// happens on every exit path once a session exists.
pub struct ShutdownHook {
    bot: Arc<BotContext>,
    handle: JoinHandle<()>,
}

impl ShutdownHook {
    /// Register against a termination future, normally [`termination_signal`].
    pub fn register_on<F>(bot: Arc<BotContext>, signal: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task_bot = bot.clone();
        let handle = tokio::spawn(async move {
            signal.await;
            tracing::info!("Termination signal received");
            task_bot.shutdown();
        });
        Self { bot, handle }
    }

    pub fn has_fired(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ShutdownHook {
    fn drop(&mut self) {
        self.handle.abort();
        self.bot.shutdown();
    }
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn termination_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::bot_context::test_support;
    use crate::application::services::test_session::FakeSession;
    use tokio::sync::broadcast;

    #[tokio::test]
    async fn repeated_signals_tear_down_once() {
        let bot = test_support::bot();
        let session = Arc::new(FakeSession::new());
        bot.set_session(session.clone()).unwrap();

        let (tx, mut rx) = broadcast::channel::<()>(4);
        let hook = ShutdownHook::register_on(bot.clone(), async move {
            let _ = rx.recv().await;
        });

        tx.send(()).unwrap();
        let _ = tx.send(());
        bot.wait_for_shutdown().await;
        while !hook.has_fired() {
            tokio::task::yield_now().await;
        }

        // The normal exit path also asks for shutdown.
        bot.shutdown();
        drop(hook);
        assert_eq!(session.shutdown_calls(), 1);
    }

    #[tokio::test]
    async fn dropping_the_hook_releases_the_session() {
        let bot = test_support::bot();
        let session = Arc::new(FakeSession::new());
        bot.set_session(session.clone()).unwrap();

        let hook = ShutdownHook::register_on(bot.clone(), std::future::pending());
        assert!(!hook.has_fired());
        drop(hook);
        assert!(bot.is_shutting_down());
        assert_eq!(session.shutdown_calls(), 1);
    }
}
