use std::sync::Arc;

use portal_core::crypto::SecretCipher;
use portal_events::{Dispatcher, DomainEvent, Mailer};

use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;
use crate::storage::LocalStorage;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub pool: portal_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Side-effect fan-out for committed actions.
    pub dispatcher: Dispatcher,
    /// Outbound email (invitations).
    pub mailer: Arc<dyn Mailer>,
    /// Credential secret encryption.
    pub cipher: SecretCipher,
    pub storage: Arc<LocalStorage>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Assemble the state, deriving the cipher and storage from `config`.
    pub fn new(
        pool: portal_db::DbPool,
        config: ServerConfig,
        dispatcher: Dispatcher,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            cipher: SecretCipher::from_passphrase(&config.credential_key),
            storage: Arc::new(LocalStorage::new(config.storage_root.clone())),
            rate_limiter: Arc::new(RateLimiter::new()),
            pool,
            config: Arc::new(config),
            dispatcher,
            mailer,
        }
    }

    /// Announce a committed action. Side-effect failures are logged by the
    /// dispatcher and never surface here.
    pub async fn dispatch(&self, event: DomainEvent) {
        tracing::debug!(action = %event.action, subject = ?event.subject, "Dispatching");
        self.dispatcher.dispatch(event).await;
    }

    /// Announce the actions of one commit as a single ordered batch.
    pub async fn dispatch_all(&self, events: Vec<DomainEvent>) {
        for event in &events {
            tracing::debug!(action = %event.action, subject = ?event.subject, "Dispatching");
        }
        self.dispatcher.dispatch_all(events).await;
    }
}
