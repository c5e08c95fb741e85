use std::sync::Arc;

use crate::config::{Config, NotifierKind, StoreBackend};
use crate::error::{AppError, Result};
use crate::repositories::{
    booking::{BookingLedger, MemoryBookingLedger, RedisBookingLedger},
    session::{MemorySessionStore, RedisSessionStore, SessionStore},
    user::{CredentialStore, MemoryCredentialStore, RedisCredentialStore},
};
use crate::services::notify::{LogNotifier, Notifier, RedisNotifier};
use crate::views::Views;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// Registered users.
    pub users: Arc<dyn CredentialStore>,
    /// Confirmed bookings.
    pub ledger: Arc<dyn BookingLedger>,
    /// Per-client sessions.
    pub sessions: Arc<dyn SessionStore>,
    /// Where booking confirmations are sent.
    pub notifier: Arc<dyn Notifier>,
    /// The page templates.
    pub views: Arc<Views>,
}

impl AppState {
    /// Creates a new `AppState` with the backends named in `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let redis = if config.needs_redis() {
            Some(crate::db::connect(&config.redis_url).await?)
        } else {
            None
        };

        let mut state = match (config.store_backend, redis.clone()) {
            (StoreBackend::Redis, Some(conn)) => {
                tracing::info!("✅ Using Redis stores at {}", config.redis_url);
                Self::with_stores(
                    config.clone(),
                    Arc::new(RedisCredentialStore::new(conn.clone())),
                    Arc::new(RedisBookingLedger::new(conn.clone())),
                    Arc::new(RedisSessionStore::new(conn)),
                )?
            }
            (StoreBackend::Redis, None) => {
                return Err(AppError::Internal("Redis backend without connection".to_string()));
            }
            (StoreBackend::Memory, _) => {
                tracing::info!("✅ Using in-memory stores (data is lost on restart)");
                Self::in_memory(config.clone())?
            }
        };

        if let (NotifierKind::Redis, Some(conn)) = (config.notifier, redis) {
            tracing::info!(
                "✅ Booking confirmations published on Redis channel '{}'",
                config.notification_topic
            );
            state = state.with_notifier(Arc::new(RedisNotifier::new(conn)));
        }

        Ok(state)
    }

    /// State backed entirely by process memory, notifying through the log.
    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_stores(
            config,
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(MemoryBookingLedger::new()),
            Arc::new(MemorySessionStore::new()),
        )
    }

    /// State over the given stores, notifying through the log.
    pub fn with_stores(
        config: Config,
        users: Arc<dyn CredentialStore>,
        ledger: Arc<dyn BookingLedger>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let views = Views::new()?;
        tracing::info!("✅ Templates compiled");

        Ok(AppState {
            config,
            users,
            ledger,
            sessions,
            notifier: Arc::new(LogNotifier),
            views: Arc::new(views),
        })
    }

    /// Replaces the notification channel.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }
}
