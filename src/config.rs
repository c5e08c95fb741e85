use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use zeroize::Zeroizing;

use crate::crypto::password::PasswordScheme;

/// Where users, bookings and sessions are persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process memory; everything is lost on restart.
    Memory,
    /// A redis server reachable at `REDIS_URL`.
    Redis,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => anyhow::bail!("Unknown STORE_BACKEND '{}' (expected memory or redis)", other),
        }
    }
}

/// Which channel booking confirmations are published to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifierKind {
    /// Emit the message as a tracing event.
    Log,
    /// `PUBLISH` the message on a redis channel.
    Redis,
}

impl FromStr for NotifierKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "redis" => Ok(Self::Redis),
            other => anyhow::bail!("Unknown NOTIFIER '{}' (expected log or redis)", other),
        }
    }
}

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The socket address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// The persistence backend.
    pub store_backend: StoreBackend,
    /// The URL of the Redis server.
    pub redis_url: String,
    /// The lifetime of a session in hours.
    pub session_duration_hours: i64,
    /// Whether cookies carry the `Secure` attribute.
    pub secure_cookies: bool,
    /// The digest used for newly registered passwords.
    pub password_scheme: PasswordScheme,
    /// The notification channel.
    pub notifier: NotifierKind,
    /// The topic booking confirmations are published under.
    pub notification_topic: String,
    /// Upper bound on a single notification dispatch.
    pub notification_timeout: Duration,
    /// Bearer token guarding the operator endpoints. Unset disables them.
    pub operator_token: Option<Zeroizing<String>>,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            store_backend: StoreBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            session_duration_hours: 12,
            secure_cookies: false,
            password_scheme: PasswordScheme::Sha256,
            notifier: NotifierKind::Log,
            notification_topic: "booking-confirmations".to_string(),
            notification_timeout: Duration::from_millis(2000),
            operator_token: None,
            static_dir: PathBuf::from("static"),
        }
    }
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// Every variable is optional; unset ones fall back to [`Config::default`].
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let bind_addr = match env::var("BIND_ADDR") {
            Ok(raw) => raw.parse().context("Invalid BIND_ADDR")?,
            Err(_) => defaults.bind_addr,
        };

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.store_backend,
        };

        let password_scheme = match env::var("PASSWORD_SCHEME") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.password_scheme,
        };

        let notifier = match env::var("NOTIFIER") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.notifier,
        };

        let session_duration_hours: i64 = env::var("SESSION_DURATION_HOURS")
            .unwrap_or_else(|_| defaults.session_duration_hours.to_string())
            .parse()
            .context("Invalid SESSION_DURATION_HOURS")?;

        if session_duration_hours <= 0 {
            anyhow::bail!("SESSION_DURATION_HOURS must be positive");
        }

        let notification_timeout_ms: u64 = env::var("NOTIFICATION_TIMEOUT_MS")
            .unwrap_or_else(|_| defaults.notification_timeout.as_millis().to_string())
            .parse()
            .context("Invalid NOTIFICATION_TIMEOUT_MS")?;

        let operator_token = env::var("OPERATOR_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty())
            .map(Zeroizing::new);

        let is_production = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string()) == "production";

        Ok(Self {
            bind_addr,
            store_backend,
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            session_duration_hours,
            secure_cookies: is_production,
            password_scheme,
            notifier,
            notification_topic: env::var("NOTIFICATION_TOPIC")
                .unwrap_or(defaults.notification_topic),
            notification_timeout: Duration::from_millis(notification_timeout_ms),
            operator_token,
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
        })
    }

    /// Whether anything in the configuration needs a redis connection.
    pub fn needs_redis(&self) -> bool {
        self.store_backend == StoreBackend::Redis || self.notifier == NotifierKind::Redis
    }
}
