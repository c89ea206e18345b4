use std::path::PathBuf;
use std::time::Duration;

use portal_events::QueueSettings;

use crate::auth::jwt::JwtConfig;

/// How committed actions reach the subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Fan out before the request returns.
    Inline,
    /// Hand off to the background queue worker.
    Queued,
}

impl std::str::FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(DispatchMode::Inline),
            "queued" => Ok(DispatchMode::Queued),
            other => Err(format!("unknown dispatch mode '{other}', expected inline or queued")),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown budget in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Bearer-token validation settings.
    pub jwt: JwtConfig,
    /// Passphrase the credential encryption key is derived from.
    pub credential_key: String,
    /// Root directory of the local object store.
    pub storage_root: PathBuf,
    /// Largest accepted upload body in bytes (default: 100 MiB).
    pub max_upload_bytes: usize,
    pub dispatch_mode: DispatchMode,
    pub dispatch_queue_capacity: usize,
    pub dispatch_max_attempts: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `HOST`                    | `0.0.0.0`               |
    /// | `PORT`                    | `3000`                  |
    /// | `CORS_ORIGINS`            | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`   | `30`                    |
    /// | `CREDENTIAL_KEY`          | required                |
    /// | `STORAGE_ROOT`            | `./storage`             |
    /// | `MAX_UPLOAD_MB`           | `100`                   |
    /// | `DISPATCH_MODE`           | `inline`                |
    /// | `DISPATCH_QUEUE_CAPACITY` | `1024`                  |
    /// | `DISPATCH_MAX_ATTEMPTS`   | `3`                     |
    ///
    /// # Panics
    ///
    /// Panics on a missing secret or an unparseable value. Misconfiguration
    /// fails at start-up.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = env_or("PORT", "3000")
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = env_or("SHUTDOWN_TIMEOUT_SECS", "30")
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let credential_key =
            std::env::var("CREDENTIAL_KEY").expect("CREDENTIAL_KEY must be set in the environment");
        assert!(!credential_key.is_empty(), "CREDENTIAL_KEY must not be empty");

        let max_upload_mb: usize = env_or("MAX_UPLOAD_MB", "100")
            .parse()
            .expect("MAX_UPLOAD_MB must be a valid usize");

        let dispatch_mode: DispatchMode = env_or("DISPATCH_MODE", "inline")
            .parse()
            .unwrap_or_else(|e| panic!("DISPATCH_MODE: {e}"));

        let dispatch_queue_capacity: usize = env_or("DISPATCH_QUEUE_CAPACITY", "1024")
            .parse()
            .expect("DISPATCH_QUEUE_CAPACITY must be a valid usize");

        let dispatch_max_attempts: u32 = env_or("DISPATCH_MAX_ATTEMPTS", "3")
            .parse()
            .expect("DISPATCH_MAX_ATTEMPTS must be a valid u32");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            credential_key,
            storage_root: PathBuf::from(env_or("STORAGE_ROOT", "./storage")),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            dispatch_mode,
            dispatch_queue_capacity,
            dispatch_max_attempts,
        }
    }

    /// Queue tuning derived from the dispatch settings. Enqueue waits at most
    /// one request timeout.
    pub fn queue_settings(&self) -> QueueSettings {
        QueueSettings {
            capacity: self.dispatch_queue_capacity,
            max_attempts: self.dispatch_max_attempts.max(1),
            enqueue_timeout: Duration::from_secs(self.request_timeout_secs),
            ..QueueSettings::default()
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_mode_parses_case_insensitively() {
        assert_eq!("Queued".parse::<DispatchMode>(), Ok(DispatchMode::Queued));
        assert_eq!(" inline ".parse::<DispatchMode>(), Ok(DispatchMode::Inline));
        assert!("eventually".parse::<DispatchMode>().is_err());
    }
}
