//! Service configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

/// Connection settings for the database handle.
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    /// Database file (from INTENT_DB_PATH). `None` uses the platform data directory.
    pub path: Option<PathBuf>,
    /// How long a statement waits on a locked database (from INTENT_DB_BUSY_TIMEOUT_MS).
    pub busy_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// HTTP listener settings.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// From INTENT_BIND_ADDR.
    pub bind_addr: String,
    /// From INTENT_PORT.
    pub port: u16,
    /// Deadline given to each request's database work (from INTENT_REQUEST_TIMEOUT_MS).
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset or blank variables keep
    /// their defaults; unparsable numbers keep them too, with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(path) = get("INTENT_DB_PATH") {
            config.database.path = Some(PathBuf::from(path));
        }
        if let Some(ms) = parse_or_warn::<u64>("INTENT_DB_BUSY_TIMEOUT_MS", get) {
            config.database.busy_timeout = Duration::from_millis(ms);
        }
        if let Some(addr) = get("INTENT_BIND_ADDR") {
            config.server.bind_addr = addr;
        }
        if let Some(port) = parse_or_warn::<u16>("INTENT_PORT", get) {
            config.server.port = port;
        }
        if let Some(ms) = parse_or_warn::<u64>("INTENT_REQUEST_TIMEOUT_MS", get) {
            config.server.request_timeout = Duration::from_millis(ms);
        }

        config
    }
}

fn parse_or_warn<T: std::str::FromStr>(
    key: &str,
    get: impl Fn(&str) -> Option<String>,
) -> Option<T> {
    let value = get(key)?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value = %value, "invalid value, using default");
            None
        }
    }
}
