use std::env;

use tracing::info;

use crate::entities::DEFAULT_MIN_LOCK_DURATION;
use crate::error::LedgerError;

/// Settings threaded through the dispatcher. The only policy the ledger owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSettings {
    /// Lock window written to the protocol row when it is first created.
    /// An existing protocol row keeps whatever value it already holds.
    pub default_min_lock_duration: u64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            default_min_lock_duration: DEFAULT_MIN_LOCK_DURATION,
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Without it the ledger runs in memory.
    pub database_url: Option<String>,
    pub ledger: LedgerSettings,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, LedgerError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            ledger: LedgerSettings {
                default_min_lock_duration: parse_env("MIN_LOCK_DURATION", DEFAULT_MIN_LOCK_DURATION)?,
            },
        })
    }

    /// Log the effective settings without credentials.
    pub fn log_redacted(&self) {
        let database = self
            .database_url
            .as_deref()
            .map(redact_url)
            .unwrap_or_else(|| "memory".to_string());
        info!(
            database = %database,
            min_lock_duration = self.ledger.default_min_lock_duration,
            "Config loaded"
        );
    }
}

fn parse_env(key: &str, default: u64) -> Result<u64, LedgerError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| LedgerError::Config(format!("{key} must be a non-negative integer, got {raw:?}"))),
        Err(_) => Ok(default),
    }
}

/// Keep scheme and host of a connection URL, drop user info.
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
