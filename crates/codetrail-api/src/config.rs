//! Server configuration read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use codetrail_ingestion::retry::RetryPolicy;
use codetrail_ingestion::storage_context::StorageConfig;
use codetrail_store::config::{ConnectionParts, DatabaseConfig};

use crate::error::AppError;

/// Everything the server needs at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// How to reach the primary store.
    pub database: DatabaseConfig,
    /// Backend selection, fallback location and write-queue tuning.
    pub storage: StorageConfig,
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of a
    /// variable or `None` when it is unset.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let env = Env(lookup);

        let mut database = match env.get("DATABASE_URL") {
            Some(url) => DatabaseConfig::from_url(&url)
                .map_err(|e| AppError::Config(format!("DATABASE_URL is invalid: {e}")))?,
            None => {
                let defaults = ConnectionParts::default();
                DatabaseConfig::from_parts(&ConnectionParts {
                    host: env.get("DB_HOST").unwrap_or(defaults.host),
                    port: env.parse("DB_PORT", defaults.port)?,
                    username: env.get("DB_USERNAME").unwrap_or(defaults.username),
                    password: env.get("DB_PASSWORD").unwrap_or(defaults.password),
                    database: env.get("DB_DATABASE").unwrap_or(defaults.database),
                    ssl: env.flag("DB_SSL"),
                })
            }
        };
        database.max_connections =
            env.parse("DB_MAX_CONNECTIONS", DatabaseConfig::DEFAULT_MAX_CONNECTIONS)?;
        database.connect_timeout = Duration::from_secs(env.parse(
            "DB_CONNECT_TIMEOUT_SECS",
            DatabaseConfig::DEFAULT_CONNECT_TIMEOUT.as_secs(),
        )?);

        let defaults = StorageConfig::default();
        let retry = RetryPolicy {
            base_delay: Duration::from_millis(env.parse(
                "WRITE_RETRY_BASE_MS",
                millis(defaults.retry.base_delay),
            )?),
            max_delay: Duration::from_millis(
                env.parse("WRITE_RETRY_MAX_MS", millis(defaults.retry.max_delay))?,
            ),
        };
        if retry.base_delay > retry.max_delay {
            return Err(AppError::Config(
                "WRITE_RETRY_BASE_MS must not exceed WRITE_RETRY_MAX_MS".to_owned(),
            ));
        }
        let storage = StorageConfig {
            use_primary: !env.flag("USE_FILE_STORAGE_FALLBACK"),
            fallback_dir: env
                .get("FALLBACK_DIR")
                .map_or(defaults.fallback_dir, PathBuf::from),
            retry,
            drain_timeout: Duration::from_secs(
                env.parse("SHUTDOWN_DRAIN_SECS", defaults.drain_timeout.as_secs())?,
            ),
        };

        Ok(Self {
            database,
            storage,
            host: env.get("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: env.parse("PORT", 3000)?,
        })
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Set, non-blank value of `key`.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn flag(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|value| matches!(value.trim(), "true" | "1" | "yes"))
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T, AppError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| AppError::Config(format!("{key} must be a valid number: {e}"))),
            None => Ok(default),
        }
    }
}
