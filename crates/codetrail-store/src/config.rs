//! Primary store connection settings.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

/// How to reach the primary PostgreSQL store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection options, either parsed from a URL or assembled from parts.
    pub connect_options: PgConnectOptions,
    /// Pool size.
    pub max_connections: u32,
    /// How long connecting (and acquiring a pooled connection) may take.
    pub connect_timeout: Duration,
}

impl DatabaseConfig {
    /// Default pool size.
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    /// Default connect timeout.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Builds a config from a `postgres://` URL.
    ///
    /// # Errors
    ///
    /// Returns the parse error if the URL is malformed.
    pub fn from_url(url: &str) -> Result<Self, sqlx::Error> {
        Ok(Self::with_options(PgConnectOptions::from_str(url)?))
    }

    /// Builds a config from discrete connection parameters.
    #[must_use]
    pub fn from_parts(parts: &ConnectionParts) -> Self {
        let ssl_mode = if parts.ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };
        Self::with_options(
            PgConnectOptions::new()
                .host(&parts.host)
                .port(parts.port)
                .username(&parts.username)
                .password(&parts.password)
                .database(&parts.database)
                .ssl_mode(ssl_mode),
        )
    }

    fn with_options(connect_options: PgConnectOptions) -> Self {
        Self {
            connect_options,
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Discrete connection parameters, used when no URL is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParts {
    /// Server host name.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login role.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Database name.
    pub database: String,
    /// Require TLS.
    pub ssl: bool,
}

impl Default for ConnectionParts {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 5432,
            username: "postgres".to_owned(),
            password: "postgres".to_owned(),
            database: "coding_tracker".to_owned(),
            ssl: false,
        }
    }
}
