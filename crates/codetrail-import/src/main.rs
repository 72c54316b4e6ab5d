//! `codetrail-import`: replays a folder of legacy `.db` files into PostgreSQL.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use codetrail_core::repository::ActivityRepository;
use codetrail_import::import_directory;
use codetrail_store::config::{ConnectionParts, DatabaseConfig};
use codetrail_store::pg_activity_repository::PgActivityRepository;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Import legacy activity files into PostgreSQL")]
struct Cli {
    /// Folder holding the legacy `.db` files.
    folder: PathBuf,

    /// Full connection URL. Overrides the `--db-*` options.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    db_host: String,

    #[arg(long, env = "DB_PORT", default_value_t = 5432)]
    db_port: u16,

    #[arg(long, env = "DB_USERNAME", default_value = "postgres")]
    db_username: String,

    #[arg(long, env = "DB_PASSWORD", default_value = "postgres", hide_env_values = true)]
    db_password: String,

    #[arg(long, env = "DB_DATABASE", default_value = "coding_tracker")]
    db_database: String,

    /// Require TLS.
    #[arg(long, env = "DB_SSL")]
    db_ssl: bool,
}

impl Cli {
    fn database_config(&self) -> Result<DatabaseConfig, sqlx::Error> {
        match &self.database_url {
            Some(url) => DatabaseConfig::from_url(url),
            None => Ok(DatabaseConfig::from_parts(&ConnectionParts {
                host: self.db_host.clone(),
                port: self.db_port,
                username: self.db_username.clone(),
                password: self.db_password.clone(),
                database: self.db_database.clone(),
                ssl: self.db_ssl,
            })),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    if !cli.folder.is_dir() {
        tracing::error!(folder = %cli.folder.display(), "import folder not found");
        return ExitCode::FAILURE;
    }

    let config = match cli.database_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid database configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("connecting to PostgreSQL");
    let repo = match PgActivityRepository::connect(&config).await {
        Ok(repo) => repo,
        Err(e) => {
            tracing::error!(error = %e, "cannot connect to PostgreSQL");
            return ExitCode::FAILURE;
        }
    };

    let result = import_directory(&cli.folder, &repo).await;
    repo.close().await;

    match result {
        Ok(summary) => {
            tracing::info!(
                processed = summary.processed,
                errors = summary.errors,
                "migration complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "migration failed");
            ExitCode::FAILURE
        }
    }
}
