//! CLI subcommand implementations.

pub mod admin;
pub mod migrate;

use secrecy::SecretString;
use sqlx::PgPool;

/// Connect to the admin database named by `ADMIN_DATABASE_URL` (or `DATABASE_URL`).
///
/// # Errors
///
/// Returns `CommandError` if neither variable is set or the connection fails.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("ADMIN_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("ADMIN_DATABASE_URL"))?;

    tracing::info!("Connecting to admin database...");
    let pool = nya_admin::db::create_pool(&SecretString::from(database_url)).await?;
    Ok(pool)
}

/// Errors shared by the CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Store operation failed.
    #[error("{0}")]
    Repository(#[from] nya_admin::db::RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] nya_core::EmailError),

    /// Unknown permission key.
    #[error("{0}. Valid keys: homeManager, journeyManager, team, chapters, media, resources, blog, joinRequests, reports, logs, admins, settings")]
    InvalidPermission(#[from] nya_core::PermissionParseError),

    /// Email already belongs to an admin.
    #[error("Admin already exists with email: {0}")]
    AdminExists(String),
}
