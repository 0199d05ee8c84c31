//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! nya-cli migrate
//! ```
//!
//! Migrations live in `crates/admin/migrations/` and create the
//! `admin_panel` schema (admins, invites, activity log, sessions). The server
//! never runs them on start-up.

use super::{CommandError, connect};

/// Run the admin database migrations.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running admin migrations...");
    sqlx::migrate!("../admin/migrations").run(&pool).await?;

    tracing::info!("Admin migrations complete!");
    Ok(())
}
