//! Session middleware configuration for admin.
//!
//! Sessions live in `PostgreSQL` (`admin_panel.session`) with SameSite=Strict
//! cookies that expire after 24 hours of inactivity.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "nya_admin_session";

/// Session expiry time in seconds (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Apply the admin cookie settings to a session layer over any store.
///
/// Tests pass `tower_sessions::MemoryStore` here.
#[must_use]
pub fn configure_session_layer<S: SessionStore>(
    store: S,
    secure: bool,
) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}

/// Create the session layer with `PostgreSQL` store.
///
/// # Panics
///
/// Panics if the schema or table name is invalid (never with the hardcoded
/// `admin_panel` and `session` values).
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &AdminConfig,
) -> SessionManagerLayer<PostgresStore> {
    // The table is created by the admin migrations.
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("admin_panel")
        .expect("valid schema name")
        .with_table_name("session")
        .expect("valid table name");

    configure_session_layer(store, config.is_secure())
}
