//! Persistence for the admin panel.
//!
//! # Schema: `admin_panel`
//!
//! ## Tables
//!
//! - `admins` - Authorized admins, keyed by provider user id
//! - `admin_invites` - Pending invites, deleted when consumed
//! - `activity_logs` - Append-only record of admin actions
//! - `session` - tower-sessions storage
//!
//! # Backends
//!
//! [`PgStore`] is the production backend. [`MemoryStore`] keeps everything in
//! process and backs tests. Code that only
//! needs one backend is generic over [`AdminStore`]; the application state
//! holds a [`StoreBackend`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p nya-cli -- migrate
//! ```

pub mod activity;
pub mod admins;
pub mod memory;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use nya_core::{Admin, AdminId, AdminInvite, Email, InviteId, Permissions};

use crate::models::{ActivityEntry, NewActivity};

pub use admins::PgStore;
pub use memory::MemoryStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Maps unique violations to [`RepositoryError::Conflict`].
    pub(crate) fn from_insert(error: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = error
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(error)
    }
}

/// An invite about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvite {
    pub email: Email,
    pub name: Option<String>,
    pub is_master: bool,
    pub permissions: Permissions,
}

/// Storage for admins and their invites.
pub trait AdminStore: Send + Sync {
    /// Look up an admin by its stable key.
    fn find_admin(
        &self,
        id: &AdminId,
    ) -> impl Future<Output = Result<Option<Admin>, RepositoryError>> + Send;

    /// Look up an admin by normalized email.
    fn find_admin_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<Admin>, RepositoryError>> + Send;

    /// Every admin, masters first, then by name.
    fn list_admins(&self) -> impl Future<Output = Result<Vec<Admin>, RepositoryError>> + Send;

    /// Insert an admin, replacing any existing record with the same email.
    fn upsert_admin(
        &self,
        admin: &Admin,
    ) -> impl Future<Output = Result<Admin, RepositoryError>> + Send;

    /// Replace the permissions of a non-master admin.
    ///
    /// Returns [`RepositoryError::NotFound`] when no non-master admin has `id`.
    fn update_admin_permissions(
        &self,
        id: &AdminId,
        permissions: Permissions,
    ) -> impl Future<Output = Result<Admin, RepositoryError>> + Send;

    /// Remove a non-master admin.
    ///
    /// Returns [`RepositoryError::NotFound`] when no non-master admin has `id`.
    fn delete_admin(&self, id: &AdminId)
    -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// The pending invite for `email`, if any.
    fn find_invite_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<AdminInvite>, RepositoryError>> + Send;

    /// Every pending invite, newest first.
    fn list_invites(
        &self,
    ) -> impl Future<Output = Result<Vec<AdminInvite>, RepositoryError>> + Send;

    /// Create an invite.
    ///
    /// Returns [`RepositoryError::Conflict`] if an invite already exists for the email.
    fn create_invite(
        &self,
        invite: &NewInvite,
    ) -> impl Future<Output = Result<AdminInvite, RepositoryError>> + Send;

    /// Withdraw a pending invite.
    fn delete_invite(&self, id: InviteId)
    -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Create `admin` from `invite` and delete the invite, atomically.
    ///
    /// On failure the invite is left in place so a later sign-in can retry.
    fn consume_invite(
        &self,
        invite: &AdminInvite,
        admin: &Admin,
    ) -> impl Future<Output = Result<Admin, RepositoryError>> + Send;
}

/// Storage for the activity log.
pub trait ActivityStore: Send + Sync {
    /// Append an entry.
    fn record_activity(
        &self,
        entry: &NewActivity,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// The most recent entries, newest first.
    fn recent_activity(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<ActivityEntry>, RepositoryError>> + Send;
}

/// The store selected at startup.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    Postgres(PgStore),
    Memory(MemoryStore),
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            Self::Postgres($store) => $call.await,
            Self::Memory($store) => $call.await,
        }
    };
}

impl StoreBackend {
    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the database does not answer.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        match self {
            Self::Postgres(store) => store.ping().await,
            Self::Memory(_) => Ok(()),
        }
    }

    /// The underlying pool, when backed by `PostgreSQL`.
    #[must_use]
    pub const fn pool(&self) -> Option<&PgPool> {
        match self {
            Self::Postgres(store) => Some(store.pool()),
            Self::Memory(_) => None,
        }
    }
}

impl AdminStore for StoreBackend {
    async fn find_admin(&self, id: &AdminId) -> Result<Option<Admin>, RepositoryError> {
        dispatch!(self, store => store.find_admin(id))
    }

    async fn find_admin_by_email(&self, email: &Email) -> Result<Option<Admin>, RepositoryError> {
        dispatch!(self, store => store.find_admin_by_email(email))
    }

    async fn list_admins(&self) -> Result<Vec<Admin>, RepositoryError> {
        dispatch!(self, store => store.list_admins())
    }

    async fn upsert_admin(&self, admin: &Admin) -> Result<Admin, RepositoryError> {
        dispatch!(self, store => store.upsert_admin(admin))
    }

    async fn update_admin_permissions(
        &self,
        id: &AdminId,
        permissions: Permissions,
    ) -> Result<Admin, RepositoryError> {
        dispatch!(self, store => store.update_admin_permissions(id, permissions))
    }

    async fn delete_admin(&self, id: &AdminId) -> Result<(), RepositoryError> {
        dispatch!(self, store => store.delete_admin(id))
    }

    async fn find_invite_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<AdminInvite>, RepositoryError> {
        dispatch!(self, store => store.find_invite_by_email(email))
    }

    async fn list_invites(&self) -> Result<Vec<AdminInvite>, RepositoryError> {
        dispatch!(self, store => store.list_invites())
    }

    async fn create_invite(&self, invite: &NewInvite) -> Result<AdminInvite, RepositoryError> {
        dispatch!(self, store => store.create_invite(invite))
    }

    async fn delete_invite(&self, id: InviteId) -> Result<(), RepositoryError> {
        dispatch!(self, store => store.delete_invite(id))
    }

    async fn consume_invite(
        &self,
        invite: &AdminInvite,
        admin: &Admin,
    ) -> Result<Admin, RepositoryError> {
        dispatch!(self, store => store.consume_invite(invite, admin))
    }
}

impl ActivityStore for StoreBackend {
    async fn record_activity(&self, entry: &NewActivity) -> Result<(), RepositoryError> {
        dispatch!(self, store => store.record_activity(entry))
    }

    async fn recent_activity(&self, limit: i64) -> Result<Vec<ActivityEntry>, RepositoryError> {
        dispatch!(self, store => store.recent_activity(limit))
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
