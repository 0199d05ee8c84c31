//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::{AdminConfig, AuthMode};
use crate::db::{PgStore, StoreBackend};
use crate::services::{
    AdminDirectory, DirectoryError, IdentityResolver, ProviderError, SupabaseAuth,
};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("auth provider client: {0}")]
    Provider(#[from] ProviderError),
    #[error("admin directory: {0}")]
    Directory(#[from] DirectoryError),
}

/// The identity backend selected by [`AuthMode`].
#[derive(Debug, Clone)]
pub enum AuthBackend {
    Provider(SupabaseAuth),
    Directory(AdminDirectory),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the store and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    store: StoreBackend,
    auth: AuthBackend,
}

impl AppState {
    /// Create a new application state from its parts.
    #[must_use]
    pub fn new(config: AdminConfig, store: StoreBackend, auth: AuthBackend) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                auth,
            }),
        }
    }

    /// Build the production state: `PostgreSQL` store plus the configured auth backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider client cannot be built or the
    /// directory file cannot be loaded.
    pub fn from_config(config: AdminConfig, pool: PgPool) -> Result<Self, StateError> {
        let auth = match &config.auth {
            AuthMode::Provider(supabase) => AuthBackend::Provider(SupabaseAuth::new(supabase)?),
            AuthMode::Directory { path } => {
                let directory = AdminDirectory::load(path)?;
                tracing::info!(
                    admins = directory.admins().len(),
                    path = %path.display(),
                    "Admin directory loaded"
                );
                AuthBackend::Directory(directory)
            }
        };

        Ok(Self::new(config, StoreBackend::Postgres(PgStore::new(pool)), auth))
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the admin store.
    #[must_use]
    pub fn store(&self) -> &StoreBackend {
        &self.inner.store
    }

    /// The auth provider client, in provider mode.
    #[must_use]
    pub fn provider(&self) -> Option<&SupabaseAuth> {
        match &self.inner.auth {
            AuthBackend::Provider(provider) => Some(provider),
            AuthBackend::Directory(_) => None,
        }
    }

    /// The static admin directory, in directory mode.
    #[must_use]
    pub fn directory(&self) -> Option<&AdminDirectory> {
        match &self.inner.auth {
            AuthBackend::Directory(directory) => Some(directory),
            AuthBackend::Provider(_) => None,
        }
    }

    /// Identity resolver over the shared store.
    #[must_use]
    pub fn resolver(&self) -> IdentityResolver<'_, StoreBackend> {
        IdentityResolver::new(&self.inner.store)
    }
}
