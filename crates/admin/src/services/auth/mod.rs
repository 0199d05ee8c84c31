//! Per-session authentication context.
//!
//! [`AuthContext`] is the only code that writes authentication state to the
//! session. Handlers and middleware extract it, read the derived flags, and
//! call its operations for sign-in, refresh and logout.

mod error;

pub use error::AuthError;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use tower_sessions::Session;

use nya_core::{Admin, Permission};

use super::directory::{AdminDirectory, LoginOutcome};
use super::identity::{AuthEvent, IdentityResolver};
use super::provider::SupabaseAuth;
use crate::db::AdminStore;
use crate::error::AppError;
use crate::models::session::keys;
use crate::models::{PendingSignIn, ProviderTokens, SessionState, StoredAuth};

/// Authentication state of the current browser session.
///
/// Loaded from the session on extraction. A resolution left in flight for
/// too long is treated as anonymous.
#[derive(Debug, Clone)]
pub struct AuthContext {
    session: Session,
    stored: StoredAuth,
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthError::MissingSession)?;

        Ok(Self::load(session).await)
    }
}

impl AuthContext {
    /// Restore the context from `session`.
    ///
    /// Unreadable state is logged and treated as anonymous.
    pub async fn load(session: Session) -> Self {
        let stored = match session.get::<StoredAuth>(keys::AUTH).await {
            Ok(stored) => stored.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable auth state");
                StoredAuth::default()
            }
        };

        Self {
            session,
            stored: StoredAuth {
                state: stored.state.expire_stale(Utc::now()),
                tokens: stored.tokens,
            },
        }
    }

    // =========================================================================
    // Readers
    // =========================================================================

    /// The current session state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.stored.state
    }

    /// The signed-in admin, if any.
    #[must_use]
    pub const fn current_admin(&self) -> Option<&Admin> {
        self.stored.state.current_admin()
    }

    /// Whether an admin is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.stored.state.is_authenticated()
    }

    /// Whether a resolution is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.stored.state.is_loading()
    }

    /// Whether the signed-in admin is a master admin.
    #[must_use]
    pub const fn is_master_admin(&self) -> bool {
        self.stored.state.is_master_admin()
    }

    /// Permission check for the signed-in admin.
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.stored.state.has_permission(permission)
    }

    /// Provider tokens held for this session.
    #[must_use]
    pub const fn provider_tokens(&self) -> Option<&ProviderTokens> {
        self.stored.tokens.as_ref()
    }

    // =========================================================================
    // Provider sign-in
    // =========================================================================

    /// Apply a provider auth event.
    ///
    /// Marks the session as loading while the event is resolved, then stores
    /// the outcome with `tokens`. The session id is rotated when an admin is
    /// signed in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session store fails.
    pub async fn resolve<S: AdminStore>(
        &mut self,
        resolver: &IdentityResolver<'_, S>,
        event: &AuthEvent,
        tokens: Option<ProviderTokens>,
    ) -> Result<&SessionState, AuthError> {
        self.stored.state = SessionState::loading(Utc::now());
        self.persist().await?;
        self.session.save().await?;

        let state = resolver.resolve(event).await;
        let signed_in = state.is_authenticated();

        self.stored = StoredAuth {
            tokens: match state {
                SessionState::Anonymous => None,
                _ => tokens,
            },
            state,
        };

        if signed_in {
            self.session.cycle_id().await?;
        }
        self.persist().await?;

        Ok(&self.stored.state)
    }

    /// Refresh the provider session when the access token has expired.
    ///
    /// A failed refresh signs the session out.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session store fails.
    pub async fn refresh_if_expired<S: AdminStore>(
        &mut self,
        provider: &SupabaseAuth,
        resolver: &IdentityResolver<'_, S>,
    ) -> Result<(), AuthError> {
        let Some(tokens) = self.stored.tokens.as_ref() else {
            return Ok(());
        };
        if !tokens.is_expired(Utc::now()) {
            return Ok(());
        }

        let refreshed = provider.refresh(&tokens.refresh_token).await;
        match refreshed {
            Ok(refreshed) => {
                tracing::debug!(admin_id = %refreshed.identity.id, "Provider session refreshed");
                let event = AuthEvent::TokenRefreshed(refreshed.identity);
                self.resolve(resolver, &event, Some(refreshed.tokens)).await?;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Provider token refresh failed, signing out");
                self.resolve(resolver, &AuthEvent::SignedOut, None).await?;
            }
        }

        Ok(())
    }

    /// Re-read the signed-in admin from `store`.
    ///
    /// A removed admin signs the session out; changed permissions or master
    /// status replace the stored copy. Store errors are logged and sign the
    /// session out.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session store fails.
    pub async fn reload_admin<S: AdminStore>(&mut self, store: &S) -> Result<(), AuthError> {
        let Some(admin) = self.current_admin() else {
            return Ok(());
        };

        let state = match store.find_admin(&admin.id).await {
            Ok(Some(fresh)) if &fresh == admin => return Ok(()),
            Ok(Some(fresh)) => {
                tracing::info!(admin_id = %fresh.id, "Admin record changed, updating session");
                SessionState::Authenticated(fresh)
            }
            Ok(None) => {
                tracing::info!(admin_id = %admin.id, "Admin no longer exists, signing out");
                SessionState::Anonymous
            }
            Err(e) => {
                tracing::error!(error = %e, admin_id = %admin.id, "Failed to reload admin");
                SessionState::Anonymous
            }
        };

        if !state.is_authenticated() {
            self.stored.tokens = None;
        }
        self.stored.state = state;
        self.persist().await
    }

    /// Remember an in-progress provider sign-in until the callback.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session store fails.
    pub async fn remember_sign_in(&self, pending: &PendingSignIn) -> Result<(), AuthError> {
        self.session.insert(keys::PENDING_SIGN_IN, pending).await?;
        Ok(())
    }

    /// Take the in-progress provider sign-in, if any.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session store fails.
    pub async fn take_sign_in(&self) -> Result<Option<PendingSignIn>, AuthError> {
        Ok(self.session.remove(keys::PENDING_SIGN_IN).await?)
    }

    // =========================================================================
    // Directory sign-in
    // =========================================================================

    /// Sign in by email against the static directory.
    ///
    /// On rejection the session is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session store fails.
    pub async fn login_with_directory(
        &mut self,
        directory: &AdminDirectory,
        email: &str,
    ) -> Result<LoginOutcome, AuthError> {
        let outcome = directory.authenticate(email);

        if let LoginOutcome::Success(admin) = &outcome {
            self.stored = StoredAuth {
                state: SessionState::Authenticated(admin.clone()),
                tokens: None,
            };
            self.session.cycle_id().await?;
            self.persist().await?;
        }

        Ok(outcome)
    }

    // =========================================================================
    // Logout
    // =========================================================================

    /// Clear the session.
    ///
    /// Never fails: storage errors are logged. Returns what the session held so
    /// the caller can revoke provider tokens and record the logout.
    pub async fn logout(&mut self) -> StoredAuth {
        let previous = std::mem::take(&mut self.stored);

        if let Err(e) = self.session.flush().await {
            tracing::error!(error = %e, "Failed to clear admin session");
        }

        previous
    }

    async fn persist(&self) -> Result<(), AuthError> {
        self.session.insert(keys::AUTH, &self.stored).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::{MemoryStore, NewInvite};
    use crate::services::provider::ExternalIdentity;
    use nya_core::{AdminId, Email, Permissions};

    const DIRECTORY: &str = r#"{ "admins": [
        { "email": "master@nya.org", "name": "Master Admin", "isMaster": true },
        { "email": "rahul@nya.org", "name": "Rahul", "permissions": { "blog": true } }
    ] }"#;

    fn session() -> Session {
        Session::new(None, Arc::new(tower_sessions::MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_fresh_session_is_anonymous() {
        let auth = AuthContext::load(session()).await;
        assert_eq!(auth.state(), &SessionState::Anonymous);
        assert!(!auth.is_authenticated());
        assert!(!auth.is_loading());
    }

    #[tokio::test]
    async fn test_directory_login_persists() {
        let directory = AdminDirectory::from_json(DIRECTORY).unwrap();
        let session = session();
        let mut auth = AuthContext::load(session.clone()).await;

        let outcome = auth.login_with_directory(&directory, "MASTER@nya.org").await.unwrap();
        assert!(matches!(outcome, LoginOutcome::Success(_)));
        assert!(auth.is_master_admin());

        // A later request on the same session sees the admin.
        let restored = AuthContext::load(session).await;
        assert!(restored.is_master_admin());
        assert_eq!(
            restored.current_admin().map(|a| a.email.as_str()),
            Some("master@nya.org")
        );
    }

    #[tokio::test]
    async fn test_rejected_directory_login_leaves_state() {
        let directory = AdminDirectory::from_json(DIRECTORY).unwrap();
        let mut auth = AuthContext::load(session()).await;

        let outcome = auth.login_with_directory(&directory, "nobody@nya.org").await.unwrap();
        assert!(matches!(outcome, LoginOutcome::Rejected { .. }));
        assert_eq!(auth.state(), &SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_logout_clears_state() {
        let directory = AdminDirectory::from_json(DIRECTORY).unwrap();
        let session = session();
        let mut auth = AuthContext::load(session.clone()).await;
        auth.login_with_directory(&directory, "rahul@nya.org").await.unwrap();

        let previous = auth.logout().await;
        assert!(previous.state.is_authenticated());
        assert!(!auth.is_authenticated());
        assert!(!AuthContext::load(session).await.is_authenticated());
    }

    #[tokio::test]
    async fn test_resolve_consumes_invite_and_keeps_tokens() {
        let store = MemoryStore::new();
        store
            .create_invite(&NewInvite {
                email: Email::parse("new@nya.org").unwrap(),
                name: None,
                is_master: false,
                permissions: Permissions::from_granted([Permission::Reports]),
            })
            .await
            .unwrap();

        let tokens = ProviderTokens {
            access_token: "at".to_owned(),
            refresh_token: "rt".to_owned(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        };
        let event = AuthEvent::SignedIn(ExternalIdentity {
            id: AdminId::new("uid-7"),
            email: Email::parse("new@nya.org").unwrap(),
            name: Some("New Admin".to_owned()),
        });

        let mut auth = AuthContext::load(session()).await;
        let resolver = IdentityResolver::new(&store);
        auth.resolve(&resolver, &event, Some(tokens.clone())).await.unwrap();

        assert!(auth.has_permission(Permission::Reports));
        assert!(!auth.has_permission(Permission::Blog));
        assert_eq!(auth.provider_tokens(), Some(&tokens));
    }

    #[tokio::test]
    async fn test_signed_out_event_drops_tokens() {
        let store = MemoryStore::new();
        let mut auth = AuthContext::load(session()).await;
        let resolver = IdentityResolver::new(&store);

        let tokens = ProviderTokens {
            access_token: "at".to_owned(),
            refresh_token: "rt".to_owned(),
            expires_at: Utc::now(),
        };
        auth.resolve(&resolver, &AuthEvent::SignedOut, Some(tokens)).await.unwrap();

        assert_eq!(auth.state(), &SessionState::Anonymous);
        assert!(auth.provider_tokens().is_none());
    }

    fn provider_admin(granted: &[Permission]) -> Admin {
        Admin {
            id: AdminId::new("uid-9"),
            email: Email::parse("priya@nya.org").unwrap(),
            name: "Priya".to_owned(),
            is_master: false,
            permissions: granted.iter().copied().collect(),
        }
    }

    async fn signed_in(store: &MemoryStore, session: Session) -> AuthContext {
        let mut auth = AuthContext::load(session).await;
        let event = AuthEvent::SignedIn(ExternalIdentity {
            id: AdminId::new("uid-9"),
            email: Email::parse("priya@nya.org").unwrap(),
            name: None,
        });
        auth.resolve(&IdentityResolver::new(store), &event, None).await.unwrap();
        assert!(auth.has_permission(Permission::Blog));
        auth
    }

    #[tokio::test]
    async fn test_reload_picks_up_permission_changes() {
        let store = MemoryStore::with_admins([provider_admin(&[Permission::Blog])]);
        let session = session();
        let mut auth = signed_in(&store, session.clone()).await;

        store
            .update_admin_permissions(
                &AdminId::new("uid-9"),
                Permissions::from_granted([Permission::Team]),
            )
            .await
            .unwrap();
        auth.reload_admin(&store).await.unwrap();

        assert!(!auth.has_permission(Permission::Blog));
        assert!(auth.has_permission(Permission::Team));
        assert!(AuthContext::load(session).await.has_permission(Permission::Team));
    }

    #[tokio::test]
    async fn test_reload_signs_out_removed_admin() {
        let store = MemoryStore::with_admins([provider_admin(&[Permission::Blog])]);
        let session = session();
        let mut auth = signed_in(&store, session.clone()).await;

        store.delete_admin(&AdminId::new("uid-9")).await.unwrap();
        auth.reload_admin(&store).await.unwrap();

        assert_eq!(auth.state(), &SessionState::Anonymous);
        assert!(!AuthContext::load(session).await.is_authenticated());
    }

    #[tokio::test]
    async fn test_reload_without_admin_is_noop() {
        let store = MemoryStore::new();
        let mut auth = AuthContext::load(session()).await;

        auth.reload_admin(&store).await.unwrap();

        assert_eq!(auth.state(), &SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_pending_sign_in_is_taken_once() {
        let auth = AuthContext::load(session()).await;
        let pending = PendingSignIn {
            verifier: "v".to_owned(),
            return_to: "/admin/blog".to_owned(),
        };
        auth.remember_sign_in(&pending).await.unwrap();

        assert_eq!(auth.take_sign_in().await.unwrap(), Some(pending));
        assert_eq!(auth.take_sign_in().await.unwrap(), None);
    }
}
