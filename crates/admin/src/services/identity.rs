//! Mapping verified identities to admins.
//!
//! Every provider auth event is resolved here into the [`SessionState`] the
//! session should hold next. Resolution never fails outward: store errors are
//! logged and collapse to [`SessionState::Anonymous`].

use nya_core::Admin;

use super::provider::ExternalIdentity;
use crate::db::{AdminStore, RepositoryError};
use crate::models::SessionState;

/// An authentication event reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A sign-in completed.
    SignedIn(ExternalIdentity),
    /// The provider session was refreshed.
    TokenRefreshed(ExternalIdentity),
    /// The provider session ended.
    SignedOut,
}

impl AuthEvent {
    /// The identity carried by the event, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&ExternalIdentity> {
        match self {
            Self::SignedIn(identity) | Self::TokenRefreshed(identity) => Some(identity),
            Self::SignedOut => None,
        }
    }
}

/// Resolves auth events against an [`AdminStore`].
#[derive(Debug)]
pub struct IdentityResolver<'a, S> {
    store: &'a S,
}

impl<'a, S: AdminStore> IdentityResolver<'a, S> {
    /// Create a resolver over `store`.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Decide the session state that follows `event`.
    pub async fn resolve(&self, event: &AuthEvent) -> SessionState {
        let Some(identity) = event.identity() else {
            return SessionState::Anonymous;
        };

        match self.resolve_identity(identity).await {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    admin_id = %identity.id,
                    "Failed to resolve admin identity"
                );
                SessionState::Anonymous
            }
        }
    }

    async fn resolve_identity(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<SessionState, RepositoryError> {
        if let Some(admin) = self.store.find_admin(&identity.id).await? {
            return Ok(SessionState::Authenticated(admin));
        }

        let Some(invite) = self.store.find_invite_by_email(&identity.email).await? else {
            tracing::info!(email = %identity.email, "Sign-in without admin record or invite");
            return Ok(SessionState::Unrecognized {
                email: identity.email.clone(),
            });
        };

        let admin = Admin {
            id: identity.id.clone(),
            email: identity.email.clone(),
            name: invite.display_name(identity.name.as_deref()),
            is_master: invite.is_master,
            permissions: invite.permissions,
        };
        let admin = self.store.consume_invite(&invite, &admin).await?;

        tracing::info!(
            admin_id = %admin.id,
            email = %admin.email,
            is_master = admin.is_master,
            "Invite consumed, admin created"
        );

        Ok(SessionState::Authenticated(admin))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, NewInvite};
    use nya_core::{AdminId, Email, Permission, Permissions};

    fn identity(id: &str, email: &str, name: Option<&str>) -> ExternalIdentity {
        ExternalIdentity {
            id: AdminId::new(id),
            email: Email::parse(email).unwrap(),
            name: name.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn test_signed_out_is_anonymous() {
        let store = MemoryStore::new();
        let state = IdentityResolver::new(&store).resolve(&AuthEvent::SignedOut).await;
        assert_eq!(state, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_existing_admin_is_authenticated() {
        let admin = Admin {
            id: AdminId::new("uid-1"),
            email: Email::parse("priya@nya.org").unwrap(),
            name: "Priya".to_owned(),
            is_master: false,
            permissions: Permissions::from_granted([Permission::Blog]),
        };
        let store = MemoryStore::with_admins([admin.clone()]);

        let event = AuthEvent::TokenRefreshed(identity("uid-1", "priya@nya.org", None));
        let state = IdentityResolver::new(&store).resolve(&event).await;
        assert_eq!(state, SessionState::Authenticated(admin));
    }

    #[tokio::test]
    async fn test_unknown_identity_is_unrecognized() {
        let store = MemoryStore::new();
        let event = AuthEvent::SignedIn(identity("uid-9", "stranger@gmail.com", None));

        let state = IdentityResolver::new(&store).resolve(&event).await;
        assert_eq!(
            state,
            SessionState::Unrecognized {
                email: Email::parse("stranger@gmail.com").unwrap()
            }
        );
        assert!(state.current_admin().is_none());
    }

    #[tokio::test]
    async fn test_invite_is_consumed_once() {
        let store = MemoryStore::new();
        store
            .create_invite(&NewInvite {
                email: Email::parse("new@nya.org").unwrap(),
                name: Some("Invited Name".to_owned()),
                is_master: false,
                permissions: Permissions::from_granted([Permission::Media]),
            })
            .await
            .unwrap();

        let event = AuthEvent::SignedIn(identity("uid-2", "New@NYA.org", None));
        let resolver = IdentityResolver::new(&store);

        let SessionState::Authenticated(admin) = resolver.resolve(&event).await else {
            panic!("expected authenticated state");
        };
        assert_eq!(admin.name, "Invited Name");
        assert!(admin.has_permission(Permission::Media));
        assert!(!admin.has_permission(Permission::Blog));

        // Second sign-in finds the admin directly.
        assert_eq!(
            resolver.resolve(&event).await,
            SessionState::Authenticated(admin)
        );
        assert!(store.list_invites().await.unwrap().is_empty());
        assert_eq!(store.list_admins().await.unwrap().len(), 1);
    }
}
