//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use nya_core::{Admin, Email, Permission};

/// How long a resolution may stay in flight before it is considered abandoned.
pub const RESOLUTION_TIMEOUT_SECONDS: i64 = 30;

/// Authentication state of one browser session.
///
/// ```text
/// Loading ──► Authenticated(admin)
///    │   ──► Unrecognized { email }
///    └────► Anonymous ◄── logout
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    /// An identity resolution is in flight.
    Loading {
        /// When the resolution started.
        since: DateTime<Utc>,
    },
    /// Nobody is signed in.
    #[default]
    Anonymous,
    /// The provider verified this email, but it maps to no admin or invite.
    Unrecognized {
        /// The verified email, shown on the login page.
        email: Email,
    },
    /// A resolved admin.
    Authenticated(Admin),
}

impl SessionState {
    /// A fresh loading state.
    #[must_use]
    pub fn loading(now: DateTime<Utc>) -> Self {
        Self::Loading { since: now }
    }

    /// The current admin, if the session resolved to one.
    #[must_use]
    pub const fn current_admin(&self) -> Option<&Admin> {
        match self {
            Self::Authenticated(admin) => Some(admin),
            _ => None,
        }
    }

    /// Whether an identity resolution is still in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// Whether the session holds an admin.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.current_admin().is_some()
    }

    /// Whether the session holds a master admin.
    #[must_use]
    pub const fn is_master_admin(&self) -> bool {
        matches!(self, Self::Authenticated(admin) if admin.is_master)
    }

    /// Permission check against the current admin (none means denied).
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        nya_core::has_permission(self.current_admin(), permission)
    }

    /// Drops a loading state that has been in flight for too long.
    #[must_use]
    pub fn expire_stale(self, now: DateTime<Utc>) -> Self {
        match self {
            Self::Loading { since }
                if now - since > Duration::seconds(RESOLUTION_TIMEOUT_SECONDS) =>
            {
                tracing::warn!(%since, "Abandoning stale identity resolution");
                Self::Anonymous
            }
            other => other,
        }
    }
}

/// Tokens issued by the identity provider for one signed-in browser.
///
/// `Debug` is implemented manually to redact the tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl ProviderTokens {
    /// Whether the access token has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl std::fmt::Debug for ProviderTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Everything the session persists about authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAuth {
    pub state: SessionState,
    pub tokens: Option<ProviderTokens>,
}

/// A provider sign-in that has been started but not yet completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSignIn {
    /// PKCE code verifier.
    pub verifier: String,
    /// Where to send the admin once signed in.
    pub return_to: String,
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for the persisted [`super::StoredAuth`].
    pub const AUTH: &str = "auth";

    /// Key for the in-progress [`super::PendingSignIn`].
    pub const PENDING_SIGN_IN: &str = "pending_sign_in";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nya_core::{AdminId, Permissions};

    fn admin(is_master: bool) -> Admin {
        Admin {
            id: AdminId::new("id-1"),
            email: Email::parse("rahul@nya.org").unwrap(),
            name: "Rahul".to_owned(),
            is_master,
            permissions: Permissions::from_granted([Permission::Blog]),
        }
    }

    #[test]
    fn test_default_is_anonymous() {
        let state = SessionState::default();
        assert!(!state.is_authenticated());
        assert!(!state.is_loading());
        assert!(state.current_admin().is_none());
    }

    #[test]
    fn test_unrecognized_has_no_admin() {
        let state = SessionState::Unrecognized {
            email: Email::parse("stranger@gmail.com").unwrap(),
        };
        assert!(!state.is_authenticated());
        assert!(!state.has_permission(Permission::Blog));
    }

    #[test]
    fn test_derived_flags() {
        let state = SessionState::Authenticated(admin(false));
        assert!(state.is_authenticated());
        assert!(!state.is_master_admin());
        assert!(state.has_permission(Permission::Blog));
        assert!(!state.has_permission(Permission::Team));

        let master = SessionState::Authenticated(admin(true));
        assert!(master.is_master_admin());
        assert!(master.has_permission(Permission::Team));
    }

    #[test]
    fn test_stale_loading_expires() {
        let now = Utc::now();
        let fresh = SessionState::loading(now - Duration::seconds(5));
        assert!(fresh.clone().expire_stale(now).is_loading());

        let stale = SessionState::loading(now - Duration::seconds(RESOLUTION_TIMEOUT_SECONDS + 1));
        assert_eq!(stale.expire_stale(now), SessionState::Anonymous);
    }

    #[test]
    fn test_state_survives_serialization() {
        let stored = StoredAuth {
            state: SessionState::Authenticated(admin(false)),
            tokens: None,
        };
        let json = serde_json::to_string(&stored).unwrap();
        assert!(json.contains("\"status\":\"authenticated\""));
        assert_eq!(serde_json::from_str::<StoredAuth>(&json).unwrap(), stored);
    }

    #[test]
    fn test_tokens_debug_is_redacted() {
        let tokens = ProviderTokens {
            access_token: "secret-access".to_owned(),
            refresh_token: "secret-refresh".to_owned(),
            expires_at: Utc::now(),
        };
        let debug = format!("{tokens:?}");
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
    }
}
