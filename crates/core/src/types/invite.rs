//! Pending admin invites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::InviteId;
use super::permission::Permissions;

/// A one-time grant of admin status for an email address.
///
/// Created by a master admin, consumed by the first sign-in whose verified
/// email matches, and deleted as part of that consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminInvite {
    /// Row ID.
    pub id: InviteId,
    /// Normalized email the invite is for.
    pub email: Email,
    /// Display name to fall back on when the provider supplies none.
    pub name: Option<String>,
    /// Whether the resulting admin is a master admin.
    pub is_master: bool,
    /// Permissions copied onto the resulting admin.
    #[serde(default)]
    pub permissions: Permissions,
    /// When the invite was created.
    pub created_at: DateTime<Utc>,
}

impl AdminInvite {
    /// Pick the display name for the admin created from this invite.
    ///
    /// Prefers the name reported by the identity provider, then the name
    /// recorded on the invite, then the email address.
    #[must_use]
    pub fn display_name(&self, provider_name: Option<&str>) -> String {
        provider_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .or_else(|| self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()))
            .map_or_else(|| self.email.to_string(), str::to_owned)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn invite(name: Option<&str>) -> AdminInvite {
        AdminInvite {
            id: InviteId::new(1),
            email: Email::parse("new@nya.org").unwrap(),
            name: name.map(str::to_owned),
            is_master: false,
            permissions: Permissions::none(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_prefers_provider() {
        assert_eq!(invite(Some("Invite Name")).display_name(Some("Google Name")), "Google Name");
    }

    #[test]
    fn test_display_name_falls_back_to_invite_then_email() {
        assert_eq!(invite(Some("Invite Name")).display_name(Some("  ")), "Invite Name");
        assert_eq!(invite(None).display_name(None), "new@nya.org");
    }
}
