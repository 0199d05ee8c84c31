//! Admin identity and permission evaluation.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::permission::{Permission, Permissions};

/// Stable key of an admin record.
///
/// With provider sign-in this is the provider's user id; with the static
/// directory it is the admin's normalized email. Either way it is opaque text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdminId(String);

impl AdminId {
    /// Create an ID from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdminId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<uuid::Uuid> for AdminId {
    fn from(id: uuid::Uuid) -> Self {
        Self(id.to_string())
    }
}

impl From<&Email> for AdminId {
    fn from(email: &Email) -> Self {
        Self(email.as_str().to_owned())
    }
}

/// An authorized operator of the admin panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    /// Stable unique key.
    pub id: AdminId,
    /// Normalized email address.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Master admins hold every permission and cannot be edited or removed.
    pub is_master: bool,
    /// Per-section permissions (ignored for master admins).
    #[serde(default)]
    pub permissions: Permissions,
}

impl Admin {
    /// Whether this admin may act on the section gated by `permission`.
    #[must_use]
    pub const fn has_permission(&self, permission: Permission) -> bool {
        self.is_master || self.permissions.get(permission)
    }

    /// The permissions this admin effectively holds.
    #[must_use]
    pub fn effective_permissions(&self) -> Permissions {
        if self.is_master {
            Permissions::all()
        } else {
            self.permissions
        }
    }
}

/// Evaluate `permission` for an optional admin.
///
/// No admin means no access; a master admin bypasses the per-key check.
#[must_use]
pub fn has_permission(admin: Option<&Admin>, permission: Permission) -> bool {
    admin.is_some_and(|a| a.has_permission(permission))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn admin(is_master: bool, permissions: Permissions) -> Admin {
        Admin {
            id: AdminId::new("a1"),
            email: Email::parse("priya@nya.org").unwrap(),
            name: "Priya".to_owned(),
            is_master,
            permissions,
        }
    }

    #[test]
    fn test_no_admin_has_no_permission() {
        for permission in Permission::ALL {
            assert!(!has_permission(None, permission));
        }
    }

    #[test]
    fn test_master_overrides_every_key() {
        let master = admin(true, Permissions::none());
        for permission in Permission::ALL {
            assert!(has_permission(Some(&master), permission));
        }
        assert_eq!(master.effective_permissions(), Permissions::all());
    }

    #[test]
    fn test_non_master_reads_stored_value() {
        let a = admin(false, Permissions::from_granted([Permission::Blog]));
        assert!(has_permission(Some(&a), Permission::Blog));
        assert!(!has_permission(Some(&a), Permission::Team));
        assert_eq!(
            Permission::ALL
                .into_iter()
                .filter(|p| a.has_permission(*p))
                .collect::<Vec<_>>(),
            vec![Permission::Blog]
        );
    }

    #[test]
    fn test_admin_deserializes_partial_permissions() {
        let a: Admin = serde_json::from_str(
            r#"{"id":"x","email":"Rahul@NYA.org","name":"Rahul","is_master":false,
                "permissions":{"blog":true,"media":"true"}}"#,
        )
        .unwrap();
        assert_eq!(a.email.as_str(), "rahul@nya.org");
        assert_eq!(a.permissions, Permissions::from_granted([Permission::Blog]));
    }

    #[test]
    fn test_admin_id_from_email() {
        let email = Email::parse("Sneha@nya.org").unwrap();
        assert_eq!(AdminId::from(&email).as_str(), "sneha@nya.org");
    }
}
