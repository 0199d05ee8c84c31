//! Admin management commands.
//!
//! # Usage
//!
//! ```bash
//! # Invite the first master admin
//! nya-cli admin invite -e founder@nya.org -n "Founder" --master
//!
//! # Invite a sub-admin with two sections
//! nya-cli admin invite -e priya@nya.org -p blog,team
//!
//! # List admins and pending invites
//! nya-cli admin list
//! ```
//!
//! An invite turns into an admin on the invitee's first Google sign-in.

use nya_admin::db::{AdminStore, NewInvite, PgStore, RepositoryError};
use nya_core::{Email, Permission, Permissions};

use super::{CommandError, connect};

/// Parse permission keys given on the command line.
///
/// # Errors
///
/// Returns `CommandError::InvalidPermission` for an unknown key.
pub fn parse_permissions(keys: &[String]) -> Result<Permissions, CommandError> {
    keys.iter()
        .map(|key| key.parse::<Permission>().map_err(CommandError::from))
        .collect()
}

/// Create an invite for a new admin.
///
/// # Errors
///
/// Returns `CommandError` if the email is invalid, already belongs to an admin,
/// already has a pending invite, or the database fails.
pub async fn invite(
    email: &str,
    name: Option<String>,
    is_master: bool,
    permission_keys: &[String],
) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let permissions = parse_permissions(permission_keys)?;

    let store = PgStore::new(connect().await?);

    if store.find_admin_by_email(&email).await?.is_some() {
        return Err(CommandError::AdminExists(email.into_inner()));
    }

    let invite = store
        .create_invite(&NewInvite {
            email,
            name,
            is_master,
            permissions,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                RepositoryError::Conflict("an invite for this email is already pending".to_owned())
            }
            other => other,
        })?;

    let granted: Vec<_> = invite.permissions.granted().map(Permission::key).collect();
    tracing::info!("Invite created!");
    tracing::info!("  Email: {}", invite.email);
    tracing::info!("  Master: {}", invite.is_master);
    tracing::info!("  Permissions: {}", granted.join(", "));
    tracing::info!("The invite is used on the first sign-in with this email.");

    Ok(())
}

/// Log every admin and pending invite.
///
/// # Errors
///
/// Returns `CommandError` if the database fails.
pub async fn list() -> Result<(), CommandError> {
    let store = PgStore::new(connect().await?);

    let admins = store.list_admins().await?;
    tracing::info!("{} admin(s)", admins.len());
    for admin in &admins {
        let access = if admin.is_master {
            "master".to_owned()
        } else {
            admin
                .permissions
                .granted()
                .map(Permission::key)
                .collect::<Vec<_>>()
                .join(",")
        };
        tracing::info!("  {} <{}> [{}]", admin.name, admin.email, access);
    }

    let invites = store.list_invites().await?;
    tracing::info!("{} pending invite(s)", invites.len());
    for invite in &invites {
        tracing::info!(
            "  {} (created {}, master: {})",
            invite.email,
            invite.created_at.format("%Y-%m-%d"),
            invite.is_master
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_permissions() {
        let keys = vec!["blog".to_owned(), " team ".to_owned()];
        let permissions = parse_permissions(&keys).unwrap_or_default();
        assert_eq!(
            permissions,
            Permissions::from_granted([Permission::Blog, Permission::Team])
        );
    }

    #[test]
    fn test_parse_permissions_rejects_unknown_key() {
        let keys = vec!["blog".to_owned(), "billing".to_owned()];
        assert!(matches!(
            parse_permissions(&keys),
            Err(CommandError::InvalidPermission(_))
        ));
    }
}
