//! Static admin directory.
//!
//! In directory mode the set of admins is a JSON file shipped with the
//! deployment:
//!
//! ```json
//! {
//!   "admins": [
//!     { "email": "master@nya.org", "name": "Master Admin", "isMaster": true },
//!     { "email": "priya@nya.org", "name": "Priya", "permissions": { "blog": true } }
//!   ]
//! }
//! ```
//!
//! Missing or non-boolean permission values count as denied. Each admin's id
//! is its normalized email.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use nya_core::{Admin, AdminId, Email, Permissions};

/// Message shown when a directory login is rejected.
pub const NOT_AUTHORIZED_MESSAGE: &str =
    "This email is not authorized to access the admin panel.";

/// Errors loading the directory file.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The file could not be read.
    #[error("failed to read admin directory {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid directory document.
    #[error("invalid admin directory: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two entries share an email.
    #[error("duplicate admin email in directory: {0}")]
    DuplicateEmail(Email),
}

/// Result of a directory login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The email matched an admin.
    Success(Admin),
    /// The email is not in the directory.
    Rejected {
        /// Message suitable for the login page.
        message: String,
    },
}

impl LoginOutcome {
    fn rejected() -> Self {
        Self::Rejected {
            message: NOT_AUTHORIZED_MESSAGE.to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectoryFile {
    admins: Vec<DirectoryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectoryEntry {
    email: Email,
    name: String,
    #[serde(default)]
    is_master: bool,
    #[serde(default)]
    permissions: Permissions,
}

/// The admins allowed to sign in in directory mode.
#[derive(Debug, Clone, Default)]
pub struct AdminDirectory {
    admins: Vec<Admin>,
}

impl AdminDirectory {
    /// Build a directory from admin records.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError::DuplicateEmail` if two admins share an email.
    pub fn new(admins: Vec<Admin>) -> Result<Self, DirectoryError> {
        let mut seen = HashSet::with_capacity(admins.len());
        if let Some(duplicate) = admins.iter().find(|a| !seen.insert(&a.email)) {
            return Err(DirectoryError::DuplicateEmail(duplicate.email.clone()));
        }
        Ok(Self { admins })
    }

    /// Parse a directory document.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` if the JSON is invalid or contains duplicates.
    pub fn from_json(json: &str) -> Result<Self, DirectoryError> {
        let file: DirectoryFile = serde_json::from_str(json)?;
        let admins = file
            .admins
            .into_iter()
            .map(|entry| Admin {
                id: AdminId::from(&entry.email),
                email: entry.email,
                name: entry.name,
                is_master: entry.is_master,
                permissions: entry.permissions,
            })
            .collect();
        Self::new(admins)
    }

    /// Read and parse the directory file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let json = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Every admin in file order.
    #[must_use]
    pub fn admins(&self) -> &[Admin] {
        &self.admins
    }

    /// Look up an admin by normalized email.
    #[must_use]
    pub fn find(&self, email: &Email) -> Option<&Admin> {
        self.admins.iter().find(|a| &a.email == email)
    }

    /// Match a typed email against the directory.
    ///
    /// Case and surrounding whitespace are ignored. Unparsable input is
    /// rejected the same way as an unknown address.
    #[must_use]
    pub fn authenticate(&self, email: &str) -> LoginOutcome {
        Email::parse(email)
            .ok()
            .and_then(|email| self.find(&email))
            .map_or_else(LoginOutcome::rejected, |admin| {
                LoginOutcome::Success(admin.clone())
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nya_core::Permission;

    const DIRECTORY: &str = r#"{
        "admins": [
            { "email": "master@nya.org", "name": "Master Admin", "isMaster": true },
            { "email": "Priya@NYA.org", "name": "Priya",
              "permissions": { "blog": true, "team": "yes" } }
        ]
    }"#;

    #[test]
    fn test_from_json_normalizes_entries() {
        let directory = AdminDirectory::from_json(DIRECTORY).unwrap();
        let priya = directory.find(&Email::parse("priya@nya.org").unwrap()).unwrap();

        assert_eq!(priya.id.as_str(), "priya@nya.org");
        assert_eq!(priya.permissions, Permissions::from_granted([Permission::Blog]));
        assert!(!priya.is_master);
    }

    #[test]
    fn test_authenticate_is_case_insensitive() {
        let directory = AdminDirectory::from_json(DIRECTORY).unwrap();
        let LoginOutcome::Success(admin) = directory.authenticate("  MASTER@nya.org ") else {
            panic!("expected success");
        };
        assert!(admin.is_master);
    }

    #[test]
    fn test_authenticate_rejects_unknown_and_invalid() {
        let directory = AdminDirectory::from_json(DIRECTORY).unwrap();
        let expected = LoginOutcome::Rejected {
            message: NOT_AUTHORIZED_MESSAGE.to_owned(),
        };
        assert_eq!(directory.authenticate("stranger@gmail.com"), expected);
        assert_eq!(directory.authenticate("not-an-email"), expected);
        assert_eq!(directory.authenticate(""), expected);
    }

    #[test]
    fn test_duplicate_emails_are_rejected() {
        let json = r#"{ "admins": [
            { "email": "a@nya.org", "name": "A" },
            { "email": "A@nya.org", "name": "A again" }
        ] }"#;
        assert!(matches!(
            AdminDirectory::from_json(json),
            Err(DirectoryError::DuplicateEmail(_))
        ));
    }
}
