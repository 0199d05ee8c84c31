//! The closed set of admin permissions.
//!
//! Each administrable section of the panel is gated by exactly one
//! [`Permission`]. A [`Permissions`] record carries one boolean per key and
//! always has every key present: payloads coming from the database or a JSON
//! file are coerced on the way in, so nothing downstream ever sees a partial
//! record.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Error returned when a string is not a known permission key.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown permission key: {0}")]
pub struct PermissionParseError(pub String);

/// A named capability gating one administrable section.
///
/// The wire name (see [`Permission::key`]) is the camelCase key used in stored
/// permission JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    /// Home page content.
    HomeManager,
    /// Journey / timeline entries.
    JourneyManager,
    /// Team members.
    Team,
    /// Chapters.
    Chapters,
    /// Photos, videos, press and podcasts.
    Media,
    /// Resources.
    Resources,
    /// Blog posts.
    Blog,
    /// Join requests.
    JoinRequests,
    /// Issue reports.
    Reports,
    /// Activity logs.
    Logs,
    /// Admin accounts.
    Admins,
    /// Site-wide settings.
    Settings,
}

impl Permission {
    /// Every permission, in navigation order.
    pub const ALL: [Self; 12] = [
        Self::HomeManager,
        Self::JourneyManager,
        Self::Team,
        Self::Chapters,
        Self::Media,
        Self::Resources,
        Self::Blog,
        Self::JoinRequests,
        Self::Reports,
        Self::Logs,
        Self::Admins,
        Self::Settings,
    ];

    /// The stored key for this permission.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::HomeManager => "homeManager",
            Self::JourneyManager => "journeyManager",
            Self::Team => "team",
            Self::Chapters => "chapters",
            Self::Media => "media",
            Self::Resources => "resources",
            Self::Blog => "blog",
            Self::JoinRequests => "joinRequests",
            Self::Reports => "reports",
            Self::Logs => "logs",
            Self::Admins => "admins",
            Self::Settings => "settings",
        }
    }

    /// Human-readable label shown in the admin UI.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HomeManager => "Home Manager",
            Self::JourneyManager => "Journey Manager",
            Self::Team => "Team",
            Self::Chapters => "Chapters",
            Self::Media => "Media",
            Self::Resources => "Resources",
            Self::Blog => "Blog",
            Self::JoinRequests => "Join Requests",
            Self::Reports => "Reports",
            Self::Logs => "Activity Logs",
            Self::Admins => "Admins Manager",
            Self::Settings => "Settings",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Permission {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.key() == s)
            .ok_or_else(|| PermissionParseError(s.to_owned()))
    }
}

/// One boolean per [`Permission`].
///
/// Deserialization is lenient: missing keys,
/// unknown keys and non-boolean values all end up as `false` rather than an
/// error. Serialization always writes all twelve keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct Permissions {
    pub home_manager: bool,
    pub journey_manager: bool,
    pub team: bool,
    pub chapters: bool,
    pub media: bool,
    pub resources: bool,
    pub blog: bool,
    pub join_requests: bool,
    pub reports: bool,
    pub logs: bool,
    pub admins: bool,
    pub settings: bool,
}

impl Permissions {
    /// A record with every permission denied.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// A record with every permission granted.
    #[must_use]
    pub fn all() -> Self {
        Self::from_granted(Permission::ALL)
    }

    /// Build a record granting exactly the given permissions.
    #[must_use]
    pub fn from_granted(granted: impl IntoIterator<Item = Permission>) -> Self {
        let mut permissions = Self::none();
        for permission in granted {
            permissions.set(permission, true);
        }
        permissions
    }

    /// Returns the stored value for `permission`.
    #[must_use]
    pub const fn get(&self, permission: Permission) -> bool {
        match permission {
            Permission::HomeManager => self.home_manager,
            Permission::JourneyManager => self.journey_manager,
            Permission::Team => self.team,
            Permission::Chapters => self.chapters,
            Permission::Media => self.media,
            Permission::Resources => self.resources,
            Permission::Blog => self.blog,
            Permission::JoinRequests => self.join_requests,
            Permission::Reports => self.reports,
            Permission::Logs => self.logs,
            Permission::Admins => self.admins,
            Permission::Settings => self.settings,
        }
    }

    /// Sets the value for `permission`.
    pub fn set(&mut self, permission: Permission, value: bool) {
        let slot = match permission {
            Permission::HomeManager => &mut self.home_manager,
            Permission::JourneyManager => &mut self.journey_manager,
            Permission::Team => &mut self.team,
            Permission::Chapters => &mut self.chapters,
            Permission::Media => &mut self.media,
            Permission::Resources => &mut self.resources,
            Permission::Blog => &mut self.blog,
            Permission::JoinRequests => &mut self.join_requests,
            Permission::Reports => &mut self.reports,
            Permission::Logs => &mut self.logs,
            Permission::Admins => &mut self.admins,
            Permission::Settings => &mut self.settings,
        };
        *slot = value;
    }

    /// Iterates over the granted permissions in declaration order.
    pub fn granted(&self) -> impl Iterator<Item = Permission> + '_ {
        Permission::ALL.into_iter().filter(|p| self.get(*p))
    }

    /// Coerces an arbitrary JSON value into a complete record.
    ///
    /// Only a literal `true` grants a permission.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::none();
        };
        Self::from_granted(
            Permission::ALL
                .into_iter()
                .filter(|p| map.get(p.key()).and_then(Value::as_bool) == Some(true)),
        )
    }

    /// Converts the record into a JSON object containing every key.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = Permission::ALL
            .into_iter()
            .map(|p| (p.key().to_owned(), Value::Bool(self.get(p))))
            .collect();
        Value::Object(map)
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

impl FromIterator<Permission> for Permissions {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self::from_granted(iter)
    }
}
