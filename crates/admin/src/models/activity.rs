//! Activity log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nya_core::ActivityLogId;

/// A recorded admin action, as listed on the activity page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: ActivityLogId,
    /// Display name of the admin who acted.
    pub admin_name: String,
    /// Panel section the action happened in (e.g. "Admins").
    pub page: String,
    /// What was done (e.g. "Updated", "Signed in").
    pub action: String,
    /// Which field or record was affected.
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An action about to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub admin_name: String,
    pub page: String,
    pub action: String,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl NewActivity {
    /// An action without before/after values.
    #[must_use]
    pub fn new(
        admin_name: impl Into<String>,
        page: impl Into<String>,
        action: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            admin_name: admin_name.into(),
            page: page.into(),
            action: action.into(),
            field: field.into(),
            old_value: None,
            new_value: None,
        }
    }

    /// Attach the value before and after the change.
    #[must_use]
    pub fn with_change(mut self, old: Option<String>, new: Option<String>) -> Self {
        self.old_value = old;
        self.new_value = new;
        self
    }
}
