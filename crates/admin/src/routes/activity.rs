//! Activity log route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, routing::get};
use tracing::instrument;

use crate::components::ShellView;
use crate::db::ActivityStore;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::ActivityEntry;
use crate::state::AppState;

/// Entries shown on the activity log page.
const LOG_PAGE_SIZE: i64 = 100;

/// Activity entry for templates.
#[derive(Debug, Clone)]
pub struct ActivityView {
    pub admin_name: String,
    pub page: String,
    pub action: String,
    pub field: String,
    pub change: Option<String>,
    pub time: String,
}

impl From<&ActivityEntry> for ActivityView {
    fn from(entry: &ActivityEntry) -> Self {
        let change = match (&entry.old_value, &entry.new_value) {
            (None, None) => None,
            (old, new) => Some(format!(
                "{} → {}",
                old.as_deref().unwrap_or("(none)"),
                new.as_deref().unwrap_or("(none)")
            )),
        };

        Self {
            admin_name: entry.admin_name.clone(),
            page: entry.page.clone(),
            action: entry.action.clone(),
            field: entry.field.clone(),
            change,
            time: entry.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        }
    }
}

/// Activity log template.
#[derive(Template, WebTemplate)]
#[template(path = "activity/index.html")]
pub struct ActivityLogTemplate {
    pub shell: ShellView,
    pub entries: Vec<ActivityView>,
}

/// Build the activity log router.
pub fn router() -> Router<AppState> {
    Router::new().route("/admin/logs", get(index))
}

/// List recent activity, newest first.
///
/// GET /admin/logs
#[instrument(skip(state, admin))]
async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<ActivityLogTemplate, AppError> {
    let entries = state.store().recent_activity(LOG_PAGE_SIZE).await?;

    Ok(ActivityLogTemplate {
        shell: ShellView::new(&admin, "/admin/logs"),
        entries: entries.iter().map(ActivityView::from).collect(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use nya_core::ActivityLogId;

    #[test]
    fn test_activity_view_formats_change() {
        let entry = ActivityEntry {
            id: ActivityLogId::new(1),
            admin_name: "Master Admin".to_owned(),
            page: "Admins".to_owned(),
            action: "Updated permissions".to_owned(),
            field: "priya@nya.org".to_owned(),
            old_value: Some("blog".to_owned()),
            new_value: None,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
        };

        let view = ActivityView::from(&entry);
        assert_eq!(view.change.as_deref(), Some("blog → (none)"));
        assert_eq!(view.time, "2026-03-01 09:30 UTC");
    }
}
