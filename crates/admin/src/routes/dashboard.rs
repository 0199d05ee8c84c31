//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, routing::get};
use tracing::instrument;

use nya_core::Permission;

use super::activity::ActivityView;
use crate::components::{ShellView, nav};
use crate::db::ActivityStore;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Recent entries shown on the dashboard.
const RECENT_ACTIVITY: i64 = 5;

/// Section card on the dashboard.
#[derive(Debug, Clone)]
pub struct SectionCard {
    pub name: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub shell: ShellView,
    pub sections: Vec<SectionCard>,
    pub recent_activity: Option<Vec<ActivityView>>,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/admin", get(index))
}

/// Dashboard overview.
///
/// GET /admin
#[instrument(skip(state, admin))]
async fn index(State(state): State<AppState>, RequireAdmin(admin): RequireAdmin) -> DashboardTemplate {
    let sections = nav::visible_sections_for(&admin)
        .into_iter()
        .map(|section| SectionCard {
            name: section.name,
            path: section.path,
            description: section.description,
        })
        .collect();

    // Only admins who can open the log see its tail here.
    let recent_activity = if admin.has_permission(Permission::Logs) {
        match state.store().recent_activity(RECENT_ACTIVITY).await {
            Ok(entries) => Some(entries.iter().map(ActivityView::from).collect()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load recent activity");
                None
            }
        }
    } else {
        None
    };

    DashboardTemplate {
        shell: ShellView::new(&admin, "/admin"),
        sections,
        recent_activity,
    }
}
