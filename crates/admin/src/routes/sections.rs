//! Section pages.
//!
//! Each administrable section gets a landing page inside the shell. The guard
//! has already checked the section's requirement by the time these run.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::Path, routing::get};

use crate::components::{ShellView, nav};
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Section landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "section.html")]
pub struct SectionTemplate {
    pub shell: ShellView,
    pub name: &'static str,
    pub description: &'static str,
    pub permission: Option<&'static str>,
    pub master_only: bool,
}

/// Build the section router.
///
/// `/admin/admins` and `/admin/logs` have dedicated routers; axum prefers
/// their static paths over the slug capture.
pub fn router() -> Router<AppState> {
    Router::new().route("/admin/{section}", get(show))
}

/// GET /admin/{section}
async fn show(
    Path(slug): Path<String>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<SectionTemplate, AppError> {
    let section =
        nav::section_by_slug(&slug).ok_or_else(|| AppError::NotFound(format!("section {slug}")))?;

    Ok(SectionTemplate {
        shell: ShellView::new(&admin, section.path),
        name: section.name,
        description: section.description,
        permission: section.requirement.permission.map(|p| p.label()),
        master_only: section.requirement.master_only,
    })
}
