//! Route guard for protected admin pages.
//!
//! [`evaluate`] is the whole decision; [`require_admin`] turns it into a
//! response before the page handler runs.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use url::form_urlencoded;

use nya_core::{Admin, Permission};

use crate::components::denied::AccessDeniedTemplate;
use crate::components::nav;
use crate::error::{AppError, set_sentry_user};
use crate::models::SessionState;
use crate::services::AuthContext;
use crate::state::AppState;

/// Path of the login page.
pub const LOGIN_PATH: &str = "/admin/login";

/// Where admins land when no other destination applies.
pub const DEFAULT_RETURN_PATH: &str = "/admin";

/// What a page demands of the signed-in admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Requirement {
    /// Permission the admin must hold.
    pub permission: Option<Permission>,
    /// Only master admins may enter.
    pub master_only: bool,
}

impl Requirement {
    /// Any signed-in admin.
    pub const AUTHENTICATED: Self = Self {
        permission: None,
        master_only: false,
    };

    /// Admins holding `permission`.
    #[must_use]
    pub const fn permission(permission: Permission) -> Self {
        Self {
            permission: Some(permission),
            master_only: false,
        }
    }

    /// Master admins only (the permission is still recorded for display).
    #[must_use]
    pub const fn master_only(permission: Permission) -> Self {
        Self {
            permission: Some(permission),
            master_only: true,
        }
    }

    /// Whether `admin` satisfies this requirement.
    #[must_use]
    pub const fn allows(&self, admin: &Admin) -> bool {
        if self.master_only && !admin.is_master {
            return false;
        }
        match self.permission {
            Some(permission) => admin.has_permission(permission),
            None => true,
        }
    }
}

/// Outcome of guarding one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Identity resolution still in flight; show a neutral waiting page.
    Wait,
    /// Nobody is signed in; send them to login and back to `from` afterwards.
    RedirectToLogin { from: String },
    /// Signed in, but not allowed here.
    AccessDenied,
    /// Render the page.
    Render,
}

/// Decide what a request for `requested` gets, given the session state.
#[must_use]
pub fn evaluate(state: &SessionState, requirement: Requirement, requested: &str) -> GuardDecision {
    if state.is_loading() {
        return GuardDecision::Wait;
    }

    let Some(admin) = state.current_admin() else {
        return GuardDecision::RedirectToLogin {
            from: requested.to_owned(),
        };
    };

    if requirement.allows(admin) {
        GuardDecision::Render
    } else {
        GuardDecision::AccessDenied
    }
}

/// Login page URL that returns to `from` afterwards.
#[must_use]
pub fn login_url(from: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(from.as_bytes()).collect();
    format!("{LOGIN_PATH}?from={encoded}")
}

/// Sanitize a post-login destination.
///
/// Only local admin paths are honored; anything else (other hosts,
/// protocol-relative URLs, the login page itself) falls back to `/admin`.
#[must_use]
pub fn safe_return_path(from: Option<&str>) -> String {
    let Some(from) = from.map(str::trim) else {
        return DEFAULT_RETURN_PATH.to_owned();
    };

    let is_admin_path = from == DEFAULT_RETURN_PATH
        || from.starts_with("/admin/")
        || from.starts_with("/admin?");
    let is_login = from == LOGIN_PATH || from.starts_with("/admin/login?");

    if is_admin_path && !is_login && !from.contains("//") && !from.contains('\\') {
        from.to_owned()
    } else {
        DEFAULT_RETURN_PATH.to_owned()
    }
}

/// Neutral page shown while a sign-in is being resolved.
#[derive(Template, WebTemplate)]
#[template(path = "auth/checking.html")]
pub struct CheckingTemplate;

/// Guard middleware for every protected admin route.
///
/// In provider mode an expired session is refreshed and the admin re-read
/// from the store first, so removals and permission edits apply on the next
/// request. Then [`evaluate`] is applied with the requirement of the section
/// the path belongs to. On
/// [`GuardDecision::Render`] the signed-in [`Admin`] is added to the request
/// extensions for [`super::RequireAdmin`].
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails during a refresh
/// or reload.
pub async fn require_admin(
    State(state): State<AppState>,
    mut auth: AuthContext,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(provider) = state.provider() {
        auth.refresh_if_expired(provider, &state.resolver()).await?;
        auth.reload_admin(state.store()).await?;
    }

    let path = request.uri().path();
    let requested = request
        .uri()
        .path_and_query()
        .map_or(path, |pq| pq.as_str())
        .to_owned();
    let requirement = nav::requirement_for(path);

    match evaluate(auth.state(), requirement, &requested) {
        GuardDecision::Wait => Ok(CheckingTemplate.into_response()),
        GuardDecision::RedirectToLogin { from } => {
            tracing::debug!(%from, "Unauthenticated request, redirecting to login");
            Ok(Redirect::to(&login_url(&from)).into_response())
        }
        GuardDecision::AccessDenied => {
            tracing::info!(
                admin_id = ?auth.current_admin().map(|a| a.id.as_str()),
                path = %requested,
                "Admin denied access"
            );
            Ok((StatusCode::FORBIDDEN, AccessDeniedTemplate::random()).into_response())
        }
        GuardDecision::Render => {
            if let Some(admin) = auth.current_admin() {
                set_sentry_user(admin.id.as_str(), Some(admin.email.as_str()));
                request.extensions_mut().insert(admin.clone());
            }
            Ok(next.run(request).await)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use nya_core::{AdminId, Email, Permissions};

    fn admin(is_master: bool, granted: &[Permission]) -> Admin {
        Admin {
            id: AdminId::new("uid"),
            email: Email::parse("priya@nya.org").unwrap(),
            name: "Priya".to_owned(),
            is_master,
            permissions: granted.iter().copied().collect(),
        }
    }

    fn signed_in(admin: Admin) -> SessionState {
        SessionState::Authenticated(admin)
    }

    #[test]
    fn test_loading_waits() {
        let state = SessionState::loading(Utc::now());
        assert_eq!(
            evaluate(&state, Requirement::AUTHENTICATED, "/admin"),
            GuardDecision::Wait
        );
    }

    #[test]
    fn test_anonymous_redirects_with_requested_path() {
        assert_eq!(
            evaluate(
                &SessionState::Anonymous,
                Requirement::permission(Permission::Blog),
                "/admin/blog"
            ),
            GuardDecision::RedirectToLogin {
                from: "/admin/blog".to_owned()
            }
        );
    }

    #[test]
    fn test_unrecognized_redirects_to_login() {
        let state = SessionState::Unrecognized {
            email: Email::parse("stranger@gmail.com").unwrap(),
        };
        assert!(matches!(
            evaluate(&state, Requirement::AUTHENTICATED, "/admin"),
            GuardDecision::RedirectToLogin { .. }
        ));
    }

    #[test]
    fn test_master_only_denies_non_master_with_permission() {
        let state = signed_in(admin(false, &[Permission::Settings]));
        assert_eq!(
            evaluate(&state, Requirement::master_only(Permission::Settings), "/admin/settings"),
            GuardDecision::AccessDenied
        );
    }

    #[test]
    fn test_missing_permission_denies() {
        let state = signed_in(admin(false, &[Permission::Blog]));
        assert_eq!(
            evaluate(&state, Requirement::permission(Permission::Team), "/admin/team"),
            GuardDecision::AccessDenied
        );
        assert_eq!(
            evaluate(&state, Requirement::permission(Permission::Blog), "/admin/blog"),
            GuardDecision::Render
        );
    }

    #[test]
    fn test_master_renders_everything() {
        let state = signed_in(admin(true, &[]));
        assert_eq!(
            evaluate(&state, Requirement::master_only(Permission::Admins), "/admin/admins"),
            GuardDecision::Render
        );
        assert_eq!(
            evaluate(&state, Requirement::permission(Permission::Reports), "/admin/reports"),
            GuardDecision::Render
        );
    }

    #[test]
    fn test_login_url_encodes_from() {
        assert_eq!(
            login_url("/admin/logs?page=2"),
            "/admin/login?from=%2Fadmin%2Flogs%3Fpage%3D2"
        );
    }

    #[test]
    fn test_safe_return_path() {
        assert_eq!(safe_return_path(None), "/admin");
        assert_eq!(safe_return_path(Some("/admin/blog")), "/admin/blog");
        assert_eq!(safe_return_path(Some("/admin")), "/admin");
        assert_eq!(safe_return_path(Some("https://evil.example/admin")), "/admin");
        assert_eq!(safe_return_path(Some("//evil.example")), "/admin");
        assert_eq!(safe_return_path(Some("/admin//evil.example")), "/admin");
        assert_eq!(safe_return_path(Some("/administrator")), "/admin");
        assert_eq!(safe_return_path(Some("/admin/login")), "/admin");
        assert_eq!(safe_return_path(Some("/")), "/admin");
    }

    #[test]
    fn test_permissions_iter_collects() {
        let permissions: Permissions = [Permission::Blog].into_iter().collect();
        assert!(permissions.blog);
    }
}
