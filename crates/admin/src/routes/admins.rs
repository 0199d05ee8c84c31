//! Admin management (master admins only).
//!
//! # Routes
//!
//! ```text
//! GET  /admin/admins                         - Admins and pending invites
//! POST /admin/admins/invites                 - Invite an email
//! POST /admin/admins/invites/{id}/delete     - Revoke an invite
//! POST /admin/admins/{id}/permissions        - Replace a sub-admin's permissions
//! POST /admin/admins/{id}/delete             - Remove a sub-admin
//! ```
//!
//! Master admins are never edited or removed here. In directory mode the
//! admin list comes from the directory file and is read-only.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use nya_core::{Admin, AdminId, AdminInvite, Email, InviteId, Permission, Permissions};

use crate::components::ShellView;
use crate::db::{AdminStore, NewInvite, RepositoryError};
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::NewActivity;
use crate::services;
use crate::state::AppState;

/// Activity log page name for admin management.
const ACTIVITY_PAGE: &str = "Admins";

const CANNOT_EDIT_MASTER: &str = "Cannot edit Master Admin";
const CANNOT_REMOVE_MASTER: &str = "Cannot remove Master Admin";
const ALREADY_ADMIN: &str = "This email is already an admin";
const INVITE_PENDING: &str = "An invite for this email is already pending";
const READ_ONLY: &str = "Admins are managed in the directory file";

/// One permission checkbox.
#[derive(Debug, Clone)]
pub struct PermissionToggle {
    pub key: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

fn toggles(permissions: &Permissions) -> Vec<PermissionToggle> {
    Permission::ALL
        .into_iter()
        .map(|p| PermissionToggle {
            key: p.key(),
            label: p.label(),
            checked: permissions.get(p),
        })
        .collect()
}

/// Comma-separated labels of the granted permissions.
fn summary(permissions: &Permissions) -> String {
    let labels: Vec<_> = permissions.granted().map(Permission::label).collect();
    if labels.is_empty() {
        "No sections".to_owned()
    } else {
        labels.join(", ")
    }
}

/// Admin row for templates.
#[derive(Debug, Clone)]
pub struct AdminRowView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_master: bool,
    pub summary: String,
    pub toggles: Vec<PermissionToggle>,
}

impl From<&Admin> for AdminRowView {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id.to_string(),
            name: admin.name.clone(),
            email: admin.email.to_string(),
            is_master: admin.is_master,
            summary: if admin.is_master {
                "All sections".to_owned()
            } else {
                summary(&admin.permissions)
            },
            toggles: toggles(&admin.permissions),
        }
    }
}

/// Pending invite for templates.
#[derive(Debug, Clone)]
pub struct InviteView {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub is_master: bool,
    pub summary: String,
    pub created_at: String,
}

impl From<&AdminInvite> for InviteView {
    fn from(invite: &AdminInvite) -> Self {
        Self {
            id: invite.id.as_i32(),
            email: invite.email.to_string(),
            name: invite.name.clone().unwrap_or_default(),
            is_master: invite.is_master,
            summary: if invite.is_master {
                "All sections".to_owned()
            } else {
                summary(&invite.permissions)
            },
            created_at: invite.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Admin management template.
#[derive(Template, WebTemplate)]
#[template(path = "admins/index.html")]
pub struct AdminsTemplate {
    pub shell: ShellView,
    pub admins: Vec<AdminRowView>,
    pub invites: Vec<InviteView>,
    pub new_invite: Vec<PermissionToggle>,
    pub editable: bool,
    pub notice: Option<String>,
}

/// Query parameters for the admin list.
#[derive(Debug, Deserialize)]
pub struct AdminsQuery {
    notice: Option<String>,
}

fn notice_message(code: &str) -> Option<String> {
    let message = match code {
        "invited" => "Invite created. It is used on the invitee's first sign-in.",
        "invite_revoked" => "Invite revoked.",
        "updated" => "Admin updated.",
        "removed" => "Admin removed.",
        _ => return None,
    };
    Some(message.to_owned())
}

/// Fields of the invite form.
///
/// Checkboxes arrive as repeated `permission=<key>` pairs, so the form is
/// decoded as raw pairs.
#[derive(Debug, Default, PartialEq, Eq)]
struct InviteForm {
    email: String,
    name: Option<String>,
    is_master: bool,
    permissions: Permissions,
}

impl InviteForm {
    fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut form = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "email" => value.trim().clone_into(&mut form.email),
                "name" => {
                    form.name = Some(value.trim().to_owned()).filter(|n| !n.is_empty());
                }
                "is_master" => form.is_master = true,
                "permission" => {
                    if let Ok(permission) = value.parse::<Permission>() {
                        form.permissions.set(permission, true);
                    }
                }
                _ => {}
            }
        }
        form
    }
}

/// Permissions from repeated `permission=<key>` pairs. Unknown keys are ignored.
fn permissions_from_pairs(pairs: &[(String, String)]) -> Permissions {
    pairs
        .iter()
        .filter(|(key, _)| key == "permission")
        .filter_map(|(_, value)| value.parse::<Permission>().ok())
        .collect()
}

/// Build the admin management router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/admins", get(index))
        .route("/admin/admins/invites", post(create_invite))
        .route("/admin/admins/invites/{id}/delete", post(delete_invite))
        .route("/admin/admins/{id}/permissions", post(update_permissions))
        .route("/admin/admins/{id}/delete", post(delete_admin))
}

fn done(notice: &str) -> Redirect {
    Redirect::to(&format!("/admin/admins?notice={notice}"))
}

/// List admins and pending invites.
///
/// GET /admin/admins
#[instrument(skip(state, admin))]
async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<AdminsQuery>,
) -> Result<AdminsTemplate, AppError> {
    let (admins, invites, editable) = match state.directory() {
        Some(directory) => (directory.admins().to_vec(), Vec::new(), false),
        None => (
            state.store().list_admins().await?,
            state.store().list_invites().await?,
            true,
        ),
    };

    Ok(AdminsTemplate {
        shell: ShellView::new(&admin, "/admin/admins"),
        admins: admins.iter().map(AdminRowView::from).collect(),
        invites: invites.iter().map(InviteView::from).collect(),
        new_invite: toggles(&Permissions::none()),
        editable,
        notice: query.notice.as_deref().and_then(notice_message),
    })
}

fn ensure_editable(state: &AppState) -> Result<(), AppError> {
    if state.directory().is_some() {
        return Err(AppError::BadRequest(READ_ONLY.to_owned()));
    }
    Ok(())
}

/// Invite an email address.
///
/// POST /admin/admins/invites
#[instrument(skip(state, admin, pairs))]
async fn create_invite(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect, AppError> {
    ensure_editable(&state)?;

    let form = InviteForm::from_pairs(&pairs);
    let email = Email::parse(&form.email)
        .map_err(|_| AppError::BadRequest("Enter a valid email address".to_owned()))?;

    if state.store().find_admin_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest(ALREADY_ADMIN.to_owned()));
    }

    let invite = state
        .store()
        .create_invite(&NewInvite {
            email,
            name: form.name,
            is_master: form.is_master,
            permissions: form.permissions,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AppError::BadRequest(INVITE_PENDING.to_owned()),
            other => AppError::Database(other),
        })?;

    tracing::info!(invite_id = %invite.id, master = invite.is_master, "Admin invite created");
    services::activity::record(
        state.store(),
        NewActivity::new(&admin.name, ACTIVITY_PAGE, "Invited admin", invite.email.as_str())
            .with_change(None, Some(summary(&invite.permissions))),
    )
    .await;

    Ok(done("invited"))
}

/// Revoke a pending invite.
///
/// POST /admin/admins/invites/{id}/delete
#[instrument(skip(state, admin))]
async fn delete_invite(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    ensure_editable(&state)?;

    let id = InviteId::new(id);
    state.store().delete_invite(id).await.map_err(|e| match e {
        RepositoryError::NotFound => AppError::NotFound(format!("invite {id}")),
        other => AppError::Database(other),
    })?;

    tracing::info!(invite_id = %id, "Admin invite revoked");
    services::activity::record(
        state.store(),
        NewActivity::new(&admin.name, ACTIVITY_PAGE, "Revoked invite", id.to_string()),
    )
    .await;

    Ok(done("invite_revoked"))
}

/// Load a non-master admin, or fail with `master_error`.
async fn editable_admin(
    state: &AppState,
    id: &AdminId,
    master_error: &str,
) -> Result<Admin, AppError> {
    let target = state
        .store()
        .find_admin(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("admin {id}")))?;

    if target.is_master {
        return Err(AppError::BadRequest(master_error.to_owned()));
    }
    Ok(target)
}

/// Replace a sub-admin's permissions.
///
/// POST /admin/admins/{id}/permissions
#[instrument(skip(state, admin, pairs))]
async fn update_permissions(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect, AppError> {
    ensure_editable(&state)?;

    let id = AdminId::new(id);
    let target = editable_admin(&state, &id, CANNOT_EDIT_MASTER).await?;
    let permissions = permissions_from_pairs(&pairs);

    // A master row can only appear here through a concurrent promotion.
    let updated = state
        .store()
        .update_admin_permissions(&id, permissions)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::BadRequest(CANNOT_EDIT_MASTER.to_owned()),
            other => AppError::Database(other),
        })?;

    tracing::info!(admin_id = %updated.id, "Admin permissions updated");
    services::activity::record(
        state.store(),
        NewActivity::new(&admin.name, ACTIVITY_PAGE, "Updated permissions", updated.email.as_str())
            .with_change(
                Some(summary(&target.permissions)),
                Some(summary(&updated.permissions)),
            ),
    )
    .await;

    Ok(done("updated"))
}

/// Remove a sub-admin.
///
/// POST /admin/admins/{id}/delete
#[instrument(skip(state, admin))]
async fn delete_admin(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    ensure_editable(&state)?;

    let id = AdminId::new(id);
    let target = editable_admin(&state, &id, CANNOT_REMOVE_MASTER).await?;

    state.store().delete_admin(&id).await.map_err(|e| match e {
        RepositoryError::NotFound => AppError::BadRequest(CANNOT_REMOVE_MASTER.to_owned()),
        other => AppError::Database(other),
    })?;

    tracing::info!(admin_id = %id, "Admin removed");
    services::activity::record(
        state.store(),
        NewActivity::new(&admin.name, ACTIVITY_PAGE, "Removed admin", target.email.as_str()),
    )
    .await;

    Ok(done("removed"))
}
