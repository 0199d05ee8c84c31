//! Invites and sub-admin management by a master admin.

use axum::http::StatusCode;

use nya_admin::db::{AdminStore, MemoryStore};
use nya_core::{Admin, AdminId, Email, Permission, Permissions};
use nya_integration_tests::{FakeProvider, FakeUser, TestApp};

fn sub_admin(id: &str, email: &str, granted: &[Permission]) -> Admin {
    Admin {
        id: AdminId::new(id),
        email: Email::parse(email).unwrap(),
        name: "Sub Admin".to_owned(),
        is_master: false,
        permissions: granted.iter().copied().collect(),
    }
}

/// A signed-in master admin, with `others` already in the store.
async fn master_app(others: impl IntoIterator<Item = Admin>) -> TestApp {
    let master = FakeUser::new("master@nya.org", Some("Master Admin"));
    let mut admins = vec![master.admin(true, Permissions::none())];
    admins.extend(others);

    let provider = FakeProvider::start(master).await;
    let mut app = TestApp::provider(MemoryStore::with_admins(admins), &provider);

    let resp = app.provider_sign_in("/admin/admins").await;
    assert_eq!(resp.location(), Some("/admin/admins"));
    app
}

// ============================================================================
// Invites
// ============================================================================

#[tokio::test]
async fn test_create_invite_with_permissions() {
    let mut app = master_app([]).await;

    let resp = app
        .post_form(
            "/admin/admins/invites",
            "email=New%40NYA.org&name=New+Admin&permission=blog&permission=media&permission=bogus",
        )
        .await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/admin/admins?notice=invited"));

    let invite = app
        .store
        .find_invite_by_email(&Email::parse("new@nya.org").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(invite.name.as_deref(), Some("New Admin"));
    assert!(!invite.is_master);
    assert_eq!(
        invite.permissions,
        Permissions::from_granted([Permission::Blog, Permission::Media])
    );

    let page = app.get("/admin/admins?notice=invited").await;
    assert!(page.body.contains("new@nya.org"));
    assert!(page.body.contains("Invite created."));
}

#[tokio::test]
async fn test_duplicate_invite_is_rejected() {
    let mut app = master_app([]).await;
    app.post_form("/admin/admins/invites", "email=new%40nya.org")
        .await;

    let resp = app
        .post_form("/admin/admins/invites", "email=NEW%40nya.org")
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body, "An invite for this email is already pending");
}

#[tokio::test]
async fn test_invite_for_existing_admin_is_rejected() {
    let mut app = master_app([sub_admin("sub-1", "priya@nya.org", &[])]).await;

    let resp = app
        .post_form("/admin/admins/invites", "email=priya%40nya.org")
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body, "This email is already an admin");
    assert!(app.store.list_invites().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_invite_email_is_rejected() {
    let mut app = master_app([]).await;

    let resp = app
        .post_form("/admin/admins/invites", "email=not-an-email")
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body, "Enter a valid email address");
}

#[tokio::test]
async fn test_revoke_invite() {
    let mut app = master_app([]).await;
    app.post_form("/admin/admins/invites", "email=new%40nya.org")
        .await;
    let invite = app.store.list_invites().await.unwrap().remove(0);

    let resp = app
        .post_form(&format!("/admin/admins/invites/{}/delete", invite.id), "")
        .await;

    assert_eq!(resp.location(), Some("/admin/admins?notice=invite_revoked"));
    assert!(app.store.list_invites().await.unwrap().is_empty());
}

// ============================================================================
// Sub-admins
// ============================================================================

#[tokio::test]
async fn test_update_sub_admin_permissions() {
    let mut app = master_app([sub_admin("sub-1", "priya@nya.org", &[Permission::Blog])]).await;

    let resp = app
        .post_form(
            "/admin/admins/sub-1/permissions",
            "permission=team&permission=reports",
        )
        .await;

    assert_eq!(resp.location(), Some("/admin/admins?notice=updated"));
    let admin = app.store.find_admin(&AdminId::new("sub-1")).await.unwrap().unwrap();
    assert_eq!(
        admin.permissions,
        Permissions::from_granted([Permission::Team, Permission::Reports])
    );
}

#[tokio::test]
async fn test_remove_sub_admin() {
    let mut app = master_app([sub_admin("sub-1", "priya@nya.org", &[])]).await;

    let resp = app.post_form("/admin/admins/sub-1/delete", "").await;

    assert_eq!(resp.location(), Some("/admin/admins?notice=removed"));
    assert!(app.store.find_admin(&AdminId::new("sub-1")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_master_admins_cannot_be_edited_or_removed() {
    let other_master = Admin {
        is_master: true,
        ..sub_admin("master-2", "second@nya.org", &[])
    };
    let mut app = master_app([other_master]).await;

    let edit = app
        .post_form("/admin/admins/master-2/permissions", "permission=blog")
        .await;
    assert_eq!(edit.status, StatusCode::BAD_REQUEST);
    assert_eq!(edit.body, "Cannot edit Master Admin");

    let remove = app.post_form("/admin/admins/master-2/delete", "").await;
    assert_eq!(remove.status, StatusCode::BAD_REQUEST);
    assert_eq!(remove.body, "Cannot remove Master Admin");

    assert!(app.store.find_admin(&AdminId::new("master-2")).await.unwrap().is_some());
}

#[tokio::test]
async fn test_unknown_admin_is_not_found() {
    let mut app = master_app([]).await;

    let resp = app.post_form("/admin/admins/nobody/delete", "").await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_management_actions_are_logged() {
    let mut app = master_app([sub_admin("sub-1", "priya@nya.org", &[])]).await;
    app.post_form("/admin/admins/invites", "email=new%40nya.org&permission=blog")
        .await;
    app.post_form("/admin/admins/sub-1/delete", "").await;

    let logs = app.get("/admin/logs").await;

    assert_eq!(logs.status, StatusCode::OK);
    assert!(logs.body.contains("Invited admin"));
    assert!(logs.body.contains("Removed admin"));
    assert!(logs.body.contains("priya@nya.org"));
}

#[tokio::test]
async fn test_sub_admin_cannot_manage_admins() {
    let user = FakeUser::new("priya@nya.org", Some("Priya"));
    let store = MemoryStore::with_admins([user.admin(
        false,
        Permissions::from_granted(Permission::ALL),
    )]);
    let provider = FakeProvider::start(user).await;
    let mut app = TestApp::provider(store, &provider);
    app.provider_sign_in("/admin").await;

    let resp = app
        .post_form("/admin/admins/invites", "email=new%40nya.org")
        .await;

    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert!(app.store.list_invites().await.unwrap().is_empty());
}
