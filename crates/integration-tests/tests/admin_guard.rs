//! Route guard and directory sign-in, end to end.

use axum::http::StatusCode;

use nya_integration_tests::TestApp;

// ============================================================================
// Anonymous access
// ============================================================================

#[tokio::test]
async fn test_anonymous_dashboard_redirects_to_login() {
    let mut app = TestApp::directory();

    let resp = app.get("/admin").await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/admin/login?from=%2Fadmin"));
}

#[tokio::test]
async fn test_anonymous_section_redirect_carries_path() {
    let mut app = TestApp::directory();

    let resp = app.get("/admin/blog").await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/admin/login?from=%2Fadmin%2Fblog"));
}

#[tokio::test]
async fn test_login_page_lists_demo_accounts() {
    let mut app = TestApp::directory();

    let resp = app.get("/admin/login").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("master@nya.org"));
    assert!(resp.body.contains("Content Admin"));
    assert!(resp.body.contains("Only authorized admins can access this panel."));
}

#[tokio::test]
async fn test_health_is_public_and_has_security_headers() {
    let mut app = TestApp::directory();

    let resp = app.get("/health").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, "ok");
    assert_eq!(resp.headers["x-frame-options"], "DENY");
    assert!(resp.headers.contains_key("content-security-policy"));

    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);
}

// ============================================================================
// Directory login
// ============================================================================

#[tokio::test]
async fn test_login_is_case_insensitive_and_returns_to_from() {
    let mut app = TestApp::directory();

    let resp = app
        .post_form("/admin/login", "email=MASTER%40nya.org&from=%2Fadmin%2Fsettings")
        .await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/admin/settings"));

    let settings = app.get("/admin/settings").await;
    assert_eq!(settings.status, StatusCode::OK);
    assert!(settings.body.contains("Master Admin"));
}

#[tokio::test]
async fn test_login_ignores_offsite_return_path() {
    let mut app = TestApp::directory();

    let resp = app
        .post_form("/admin/login", "email=master%40nya.org&from=https%3A%2F%2Fevil.example")
        .await;

    assert_eq!(resp.location(), Some("/admin"));
}

#[tokio::test]
async fn test_unknown_email_is_rejected() {
    let mut app = TestApp::directory();

    let resp = app.login("stranger%40gmail.com").await;

    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert!(resp.body.contains("This email is not authorized to access the admin panel."));
    assert_eq!(app.get("/admin").await.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_signed_in_admin_skips_login_page() {
    let mut app = TestApp::directory();
    app.login("rahul%40nya.org").await;

    let resp = app.get("/admin/login?from=%2Fadmin%2Fblog").await;

    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/admin/blog"));
}

// ============================================================================
// Permissions
// ============================================================================

#[tokio::test]
async fn test_sub_admin_sees_only_granted_sections() {
    let mut app = TestApp::directory();
    app.login("rahul%40nya.org").await;

    let dashboard = app.get("/admin").await;
    assert_eq!(dashboard.status, StatusCode::OK);
    assert!(dashboard.body.contains(r#"href="/admin/blog""#));
    assert!(dashboard.body.contains(r#"href="/admin/media""#));
    assert!(!dashboard.body.contains(r#"href="/admin/team""#));
    assert!(!dashboard.body.contains(r#"href="/admin/admins""#));
    assert!(!dashboard.body.contains("Recent activity"));

    assert_eq!(app.get("/admin/blog").await.status, StatusCode::OK);

    let denied = app.get("/admin/team").await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert!(denied.body.contains("Access Denied"));
}

#[tokio::test]
async fn test_master_only_sections_deny_sub_admins() {
    let mut app = TestApp::directory();
    app.login("sneha%40nya.org").await;

    assert_eq!(app.get("/admin/admins").await.status, StatusCode::FORBIDDEN);
    assert_eq!(app.get("/admin/settings").await.status, StatusCode::FORBIDDEN);
    assert_eq!(app.get("/admin/chapters").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_master_reaches_every_section() {
    let mut app = TestApp::directory();
    app.login("master%40nya.org").await;

    for path in [
        "/admin/home",
        "/admin/journey",
        "/admin/team",
        "/admin/chapters",
        "/admin/media",
        "/admin/resources",
        "/admin/blog",
        "/admin/join-requests",
        "/admin/reports",
        "/admin/logs",
        "/admin/admins",
        "/admin/settings",
    ] {
        assert_eq!(app.get(path).await.status, StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn test_unknown_section_is_not_found() {
    let mut app = TestApp::directory();
    app.login("master%40nya.org").await;

    assert_eq!(app.get("/admin/billing").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_directory_admins_page_is_read_only() {
    let mut app = TestApp::directory();
    app.login("master%40nya.org").await;

    let page = app.get("/admin/admins").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("rahul@nya.org"));
    assert!(page.body.contains("read-only"));

    let resp = app
        .post_form("/admin/admins/invites", "email=new%40nya.org")
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Logout and activity
// ============================================================================

#[tokio::test]
async fn test_logout_clears_session_and_is_logged() {
    let mut app = TestApp::directory();
    app.login("sneha%40nya.org").await;

    let resp = app.post_form("/admin/logout", "").await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.location(), Some("/admin/login"));

    assert_eq!(app.get("/admin").await.status, StatusCode::SEE_OTHER);

    // Log in again to read the log.
    app.login("sneha%40nya.org").await;
    let logs = app.get("/admin/logs").await;
    assert_eq!(logs.status, StatusCode::OK);
    assert!(logs.body.contains("Signed out"));
    assert!(logs.body.contains("Chapter Admin"));
}
