//! Integration tests for the NYA admin panel.
//!
//! The tests drive the real axum router in-process with
//! [`tower::ServiceExt::oneshot`]: admins live in the in-memory store and
//! sessions in `tower_sessions::MemoryStore`, so no database or server is
//! needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p nya-integration-tests
//! ```
//!
//! Provider-mode tests point the auth client at [`FakeProvider`], a local
//! axum server answering the token and logout endpoints.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    body::Body,
    extract::Query,
    http::{HeaderMap, Request, StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use secrecy::SecretString;
use tower::ServiceExt;
use tower_sessions::Session;
use url::Url;

use nya_admin::config::{AdminConfig, AuthMode, SupabaseConfig};
use nya_admin::db::{MemoryStore, StoreBackend};
use nya_admin::middleware::{SESSION_COOKIE_NAME, configure_session_layer};
use nya_admin::models::StoredAuth;
use nya_admin::models::session::keys;
use nya_admin::routes;
use nya_admin::services::{AdminDirectory, SupabaseAuth};
use nya_admin::state::{AppState, AuthBackend};
use nya_core::{Admin, AdminId, Email, Permissions};

/// Directory used by the directory-mode tests.
pub const DIRECTORY: &str = r#"{
    "admins": [
        { "email": "master@nya.org", "name": "Master Admin", "isMaster": true },
        { "email": "rahul@nya.org", "name": "Content Admin",
          "permissions": { "blog": true, "media": true } },
        { "email": "sneha@nya.org", "name": "Chapter Admin",
          "permissions": { "chapters": true, "logs": true } }
    ]
}"#;

/// A response with its body read into a string.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// The redirect target, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// The admin app plus a one-browser cookie jar.
pub struct TestApp {
    router: Router,
    cookie: Option<String>,
    /// The store behind the app; clones share data.
    pub store: MemoryStore,
    /// Session storage behind the app's cookie.
    pub sessions: tower_sessions::MemoryStore,
}

fn config(auth: AuthMode) -> AdminConfig {
    AdminConfig::new(
        SecretString::from("postgres://unused"),
        Url::parse("http://localhost:3001").unwrap(),
        auth,
    )
}

impl TestApp {
    fn build(config: AdminConfig, store: MemoryStore, auth: AuthBackend) -> Self {
        let state = AppState::new(config, StoreBackend::Memory(store.clone()), auth);
        let sessions = tower_sessions::MemoryStore::default();
        let session_layer = configure_session_layer(sessions.clone(), false);

        Self {
            router: routes::app(state, session_layer),
            cookie: None,
            store,
            sessions,
        }
    }

    /// Directory mode over [`DIRECTORY`].
    #[must_use]
    pub fn directory() -> Self {
        let directory = AdminDirectory::from_json(DIRECTORY).unwrap();
        Self::build(
            config(AuthMode::Directory {
                path: "data/admins.json".into(),
            }),
            MemoryStore::new(),
            AuthBackend::Directory(directory),
        )
    }

    /// Provider mode against `provider`, with `store` holding admins and invites.
    #[must_use]
    pub fn provider(store: MemoryStore, provider: &FakeProvider) -> Self {
        let supabase = SupabaseConfig {
            url: provider.url.clone(),
            anon_key: SecretString::from("test-anon-key"),
            oauth_provider: "google".to_owned(),
        };
        let auth = AuthBackend::Provider(SupabaseAuth::new(&supabase).unwrap());
        Self::build(config(AuthMode::Provider(supabase)), store, auth)
    }

    /// Send a request with the current session cookie and keep any new one.
    pub async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let mut request = request;
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();

        for set_cookie in headers.get_all(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap_or_default();
            if let Some(value) = pair.strip_prefix(&format!("{SESSION_COOKIE_NAME}=")) {
                self.cookie = (!value.is_empty()).then(|| pair.to_owned());
            }
        }

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// GET `uri`.
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// POST an urlencoded `form` to `uri`.
    pub async fn post_form(&mut self, uri: &str, form: &str) -> TestResponse {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_owned()))
                .unwrap(),
        )
        .await
    }

    /// Sign in through the directory login form.
    pub async fn login(&mut self, email: &str) -> TestResponse {
        self.post_form("/admin/login", &format!("email={email}&from=/admin"))
            .await
    }

    /// Start a fresh browser session holding `auth`.
    pub async fn use_session(&mut self, auth: &StoredAuth) {
        let session = Session::new(None, Arc::new(self.sessions.clone()), None);
        session.insert(keys::AUTH, auth).await.unwrap();
        session.save().await.unwrap();

        let id = session.id().unwrap();
        self.cookie = Some(format!("{SESSION_COOKIE_NAME}={id}"));
    }

    /// Run the provider sign-in: start, then follow the callback.
    pub async fn provider_sign_in(&mut self, from: &str) -> TestResponse {
        let start = self.get(&format!("/admin/auth/google?from={from}")).await;
        assert_eq!(start.status, StatusCode::SEE_OTHER);
        self.get("/admin/auth/callback?code=test-code").await
    }
}

/// The user a [`FakeProvider`] signs in.
#[derive(Debug, Clone)]
pub struct FakeUser {
    pub id: uuid::Uuid,
    pub email: String,
    pub name: Option<String>,
}

impl FakeUser {
    /// A user with a fresh id.
    #[must_use]
    pub fn new(email: &str, name: Option<&str>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            email: email.to_owned(),
            name: name.map(str::to_owned),
        }
    }

    /// The admin id this user resolves to.
    #[must_use]
    pub fn admin_id(&self) -> AdminId {
        AdminId::from(self.id)
    }

    /// An admin record for this user.
    #[must_use]
    pub fn admin(&self, is_master: bool, permissions: Permissions) -> Admin {
        Admin {
            id: self.admin_id(),
            email: Email::parse(&self.email).unwrap(),
            name: self.name.clone().unwrap_or_else(|| self.email.clone()),
            is_master,
            permissions,
        }
    }
}

/// How a [`FakeProvider`] issues tokens.
#[derive(Debug, Clone, Copy)]
pub struct TokenPolicy {
    /// Lifetime of issued access tokens; `0` makes them expire at once.
    pub expires_in: i64,
    /// Whether `grant_type=refresh_token` requests succeed.
    pub refresh_succeeds: bool,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            expires_in: 3600,
            refresh_succeeds: true,
        }
    }
}

/// A local stand-in for the hosted auth provider.
pub struct FakeProvider {
    pub url: Url,
    refreshes: Arc<AtomicUsize>,
}

impl FakeProvider {
    /// Serve token and logout endpoints that always succeed for `user`.
    pub async fn start(user: FakeUser) -> Self {
        Self::start_with(user, TokenPolicy::default()).await
    }

    /// Serve token and logout endpoints for `user` under `policy`.
    pub async fn start_with(user: FakeUser, policy: TokenPolicy) -> Self {
        let refreshes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&refreshes);

        let token = move |Query(query): Query<HashMap<String, String>>| {
            let user = user.clone();
            let counter = Arc::clone(&counter);
            async move {
                let is_refresh = query.get("grant_type").map(String::as_str) == Some("refresh_token");
                if is_refresh {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if !policy.refresh_succeeds {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(serde_json::json!({ "error": "invalid_grant" })),
                        )
                            .into_response();
                    }
                }

                Json(serde_json::json!({
                    "access_token": "fake-access-token",
                    "refresh_token": "fake-refresh-token",
                    "expires_in": policy.expires_in,
                    "user": {
                        "id": user.id,
                        "email": user.email,
                        "user_metadata": { "full_name": user.name },
                    },
                }))
                .into_response()
            }
        };

        let app = Router::new()
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/logout", post(|| async { StatusCode::NO_CONTENT }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: Url::parse(&format!("http://{addr}")).unwrap(),
            refreshes,
        }
    }

    /// How many refresh requests the provider has answered.
    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}
