//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (store reachable)
//!
//! # Auth (public)
//! GET  /admin/login            - Login page
//! POST /admin/login            - Directory login
//! GET  /admin/auth/google      - Start provider sign-in
//! GET  /admin/auth/callback    - Provider callback
//! POST /admin/logout           - Logout
//!
//! # Guarded
//! GET  /admin                  - Dashboard
//! GET  /admin/access-denied    - Denial page
//! GET  /admin/{section}        - Section pages
//! GET  /admin/logs             - Activity log
//! *    /admin/admins...        - Admin management (master only)
//! ```

pub mod activity;
pub mod admins;
pub mod auth;
pub mod dashboard;
pub mod sections;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::components::AccessDeniedTemplate;
use crate::middleware::{require_admin, security_headers_middleware};
use crate::state::AppState;

/// Routes behind the route guard.
pub fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(dashboard::router())
        .merge(activity::router())
        .merge(admins::router())
        .route("/admin/access-denied", get(access_denied))
        .merge(sections::router())
        .route_layer(from_fn_with_state(state.clone(), require_admin))
}

/// Build the full admin application around a session layer.
///
/// The session layer is passed in so tests can run on an in-memory store.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(auth::router())
        .merge(protected_routes(&state))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Denial page for direct visits.
///
/// GET /admin/access-denied
async fn access_denied() -> (StatusCode, AccessDeniedTemplate) {
    (StatusCode::FORBIDDEN, AccessDeniedTemplate::random())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the admin store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
