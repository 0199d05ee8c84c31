//! Extractor for the admin admitted by the route guard.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};

use nya_core::Admin;

use super::guard::LOGIN_PATH;

/// The signed-in admin for a guarded route.
///
/// [`super::guard::require_admin`] inserts the admin after checking the
/// section requirement; this extractor only reads it back.
///
/// ```rust,ignore
/// async fn handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Admin);

/// Rejection when a handler runs outside the guard.
#[derive(Debug)]
pub struct NotSignedIn;

impl IntoResponse for NotSignedIn {
    fn into_response(self) -> Response {
        Redirect::to(LOGIN_PATH).into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = NotSignedIn;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Admin>()
            .cloned()
            .map(Self)
            .ok_or(NotSignedIn)
    }
}
