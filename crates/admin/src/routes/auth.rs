//! Authentication route handlers for admin.
//!
//! Which sign-in the login page offers depends on the configured auth mode:
//! Google through the auth provider, or an email matched against the static
//! admin directory.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use nya_core::Admin;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::guard::{LOGIN_PATH, safe_return_path};
use crate::models::{NewActivity, PendingSignIn, SessionState};
use crate::services::{self, AuthContext, AuthEvent, LoginOutcome, PkceChallenge};
use crate::state::AppState;

/// Activity log page name for sign-in events.
const ACTIVITY_PAGE: &str = "Auth";

/// A directory admin offered as a one-click demo account.
#[derive(Debug, Clone)]
pub struct DemoAccountView {
    pub email: String,
    pub name: String,
    pub is_master: bool,
}

impl From<&Admin> for DemoAccountView {
    fn from(admin: &Admin) -> Self {
        Self {
            email: admin.email.to_string(),
            name: admin.name.clone(),
            is_master: admin.is_master,
        }
    }
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub provider_mode: bool,
    pub from: String,
    pub email: String,
    pub error: Option<String>,
    pub unrecognized_email: Option<String>,
    pub demo_accounts: Vec<DemoAccountView>,
}

impl LoginTemplate {
    fn new(state: &AppState, from: String) -> Self {
        let demo_accounts = state
            .directory()
            .map(|directory| directory.admins().iter().map(DemoAccountView::from).collect())
            .unwrap_or_default();

        Self {
            provider_mode: state.provider().is_some(),
            from,
            email: String::new(),
            error: None,
            unrecognized_email: None,
            demo_accounts,
        }
    }
}

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    from: Option<String>,
    error: Option<String>,
}

/// Directory login form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    email: String,
    from: Option<String>,
}

/// Query parameters for starting a provider sign-in.
#[derive(Debug, Deserialize)]
pub struct StartQuery {
    from: Option<String>,
}

/// Query parameters the provider redirects back with.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/login", get(login_page).post(login))
        .route("/admin/auth/google", get(start_sign_in))
        .route("/admin/auth/callback", get(callback))
        .route("/admin/logout", post(logout))
}

/// Login page URL carrying an error code.
fn login_error(code: &str) -> Redirect {
    Redirect::to(&format!("{LOGIN_PATH}?error={code}"))
}

fn error_message(code: &str) -> String {
    match code {
        "provider" => "Sign-in with Google failed. Please try again.".to_owned(),
        "expired" => "Your sign-in attempt expired. Please try again.".to_owned(),
        "resolution" => "We couldn't verify your admin access. Please try again.".to_owned(),
        _ => "Sign-in failed. Please try again.".to_owned(),
    }
}

/// Render the login page.
///
/// GET /admin/login
#[instrument(skip(state, auth))]
async fn login_page(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<LoginQuery>,
) -> Response {
    if auth.is_authenticated() {
        return Redirect::to(&safe_return_path(query.from.as_deref())).into_response();
    }

    let mut template = LoginTemplate::new(&state, safe_return_path(query.from.as_deref()));
    template.error = query.error.as_deref().map(error_message);
    if let SessionState::Unrecognized { email } = auth.state() {
        template.unrecognized_email = Some(email.to_string());
    }

    template.into_response()
}

/// Sign in against the admin directory.
///
/// POST /admin/login
#[instrument(skip(state, auth, form))]
async fn login(
    State(state): State<AppState>,
    mut auth: AuthContext,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let Some(directory) = state.directory() else {
        return Err(AppError::BadRequest(
            "Email sign-in is not enabled".to_owned(),
        ));
    };

    let return_to = safe_return_path(form.from.as_deref());

    match auth.login_with_directory(directory, &form.email).await? {
        LoginOutcome::Success(admin) => {
            tracing::info!(admin_id = %admin.id, "Admin signed in");
            set_sentry_user(admin.id.as_str(), Some(admin.email.as_str()));
            record_sign_in(&state, &admin, "Signed in").await;
            Ok(Redirect::to(&return_to).into_response())
        }
        LoginOutcome::Rejected { message } => {
            tracing::info!("Directory login rejected");
            let mut template = LoginTemplate::new(&state, return_to);
            template.email = form.email.trim().to_owned();
            template.error = Some(message);
            Ok((StatusCode::UNAUTHORIZED, template).into_response())
        }
    }
}

/// Start a provider sign-in with PKCE.
///
/// GET /admin/auth/google
#[instrument(skip(state, auth))]
async fn start_sign_in(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<StartQuery>,
) -> Result<Redirect, AppError> {
    let Some(provider) = state.provider() else {
        return Err(AppError::NotFound("provider sign-in".to_owned()));
    };

    let pkce = PkceChallenge::generate();
    auth.remember_sign_in(&PendingSignIn {
        verifier: pkce.verifier.clone(),
        return_to: safe_return_path(query.from.as_deref()),
    })
    .await?;

    let url = provider.authorize_url(&state.config().callback_url(), &pkce);
    Ok(Redirect::to(url.as_str()))
}

/// Finish a provider sign-in.
///
/// GET /admin/auth/callback
#[instrument(skip(state, auth, query))]
async fn callback(
    State(state): State<AppState>,
    mut auth: AuthContext,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, AppError> {
    let Some(provider) = state.provider() else {
        return Err(AppError::NotFound("provider sign-in".to_owned()));
    };

    let Some(pending) = auth.take_sign_in().await? else {
        tracing::warn!("Sign-in callback without a pending sign-in");
        return Ok(login_error("expired"));
    };

    if let Some(error) = query.error {
        tracing::warn!(
            %error,
            description = query.error_description.as_deref().unwrap_or_default(),
            "Provider returned a sign-in error"
        );
        return Ok(login_error("provider"));
    }

    let Some(code) = query.code else {
        return Ok(login_error("provider"));
    };

    let session = match provider.exchange_code(&code, &pending.verifier).await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(error = %e, "Authorization code exchange failed");
            return Ok(login_error("provider"));
        }
    };

    let event = AuthEvent::SignedIn(session.identity);
    let resolved = auth
        .resolve(&state.resolver(), &event, Some(session.tokens))
        .await?
        .clone();

    match resolved {
        SessionState::Authenticated(admin) => {
            tracing::info!(admin_id = %admin.id, "Admin signed in");
            set_sentry_user(admin.id.as_str(), Some(admin.email.as_str()));
            record_sign_in(&state, &admin, "Signed in").await;
            Ok(Redirect::to(&pending.return_to))
        }
        SessionState::Unrecognized { email } => {
            tracing::info!(%email, "Sign-in by an email with no admin or invite");
            Ok(Redirect::to(LOGIN_PATH))
        }
        SessionState::Anonymous | SessionState::Loading { .. } => Ok(login_error("resolution")),
    }
}

/// Sign out and clear the session.
///
/// POST /admin/logout
#[instrument(skip(state, auth))]
async fn logout(State(state): State<AppState>, mut auth: AuthContext) -> Redirect {
    let previous = auth.logout().await;

    if let (Some(provider), Some(tokens)) = (state.provider(), previous.tokens.as_ref())
        && let Err(e) = provider.sign_out(&tokens.access_token).await
    {
        tracing::warn!(error = %e, "Failed to revoke provider session");
    }

    if let Some(admin) = previous.state.current_admin() {
        tracing::info!(admin_id = %admin.id, "Admin signed out");
        record_sign_in(&state, admin, "Signed out").await;
    }

    clear_sentry_user();
    Redirect::to(LOGIN_PATH)
}

async fn record_sign_in(state: &AppState, admin: &Admin, action: &str) {
    services::activity::record(
        state.store(),
        NewActivity::new(&admin.name, ACTIVITY_PAGE, action, "session"),
    )
    .await;
}
