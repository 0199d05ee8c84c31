//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Security headers
//! 4. Session layer (tower-sessions)
//! 5. Route guard (protected routes only)

pub mod auth;
pub mod guard;
pub mod security_headers;
pub mod session;

pub use auth::RequireAdmin;
pub use guard::{GuardDecision, Requirement, evaluate, require_admin, safe_return_path};
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, configure_session_layer, create_session_layer};
