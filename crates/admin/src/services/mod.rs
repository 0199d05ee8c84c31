//! Business logic services for admin.
//!
//! # Services
//!
//! - `activity` - Best-effort activity log recording
//! - `auth` - Per-session authentication context
//! - `directory` - Static JSON admin directory
//! - `identity` - Mapping provider identities to admins and invites
//! - `provider` - Supabase Auth client (PKCE, refresh, logout)

pub mod activity;
pub mod auth;
pub mod directory;
pub mod identity;
pub mod provider;

pub use auth::{AuthContext, AuthError};
pub use directory::{AdminDirectory, DirectoryError, LoginOutcome};
pub use identity::{AuthEvent, IdentityResolver};
pub use provider::{ExternalIdentity, PkceChallenge, ProviderError, SupabaseAuth};
