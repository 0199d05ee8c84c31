//! Core types for NYA.
//!
//! This module provides type-safe wrappers for the access-control domain.

pub mod admin;
pub mod email;
pub mod id;
pub mod invite;
pub mod permission;

pub use admin::{Admin, AdminId, has_permission};
pub use email::{Email, EmailError};
pub use id::*;
pub use invite::AdminInvite;
pub use permission::{Permission, PermissionParseError, Permissions};
