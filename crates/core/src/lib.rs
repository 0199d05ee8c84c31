//! NYA Core - Shared types library.
//!
//! This crate provides the domain types shared by the NYA admin components:
//! - `admin` - Content-administration panel and its access-control core
//! - `cli` - Command-line tools for migrations and invites
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Permission evaluation lives here so that every
//! consumer (route guard, navigation shell, CLI) agrees on the same rules.
//!
//! # Modules
//!
//! - [`types`] - Emails, IDs, the closed permission set, admins and invites

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
