//! NYA admin panel library.
//!
//! Access control and sessions for the NYA content-administration panel:
//! who may sign in, which sections each admin may open, and the server-side
//! session that carries that decision between requests.
//!
//! # Security
//!
//! Every `/admin` page except the login flow sits behind
//! [`middleware::require_admin`]. Master admins pass every check; other
//! admins need the permission of the section they are opening.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod components;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
