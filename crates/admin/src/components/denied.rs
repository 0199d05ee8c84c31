//! Access-denied page.

use askama::Template;
use askama_web::WebTemplate;
use rand::seq::IndexedRandom;

/// Messages the denial page picks from.
pub const DENIED_MESSAGES: [&str; 8] = [
    "Nice try, but you don't have the clearance for this.",
    "This area requires special powers you don't possess.",
    "Access denied. Even asking nicely won't help.",
    "You've reached a door that won't open for you.",
    "This page is playing hard to get... and winning.",
    "Sorry, your admin level isn't high enough.",
    "The Master Admin has spoken. Not today.",
    "You're cool, but not 'access this page' cool.",
];

/// Denial page shown to a signed-in admin who lacks access.
#[derive(Debug, Template, WebTemplate)]
#[template(path = "access_denied.html")]
pub struct AccessDeniedTemplate {
    pub message: &'static str,
}

impl AccessDeniedTemplate {
    /// Pick a message at random.
    #[must_use]
    pub fn random() -> Self {
        let message = DENIED_MESSAGES
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(DENIED_MESSAGES[0]);
        Self { message }
    }
}
