//! Domain models for the admin panel.
//!
//! Admin, invite and permission types live in `nya-core`; this module holds
//! the types that only make sense inside the panel.

pub mod activity;
pub mod session;

pub use activity::{ActivityEntry, NewActivity};
pub use session::{PendingSignIn, ProviderTokens, SessionState, StoredAuth};
