//! Reusable page components.

pub mod denied;
pub mod nav;

pub use denied::AccessDeniedTemplate;
pub use nav::{SECTIONS, Section, ShellView, visible_sections};
