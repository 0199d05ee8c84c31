//! Admin shell navigation.
//!
//! The shell lists every administrable section in a fixed order and hides the
//! ones the signed-in admin cannot enter. The same table drives the guard, so
//! a hidden link and a denied page never disagree.

use nya_core::{Admin, Permission};

use crate::middleware::guard::Requirement;
use crate::models::SessionState;

/// One administrable section of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub name: &'static str,
    pub path: &'static str,
    pub slug: &'static str,
    pub requirement: Requirement,
    pub description: &'static str,
}

impl Section {
    const fn new(
        name: &'static str,
        slug: &'static str,
        path: &'static str,
        requirement: Requirement,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            path,
            slug,
            requirement,
            description,
        }
    }
}

/// Every section, in navigation order.
pub const SECTIONS: [Section; 12] = [
    Section::new(
        "Home Manager",
        "home",
        "/admin/home",
        Requirement::permission(Permission::HomeManager),
        "Hero banners, highlights and the content of the public home page.",
    ),
    Section::new(
        "Journey Manager",
        "journey",
        "/admin/journey",
        Requirement::permission(Permission::JourneyManager),
        "Milestones on the organization timeline.",
    ),
    Section::new(
        "Team",
        "team",
        "/admin/team",
        Requirement::permission(Permission::Team),
        "Team member profiles and their ordering.",
    ),
    Section::new(
        "Chapters",
        "chapters",
        "/admin/chapters",
        Requirement::permission(Permission::Chapters),
        "Chapter pages, leads and contact details.",
    ),
    Section::new(
        "Media",
        "media",
        "/admin/media",
        Requirement::permission(Permission::Media),
        "Photos, videos, press coverage and podcasts.",
    ),
    Section::new(
        "Resources",
        "resources",
        "/admin/resources",
        Requirement::permission(Permission::Resources),
        "Downloadable resources and external links.",
    ),
    Section::new(
        "Blog",
        "blog",
        "/admin/blog",
        Requirement::permission(Permission::Blog),
        "Blog posts and drafts.",
    ),
    Section::new(
        "Join Requests",
        "join-requests",
        "/admin/join-requests",
        Requirement::permission(Permission::JoinRequests),
        "Volunteer and membership applications.",
    ),
    Section::new(
        "Reports",
        "reports",
        "/admin/reports",
        Requirement::permission(Permission::Reports),
        "Issues reported by visitors.",
    ),
    Section::new(
        "Activity Logs",
        "logs",
        "/admin/logs",
        Requirement::permission(Permission::Logs),
        "Who changed what, and when.",
    ),
    Section::new(
        "Admins",
        "admins",
        "/admin/admins",
        Requirement::master_only(Permission::Admins),
        "Admin accounts, invitations and permissions.",
    ),
    Section::new(
        "Settings",
        "settings",
        "/admin/settings",
        Requirement::master_only(Permission::Settings),
        "Site-wide settings.",
    ),
];

/// Sections the session may enter, in navigation order.
///
/// Empty unless an admin is signed in.
#[must_use]
pub fn visible_sections(state: &SessionState) -> Vec<&'static Section> {
    state
        .current_admin()
        .map_or_else(Vec::new, visible_sections_for)
}

/// Sections `admin` may enter, in navigation order.
#[must_use]
pub fn visible_sections_for(admin: &Admin) -> Vec<&'static Section> {
    SECTIONS
        .iter()
        .filter(|section| section.requirement.allows(admin))
        .collect()
}

/// The section owning `path`, matching the section root and anything below it.
#[must_use]
pub fn section_for_path(path: &str) -> Option<&'static Section> {
    SECTIONS.iter().find(|section| {
        path.strip_prefix(section.path)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Look a section up by its URL slug.
#[must_use]
pub fn section_by_slug(slug: &str) -> Option<&'static Section> {
    SECTIONS.iter().find(|section| section.slug == slug)
}

/// What the guard requires for `path`. Paths outside any section only need a
/// signed-in admin.
#[must_use]
pub fn requirement_for(path: &str) -> Requirement {
    section_for_path(path).map_or(Requirement::AUTHENTICATED, |section| section.requirement)
}

/// Signed-in admin as shown in the shell header.
#[derive(Debug, Clone)]
pub struct AdminView {
    pub name: String,
    pub email: String,
    pub is_master: bool,
}

impl From<&Admin> for AdminView {
    fn from(admin: &Admin) -> Self {
        Self {
            name: admin.name.clone(),
            email: admin.email.to_string(),
            is_master: admin.is_master,
        }
    }
}

/// A navigation link.
#[derive(Debug, Clone)]
pub struct NavItem {
    pub name: &'static str,
    pub path: &'static str,
    pub active: bool,
}

/// Everything the shell layout needs to render around a page.
#[derive(Debug, Clone)]
pub struct ShellView {
    pub admin: AdminView,
    pub nav: Vec<NavItem>,
    pub current_path: String,
}

impl ShellView {
    /// Build the shell for `admin` viewing `current_path`.
    #[must_use]
    pub fn new(admin: &Admin, current_path: &str) -> Self {
        let nav = visible_sections_for(admin)
            .into_iter()
            .map(|section| NavItem {
                name: section.name,
                path: section.path,
                active: section.path == current_path,
            })
            .collect();

        Self {
            admin: AdminView::from(admin),
            nav,
            current_path: current_path.to_owned(),
        }
    }

    /// Whether the dashboard link is the current page.
    #[must_use]
    pub fn dashboard_active(&self) -> bool {
        self.current_path == "/admin"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use nya_core::{AdminId, Email, Permissions};

    fn admin(is_master: bool, permissions: Permissions) -> Admin {
        Admin {
            id: AdminId::new("uid"),
            email: Email::parse("priya@nya.org").unwrap(),
            name: "Priya".to_owned(),
            is_master,
            permissions,
        }
    }

    fn names(sections: &[&Section]) -> Vec<&'static str> {
        sections.iter().map(|s| s.name).collect()
    }

    #[test]
    fn test_sections_follow_permission_order() {
        let keys: Vec<_> = SECTIONS.iter().filter_map(|s| s.requirement.permission).collect();
        assert_eq!(keys, Permission::ALL);
    }

    #[test]
    fn test_anonymous_sees_nothing() {
        assert!(visible_sections(&SessionState::Anonymous).is_empty());
    }

    #[test]
    fn test_sub_admin_sees_granted_sections_in_order() {
        let permissions = Permissions::from_granted([Permission::Reports, Permission::Blog]);
        let state = SessionState::Authenticated(admin(false, permissions));
        assert_eq!(names(&visible_sections(&state)), ["Blog", "Reports"]);
    }

    #[test]
    fn test_master_only_sections_hidden_even_with_permission() {
        let permissions = Permissions::from_granted([Permission::Admins, Permission::Settings]);
        assert!(visible_sections_for(&admin(false, permissions)).is_empty());
    }

    #[test]
    fn test_master_sees_all_sections() {
        assert_eq!(visible_sections_for(&admin(true, Permissions::none())).len(), 12);
    }

    #[test]
    fn test_section_for_path() {
        assert_eq!(section_for_path("/admin/blog").unwrap().slug, "blog");
        assert_eq!(section_for_path("/admin/admins/invites").unwrap().slug, "admins");
        assert!(section_for_path("/admin/blogroll").is_none());
        assert!(section_for_path("/admin").is_none());
        assert_eq!(requirement_for("/admin"), Requirement::AUTHENTICATED);
        assert_eq!(section_by_slug("join-requests").unwrap().path, "/admin/join-requests");
    }

    #[test]
    fn test_shell_marks_active_item() {
        let shell = ShellView::new(&admin(true, Permissions::none()), "/admin/team");
        let active: Vec<_> = shell.nav.iter().filter(|i| i.active).map(|i| i.name).collect();
        assert_eq!(active, ["Team"]);
        assert!(!shell.dashboard_active());
        assert!(shell.admin.is_master);
    }
}
