//! In-process storage.
//!
//! Backs tests that run without a database. Every operation takes the single
//! lock once, so invite consumption is atomic here too.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use nya_core::{ActivityLogId, Admin, AdminId, AdminInvite, Email, InviteId, Permissions};

use super::{ActivityStore, AdminStore, NewInvite, RepositoryError};
use crate::models::{ActivityEntry, NewActivity};

#[derive(Debug, Default)]
struct Inner {
    admins: Vec<Admin>,
    invites: Vec<AdminInvite>,
    activity: Vec<ActivityEntry>,
    next_invite_id: i32,
    next_activity_id: i32,
}

impl Inner {
    fn upsert(&mut self, admin: &Admin) -> Result<Admin, RepositoryError> {
        if self
            .admins
            .iter()
            .any(|a| a.id == admin.id && a.email != admin.email)
        {
            return Err(RepositoryError::Conflict("admin id already in use".to_owned()));
        }
        self.admins.retain(|a| a.email != admin.email);
        self.admins.push(admin.clone());
        Ok(admin.clone())
    }
}

/// Admin panel storage held in memory.
///
/// Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `admins`.
    #[must_use]
    pub fn with_admins(admins: impl IntoIterator<Item = Admin>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                admins: admins.into_iter().collect(),
                ..Inner::default()
            })),
        }
    }
}

impl AdminStore for MemoryStore {
    async fn find_admin(&self, id: &AdminId) -> Result<Option<Admin>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.admins.iter().find(|a| &a.id == id).cloned())
    }

    async fn find_admin_by_email(&self, email: &Email) -> Result<Option<Admin>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.admins.iter().find(|a| &a.email == email).cloned())
    }

    async fn list_admins(&self) -> Result<Vec<Admin>, RepositoryError> {
        let mut admins = self.inner.read().await.admins.clone();
        admins.sort_by(|a, b| b.is_master.cmp(&a.is_master).then_with(|| a.name.cmp(&b.name)));
        Ok(admins)
    }

    async fn upsert_admin(&self, admin: &Admin) -> Result<Admin, RepositoryError> {
        self.inner.write().await.upsert(admin)
    }

    async fn update_admin_permissions(
        &self,
        id: &AdminId,
        permissions: Permissions,
    ) -> Result<Admin, RepositoryError> {
        let mut inner = self.inner.write().await;
        let admin = inner
            .admins
            .iter_mut()
            .find(|a| &a.id == id && !a.is_master)
            .ok_or(RepositoryError::NotFound)?;
        admin.permissions = permissions;
        Ok(admin.clone())
    }

    async fn delete_admin(&self, id: &AdminId) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        let before = inner.admins.len();
        inner.admins.retain(|a| &a.id != id || a.is_master);
        if inner.admins.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn find_invite_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<AdminInvite>, RepositoryError> {
        let inner = self.inner.read().await;
        Ok(inner.invites.iter().find(|i| &i.email == email).cloned())
    }

    async fn list_invites(&self) -> Result<Vec<AdminInvite>, RepositoryError> {
        let mut invites = self.inner.read().await.invites.clone();
        invites.sort_by_key(|i| std::cmp::Reverse((i.created_at, i.id.as_i32())));
        Ok(invites)
    }

    async fn create_invite(&self, invite: &NewInvite) -> Result<AdminInvite, RepositoryError> {
        let mut inner = self.inner.write().await;
        if inner.invites.iter().any(|i| i.email == invite.email) {
            return Err(RepositoryError::Conflict(
                "invite already exists for this email".to_owned(),
            ));
        }
        inner.next_invite_id += 1;
        let created = AdminInvite {
            id: InviteId::new(inner.next_invite_id),
            email: invite.email.clone(),
            name: invite.name.clone(),
            is_master: invite.is_master,
            permissions: invite.permissions,
            created_at: Utc::now(),
        };
        inner.invites.push(created.clone());
        Ok(created)
    }

    async fn delete_invite(&self, id: InviteId) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        let before = inner.invites.len();
        inner.invites.retain(|i| i.id != id);
        if inner.invites.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn consume_invite(
        &self,
        invite: &AdminInvite,
        admin: &Admin,
    ) -> Result<Admin, RepositoryError> {
        let mut inner = self.inner.write().await;
        let created = inner.upsert(admin)?;
        inner.invites.retain(|i| i.id != invite.id);
        Ok(created)
    }
}

impl ActivityStore for MemoryStore {
    async fn record_activity(&self, entry: &NewActivity) -> Result<(), RepositoryError> {
        let mut inner = self.inner.write().await;
        inner.next_activity_id += 1;
        let id = ActivityLogId::new(inner.next_activity_id);
        inner.activity.push(ActivityEntry {
            id,
            admin_name: entry.admin_name.clone(),
            page: entry.page.clone(),
            action: entry.action.clone(),
            field: entry.field.clone(),
            old_value: entry.old_value.clone(),
            new_value: entry.new_value.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn recent_activity(&self, limit: i64) -> Result<Vec<ActivityEntry>, RepositoryError> {
        let inner = self.inner.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(inner.activity.iter().rev().take(limit).cloned().collect())
    }
}
