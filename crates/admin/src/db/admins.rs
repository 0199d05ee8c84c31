//! `PostgreSQL` storage for admins and invites.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use nya_core::{Admin, AdminId, AdminInvite, Email, InviteId, Permissions};

use super::{AdminStore, NewInvite, RepositoryError};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for admin queries.
#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    id: String,
    email: String,
    name: String,
    is_master: bool,
    permissions: Value,
}

impl TryFrom<AdminRow> for Admin {
    type Error = RepositoryError;

    fn try_from(row: AdminRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: AdminId::new(row.id),
            email,
            name: row.name,
            is_master: row.is_master,
            permissions: Permissions::from_value(&row.permissions),
        })
    }
}

/// Internal row type for invite queries.
#[derive(Debug, sqlx::FromRow)]
struct InviteRow {
    id: i32,
    email: String,
    name: Option<String>,
    is_master: bool,
    permissions: Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<InviteRow> for AdminInvite {
    type Error = RepositoryError;

    fn try_from(row: InviteRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: InviteId::new(row.id),
            email,
            name: row.name,
            is_master: row.is_master,
            permissions: Permissions::from_value(&row.permissions),
            created_at: row.created_at,
        })
    }
}

const ADMIN_COLUMNS: &str = "id, email, name, is_master, permissions";
const INVITE_COLUMNS: &str = "id, email, name, is_master, permissions, created_at";

const UPSERT_ADMIN: &str = r"
    INSERT INTO admin_panel.admins (id, email, name, is_master, permissions)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (email) DO UPDATE
    SET id = EXCLUDED.id,
        name = EXCLUDED.name,
        is_master = EXCLUDED.is_master,
        permissions = EXCLUDED.permissions,
        updated_at = NOW()
    RETURNING id, email, name, is_master, permissions
";

// =============================================================================
// Store
// =============================================================================

/// Admin panel storage backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run a trivial query to check connectivity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

impl AdminStore for PgStore {
    async fn find_admin(&self, id: &AdminId) -> Result<Option<Admin>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_panel.admins WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_admin_by_email(&self, email: &Email) -> Result<Option<Admin>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_panel.admins WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_admins(&self) -> Result<Vec<Admin>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminRow>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admin_panel.admins ORDER BY is_master DESC, name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn upsert_admin(&self, admin: &Admin) -> Result<Admin, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(UPSERT_ADMIN)
            .bind(admin.id.as_str())
            .bind(admin.email.as_str())
            .bind(&admin.name)
            .bind(admin.is_master)
            .bind(admin.permissions.to_value())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "admin id already in use"))?;

        row.try_into()
    }

    async fn update_admin_permissions(
        &self,
        id: &AdminId,
        permissions: Permissions,
    ) -> Result<Admin, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(&format!(
            r"
            UPDATE admin_panel.admins
            SET permissions = $2, updated_at = NOW()
            WHERE id = $1 AND is_master = FALSE
            RETURNING {ADMIN_COLUMNS}
            "
        ))
        .bind(id.as_str())
        .bind(permissions.to_value())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn delete_admin(&self, id: &AdminId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM admin_panel.admins WHERE id = $1 AND is_master = FALSE")
                .bind(id.as_str())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn find_invite_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<AdminInvite>, RepositoryError> {
        let row = sqlx::query_as::<_, InviteRow>(&format!(
            "SELECT {INVITE_COLUMNS} FROM admin_panel.admin_invites WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_invites(&self) -> Result<Vec<AdminInvite>, RepositoryError> {
        let rows = sqlx::query_as::<_, InviteRow>(&format!(
            "SELECT {INVITE_COLUMNS} FROM admin_panel.admin_invites ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn create_invite(&self, invite: &NewInvite) -> Result<AdminInvite, RepositoryError> {
        let row = sqlx::query_as::<_, InviteRow>(&format!(
            r"
            INSERT INTO admin_panel.admin_invites (email, name, is_master, permissions)
            VALUES ($1, $2, $3, $4)
            RETURNING {INVITE_COLUMNS}
            "
        ))
        .bind(invite.email.as_str())
        .bind(invite.name.as_deref())
        .bind(invite.is_master)
        .bind(invite.permissions.to_value())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "invite already exists for this email"))?;

        row.try_into()
    }

    async fn delete_invite(&self, id: InviteId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM admin_panel.admin_invites WHERE id = $1")
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn consume_invite(
        &self,
        invite: &AdminInvite,
        admin: &Admin,
    ) -> Result<Admin, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, AdminRow>(UPSERT_ADMIN)
            .bind(admin.id.as_str())
            .bind(admin.email.as_str())
            .bind(&admin.name)
            .bind(admin.is_master)
            .bind(admin.permissions.to_value())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "admin id already in use"))?;

        // Zero rows means a concurrent sign-in consumed it first; the upsert
        // above already converged on the same record.
        let deleted = sqlx::query("DELETE FROM admin_panel.admin_invites WHERE id = $1")
            .bind(invite.id.as_i32())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if deleted.rows_affected() == 0 {
            tracing::debug!(invite_id = %invite.id, "Invite already consumed");
        }

        row.try_into()
    }
}
