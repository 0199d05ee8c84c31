//! `PostgreSQL` storage for the activity log.

use chrono::{DateTime, Utc};

use nya_core::ActivityLogId;

use super::{ActivityStore, PgStore, RepositoryError};
use crate::models::{ActivityEntry, NewActivity};

/// Internal row type for activity log queries.
#[derive(Debug, sqlx::FromRow)]
struct ActivityRow {
    id: i32,
    admin_name: String,
    page: String,
    action: String,
    field: String,
    old_value: Option<String>,
    new_value: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ActivityRow> for ActivityEntry {
    fn from(row: ActivityRow) -> Self {
        Self {
            id: ActivityLogId::new(row.id),
            admin_name: row.admin_name,
            page: row.page,
            action: row.action,
            field: row.field,
            old_value: row.old_value,
            new_value: row.new_value,
            created_at: row.created_at,
        }
    }
}

impl ActivityStore for PgStore {
    async fn record_activity(&self, entry: &NewActivity) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO admin_panel.activity_logs
                (admin_name, page, action, field, old_value, new_value)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(&entry.admin_name)
        .bind(&entry.page)
        .bind(&entry.action)
        .bind(&entry.field)
        .bind(entry.old_value.as_deref())
        .bind(entry.new_value.as_deref())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn recent_activity(&self, limit: i64) -> Result<Vec<ActivityEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r"
            SELECT id, admin_name, page, action, field, old_value, new_value, created_at
            FROM admin_panel.activity_logs
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
