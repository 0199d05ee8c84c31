//! Best-effort activity recording.

use crate::db::ActivityStore;
use crate::models::NewActivity;

/// Append `entry` to the activity log.
///
/// Failures are logged and swallowed; recording never fails the action that
/// triggered it.
pub async fn record<S: ActivityStore>(store: &S, entry: NewActivity) {
    if let Err(e) = store.record_activity(&entry).await {
        tracing::error!(
            error = %e,
            page = %entry.page,
            action = %entry.action,
            "Failed to record admin activity"
        );
    }
}
