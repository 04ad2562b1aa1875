use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tracing::warn;
use utoipa::ToSchema;

/// One immutable trail entry, appended after a successful arrival or
/// departure.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub user_id: i64,
    pub action: &'static str,
    pub record_id: i64,
    pub description: String,
    pub remote_addr: Option<String>,
}

pub const ACTION_ARRIVAL_RECORDED: &str = "ARRIVAL_RECORDED";
pub const ACTION_DEPARTURE_RECORDED: &str = "DEPARTURE_RECORDED";

/// Append an audit entry. Fire-and-forget: the visit or departure this
/// describes is already committed, so a failed audit write is logged and
/// swallowed rather than rolling anything back.
pub async fn record(pool: &SqlitePool, entry: AuditEntry) {
    let result = sqlx::query(
        r#"
        INSERT INTO audit_log (user_id, action, record_id, description, remote_addr)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.action)
    .bind(entry.record_id)
    .bind(&entry.description)
    .bind(&entry.remote_addr)
    .execute(pool)
    .await;

    if let Err(e) = result {
        warn!(
            error = %e,
            action = entry.action,
            record_id = entry.record_id,
            "Failed to write audit log entry"
        );
    }
}

/// A stored trail entry as returned to the admin listing.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AuditRecord {
    pub audit_id: i64,
    pub user_id: i64,
    pub action: String,
    pub record_id: Option<i64>,
    pub description: Option<String>,
    pub remote_addr: Option<String>,
    pub logged_at: DateTime<Utc>,
}

/// List trail entries for one day, newest first, optionally narrowed by
/// user or action. Capped at 500 rows like the admin page it feeds.
pub async fn list(
    pool: &SqlitePool,
    date: NaiveDate,
    user_id: Option<i64>,
    action: Option<&str>,
) -> Result<Vec<AuditRecord>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT audit_id, user_id, action, record_id, description, remote_addr, logged_at
        FROM audit_log
        WHERE date(logged_at) = ?
          AND (? IS NULL OR user_id = ?)
          AND (? IS NULL OR action = ?)
        ORDER BY logged_at DESC
        LIMIT 500
        "#,
    )
    .bind(date.format("%Y-%m-%d").to_string())
    .bind(user_id)
    .bind(user_id)
    .bind(action)
    .bind(action)
    .fetch_all(pool)
    .await
}
