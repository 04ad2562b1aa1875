use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

use crate::api::{internal_error, ErrorResponse};
use crate::audit::{self, AuditRecord};

#[derive(Debug, Deserialize, IntoParams)]
pub struct AuditQuery {
    /// Day to list (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Only entries by this operator
    pub user_id: Option<i64>,
    /// Only entries with this action, e.g. ARRIVAL_RECORDED
    pub action: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuditListResponse {
    pub entries: Vec<AuditRecord>,
    pub count: usize,
}

/// List audit trail entries for a day, newest first (capped at 500)
#[utoipa::path(
    get,
    path = "/",
    params(AuditQuery),
    responses(
        (status = 200, description = "Audit trail entries", body = AuditListResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "audit"
)]
pub async fn list_audit_log(
    State(pool): State<SqlitePool>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<AuditListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let entries = audit::list(&pool, query.date, query.user_id, query.action.as_deref())
        .await
        .map_err(internal_error)?;
    let count = entries.len();

    Ok(Json(AuditListResponse { entries, count }))
}
