use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

use super::month_window;
use crate::api::error::{bad_request, report_error};
use crate::api::ErrorResponse;
use crate::reports::{self, ActivityBucket, ActivitySummary, Granularity, RoutePerformance};

#[derive(Debug, Deserialize, IntoParams)]
pub struct MonthlyQuery {
    /// Report month (YYYY-MM)
    pub month: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MonthlyReport {
    pub month: String,
    /// One bucket per calendar day of the month, zero-filled.
    pub days: Vec<ActivityBucket>,
    pub summary: ActivitySummary,
    pub routes: Vec<RoutePerformance>,
}

/// Day-by-day breakdown for one calendar month
#[utoipa::path(
    get,
    path = "/monthly",
    params(MonthlyQuery),
    responses(
        (status = 200, description = "Daily buckets for the whole month", body = MonthlyReport),
        (status = 400, description = "Malformed month", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn get_monthly_report(
    State(pool): State<SqlitePool>,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<MonthlyReport>, (StatusCode, Json<ErrorResponse>)> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", query.month), "%Y-%m-%d")
        .map_err(|_| bad_request("month must be in YYYY-MM form"))?;
    let (start, end) = month_window(first);

    let report = reports::aggregate(&pool, start, end, Granularity::Month)
        .await
        .map_err(report_error)?;
    let routes = reports::route_breakdown(&pool, start, end)
        .await
        .map_err(report_error)?;

    Ok(Json(MonthlyReport {
        month: query.month,
        days: report.buckets,
        summary: report.summary,
        routes,
    }))
}
