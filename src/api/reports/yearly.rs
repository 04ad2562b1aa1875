use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

use super::span_window;
use crate::api::error::{bad_request, report_error};
use crate::api::ErrorResponse;
use crate::reports::{
    self, ActivityBucket, ActivitySummary, Granularity, QuarterBreakdown, RoutePerformance,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct YearlyQuery {
    /// Report year
    pub year: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct YearlyReport {
    pub year: i32,
    /// Twelve month buckets, zero-filled.
    pub months: Vec<ActivityBucket>,
    /// Quarter totals re-aggregated from the month buckets.
    pub quarters: Vec<QuarterBreakdown>,
    pub summary: ActivitySummary,
    pub routes: Vec<RoutePerformance>,
}

/// Month-by-month breakdown for one calendar year
#[utoipa::path(
    get,
    path = "/yearly",
    params(YearlyQuery),
    responses(
        (status = 200, description = "Twelve month buckets with quarterly roll-up", body = YearlyReport),
        (status = 400, description = "Year out of range", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn get_yearly_report(
    State(pool): State<SqlitePool>,
    Query(query): Query<YearlyQuery>,
) -> Result<Json<YearlyReport>, (StatusCode, Json<ErrorResponse>)> {
    let (first, last) = match (
        NaiveDate::from_ymd_opt(query.year, 1, 1),
        NaiveDate::from_ymd_opt(query.year, 12, 31),
    ) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(bad_request("year out of range")),
    };
    let (start, end) = span_window(first, last);

    let report = reports::aggregate(&pool, start, end, Granularity::Year)
        .await
        .map_err(report_error)?;
    let routes = reports::route_breakdown(&pool, start, end)
        .await
        .map_err(report_error)?;
    let quarters = reports::quarterly_rollup(&report.buckets);

    Ok(Json(YearlyReport {
        year: query.year,
        months: report.buckets,
        quarters,
        summary: report.summary,
        routes,
    }))
}
