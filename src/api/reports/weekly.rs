use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

use super::span_window;
use crate::api::error::report_error;
use crate::api::ErrorResponse;
use crate::reports::{self, ActivityBucket, ActivitySummary, Granularity, RoutePerformance};

#[derive(Debug, Deserialize, IntoParams)]
pub struct WeeklyQuery {
    /// First day of the 7-day window (YYYY-MM-DD), typically a Monday
    pub start: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeeklyReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Seven day buckets, zero-filled. The summary's peak bucket is the
    /// busiest day of the week.
    pub days: Vec<ActivityBucket>,
    pub summary: ActivitySummary,
    pub routes: Vec<RoutePerformance>,
}

/// Seven-day breakdown of arrivals and departures
#[utoipa::path(
    get,
    path = "/weekly",
    params(WeeklyQuery),
    responses(
        (status = 200, description = "Seven day buckets with summary and route breakdown", body = WeeklyReport),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn get_weekly_report(
    State(pool): State<SqlitePool>,
    Query(query): Query<WeeklyQuery>,
) -> Result<Json<WeeklyReport>, (StatusCode, Json<ErrorResponse>)> {
    let last = query.start + Duration::days(6);
    let (start, end) = span_window(query.start, last);

    let report = reports::aggregate(&pool, start, end, Granularity::Week)
        .await
        .map_err(report_error)?;
    let routes = reports::route_breakdown(&pool, start, end)
        .await
        .map_err(report_error)?;

    Ok(Json(WeeklyReport {
        start: query.start,
        end: last,
        days: report.buckets,
        summary: report.summary,
        routes,
    }))
}
