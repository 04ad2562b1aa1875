use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

use super::day_window;
use crate::api::error::report_error;
use crate::api::ErrorResponse;
use crate::reports::{self, ActivityBucket, ActivitySummary, Granularity};

#[derive(Debug, Deserialize, IntoParams)]
pub struct HourlyQuery {
    /// Report date (YYYY-MM-DD)
    pub date: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HourlyReport {
    pub date: NaiveDate,
    /// All 24 hours of the day, zero-filled. `in_terminal` is the running
    /// occupancy at the end of each hour.
    pub hours: Vec<ActivityBucket>,
    pub summary: ActivitySummary,
}

/// Hour-by-hour breakdown of arrivals and departures for one date
#[utoipa::path(
    get,
    path = "/hourly",
    params(HourlyQuery),
    responses(
        (status = 200, description = "24 hourly buckets with running occupancy", body = HourlyReport),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn get_hourly_report(
    State(pool): State<SqlitePool>,
    Query(query): Query<HourlyQuery>,
) -> Result<Json<HourlyReport>, (StatusCode, Json<ErrorResponse>)> {
    let (start, end) = day_window(query.date);

    let report = reports::aggregate(&pool, start, end, Granularity::Hour)
        .await
        .map_err(report_error)?;

    Ok(Json(HourlyReport {
        date: query.date,
        hours: report.buckets,
        summary: report.summary,
    }))
}
