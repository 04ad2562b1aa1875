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
use crate::reports::{self, ActivitySummary, Granularity, Movement, RoutePerformance};

#[derive(Debug, Deserialize, IntoParams)]
pub struct DailyQuery {
    /// Report date (YYYY-MM-DD)
    pub date: NaiveDate,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub summary: ActivitySummary,
    pub routes: Vec<RoutePerformance>,
    /// Every visit that arrived on the date, with its departure if
    /// already recorded.
    pub movements: Vec<Movement>,
}

/// Complete movement report for one date
#[utoipa::path(
    get,
    path = "/daily",
    params(DailyQuery),
    responses(
        (status = 200, description = "Day summary with route breakdown and movements", body = DailyReport),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "reports"
)]
pub async fn get_daily_report(
    State(pool): State<SqlitePool>,
    Query(query): Query<DailyQuery>,
) -> Result<Json<DailyReport>, (StatusCode, Json<ErrorResponse>)> {
    let (start, end) = day_window(query.date);

    let report = reports::aggregate(&pool, start, end, Granularity::Day)
        .await
        .map_err(report_error)?;
    let routes = reports::route_breakdown(&pool, start, end)
        .await
        .map_err(report_error)?;
    let movements = reports::movements(&pool, start, end)
        .await
        .map_err(report_error)?;

    Ok(Json(DailyReport {
        date: query.date,
        summary: report.summary,
        routes,
        movements,
    }))
}
