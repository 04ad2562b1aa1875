pub mod daily;
pub mod hourly;
pub mod monthly;
pub mod weekly;
pub mod yearly;

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;
use utoipa_axum::{router::OpenApiRouter, routes};

pub fn router(pool: SqlitePool) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(hourly::get_hourly_report))
        .routes(routes!(daily::get_daily_report))
        .routes(routes!(weekly::get_weekly_report))
        .routes(routes!(monthly::get_monthly_report))
        .routes(routes!(yearly::get_yearly_report))
        .with_state(pool)
}

/// Inclusive UTC window covering one calendar day. Timestamps carry
/// second precision, so 23:59:59 closes the day.
fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1) - Duration::seconds(1))
}

/// Inclusive UTC window spanning whole days from `first` to `last`.
fn span_window(first: NaiveDate, last: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    (day_window(first).0, day_window(last).1)
}

/// Inclusive UTC window covering the calendar month starting at `first`.
fn month_window(first: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = first.and_time(NaiveTime::MIN).and_utc();
    let end = (first + Months::new(1)).and_time(NaiveTime::MIN).and_utc() - Duration::seconds(1);
    (start, end)
}
