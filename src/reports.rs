use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::models::{EntryMethod, VisitStatus};

/// Bucket width for a report window, and with it the set of buckets that
/// must appear even when empty: an hourly report always emits 24 hours, a
/// monthly report every calendar day of the window, a yearly report one
/// bucket per month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Granularity {
    /// SQL expression extracting the bucket key from a timestamp column.
    /// Keys match what `bucket_keys` generates for the same granularity.
    fn sql_bucket(&self, column: &str) -> String {
        match self {
            Granularity::Hour => format!("strftime('%H', {column})"),
            Granularity::Day | Granularity::Week | Granularity::Month => {
                format!("date({column})")
            }
            Granularity::Year => format!("strftime('%Y-%m', {column})"),
        }
    }
}

/// One time slice of a report. `in_terminal` is the running occupancy at
/// the end of the bucket, clamped at zero. Dwell totals are carried
/// alongside the average so coarser roll-ups can re-average without
/// drifting from the straight mean.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActivityBucket {
    pub label: String,
    pub arrivals: i64,
    pub departures: i64,
    pub dwell_total_minutes: i64,
    pub dwell_count: i64,
    pub avg_dwell_minutes: Option<f64>,
    pub in_terminal: i64,
}

/// Whole-window totals and derived figures shown in the report header.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActivitySummary {
    pub total_arrivals: i64,
    pub total_departures: i64,
    pub registered_entries: i64,
    pub manual_entries: i64,
    pub unique_buses: i64,
    pub active_days: i64,
    pub avg_dwell_minutes: Option<f64>,
    pub peak: Option<PeakBucket>,
}

/// The bucket with the most arrivals; the earliest bucket wins ties.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PeakBucket {
    pub label: String,
    pub arrivals: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActivityReport {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub granularity: Granularity,
    pub buckets: Vec<ActivityBucket>,
    pub summary: ActivitySummary,
}

/// Per-route arrival counts and dwell for a window, busiest route first.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoutePerformance {
    pub route_number: Option<String>,
    pub route_name: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub arrivals: i64,
    pub avg_dwell_minutes: Option<f64>,
}

#[derive(Debug, FromRow)]
struct RoutePerformanceRow {
    route_number: Option<String>,
    route_name: Option<String>,
    origin: Option<String>,
    destination: Option<String>,
    arrivals: i64,
    dwell_total: Option<i64>,
    dwell_count: i64,
}

/// One visit as listed on the daily movements table.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Movement {
    pub bus_number: String,
    pub route_number: Option<String>,
    pub route_name: Option<String>,
    pub arrival_datetime: DateTime<Utc>,
    pub departure_datetime: Option<DateTime<Utc>>,
    pub dwell_minutes: Option<i64>,
    pub entry_method: EntryMethod,
    pub operator_name: Option<String>,
    pub status: VisitStatus,
}

/// Three-month roll-up of a yearly report's month buckets.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuarterBreakdown {
    pub quarter: u32,
    pub label: String,
    pub arrivals: i64,
    pub departures: i64,
    pub avg_dwell_minutes: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid report window: {start} is after {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("database error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Count arrivals and departures per bucket over the window and derive
/// running occupancy, dwell averages, and the window summary.
///
/// Arrivals bucket by arrival timestamp and departures by departure
/// timestamp independently, so a visit spanning buckets contributes to
/// each side where the respective event falls. Dwell figures are keyed by
/// the visit's arrival bucket. Buckets with no activity are emitted with
/// explicit zeros.
pub async fn aggregate(
    pool: &SqlitePool,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    granularity: Granularity,
) -> Result<ActivityReport, ReportError> {
    if window_start > window_end {
        return Err(ReportError::InvalidWindow {
            start: window_start,
            end: window_end,
        });
    }

    let keys = bucket_keys(window_start, window_end, granularity);
    let index: HashMap<&str, usize> = keys
        .iter()
        .enumerate()
        .map(|(i, (key, _))| (key.as_str(), i))
        .collect();

    let mut buckets: Vec<ActivityBucket> = keys
        .iter()
        .map(|(_, label)| ActivityBucket {
            label: label.clone(),
            arrivals: 0,
            departures: 0,
            dwell_total_minutes: 0,
            dwell_count: 0,
            avg_dwell_minutes: None,
            in_terminal: 0,
        })
        .collect();

    let arrivals: Vec<(String, i64)> = sqlx::query_as(&format!(
        r#"
        SELECT {} AS bucket, COUNT(*) AS n
        FROM visits
        WHERE datetime(arrival_datetime) BETWEEN datetime(?) AND datetime(?)
        GROUP BY bucket
        "#,
        granularity.sql_bucket("arrival_datetime")
    ))
    .bind(window_start)
    .bind(window_end)
    .fetch_all(pool)
    .await?;

    for (key, count) in arrivals {
        if let Some(&i) = index.get(key.as_str()) {
            buckets[i].arrivals = count;
        }
    }

    let departures: Vec<(String, i64)> = sqlx::query_as(&format!(
        r#"
        SELECT {} AS bucket, COUNT(*) AS n
        FROM departures
        WHERE datetime(departure_datetime) BETWEEN datetime(?) AND datetime(?)
        GROUP BY bucket
        "#,
        granularity.sql_bucket("departure_datetime")
    ))
    .bind(window_start)
    .bind(window_end)
    .fetch_all(pool)
    .await?;

    for (key, count) in departures {
        if let Some(&i) = index.get(key.as_str()) {
            buckets[i].departures = count;
        }
    }

    let dwell: Vec<(String, i64, i64)> = sqlx::query_as(&format!(
        r#"
        SELECT {} AS bucket, SUM(d.dwell_minutes) AS total, COUNT(*) AS n
        FROM departures d
        JOIN visits v ON v.visit_id = d.visit_id
        WHERE datetime(v.arrival_datetime) BETWEEN datetime(?) AND datetime(?)
        GROUP BY bucket
        "#,
        granularity.sql_bucket("v.arrival_datetime")
    ))
    .bind(window_start)
    .bind(window_end)
    .fetch_all(pool)
    .await?;

    for (key, total, count) in dwell {
        if let Some(&i) = index.get(key.as_str()) {
            buckets[i].dwell_total_minutes = total;
            buckets[i].dwell_count = count;
            if count > 0 {
                buckets[i].avg_dwell_minutes = Some(total as f64 / count as f64);
            }
        }
    }

    fill_running_occupancy(&mut buckets);

    let summary = summarize(pool, window_start, window_end, &buckets).await?;

    Ok(ActivityReport {
        window_start,
        window_end,
        granularity,
        buckets,
        summary,
    })
}

/// Per-route arrivals and dwell for the window, grounded on the report
/// pages' route performance tables.
pub async fn route_breakdown(
    pool: &SqlitePool,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<RoutePerformance>, ReportError> {
    if window_start > window_end {
        return Err(ReportError::InvalidWindow {
            start: window_start,
            end: window_end,
        });
    }

    let rows: Vec<RoutePerformanceRow> = sqlx::query_as(
        r#"
        SELECT r.route_number, r.route_name, r.origin, r.destination,
               COUNT(v.visit_id) AS arrivals,
               SUM(d.dwell_minutes) AS dwell_total,
               COUNT(d.departure_id) AS dwell_count
        FROM visits v
        LEFT JOIN routes r ON r.route_id = v.route_id
        LEFT JOIN departures d ON d.visit_id = v.visit_id
        WHERE datetime(v.arrival_datetime) BETWEEN datetime(?) AND datetime(?)
        GROUP BY v.route_id, r.route_number, r.route_name, r.origin, r.destination
        ORDER BY arrivals DESC
        "#,
    )
    .bind(window_start)
    .bind(window_end)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| RoutePerformance {
            route_number: row.route_number,
            route_name: row.route_name,
            origin: row.origin,
            destination: row.destination,
            arrivals: row.arrivals,
            avg_dwell_minutes: match (row.dwell_total, row.dwell_count) {
                (Some(total), count) if count > 0 => Some(total as f64 / count as f64),
                _ => None,
            },
        })
        .collect())
}

/// Every visit whose arrival falls in the window, with its departure if
/// recorded, in arrival order. The daily report's movements table.
pub async fn movements(
    pool: &SqlitePool,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<Movement>, ReportError> {
    if window_start > window_end {
        return Err(ReportError::InvalidWindow {
            start: window_start,
            end: window_end,
        });
    }

    let rows: Vec<Movement> = sqlx::query_as(
        r#"
        SELECT v.bus_number, r.route_number, r.route_name,
               v.arrival_datetime, d.departure_datetime, d.dwell_minutes,
               v.entry_method, v.operator_name, v.status
        FROM visits v
        LEFT JOIN routes r ON r.route_id = v.route_id
        LEFT JOIN departures d ON d.visit_id = v.visit_id
        WHERE datetime(v.arrival_datetime) BETWEEN datetime(?) AND datetime(?)
        ORDER BY v.arrival_datetime
        "#,
    )
    .bind(window_start)
    .bind(window_end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Roll a yearly report's 12 month buckets into 4 quarters. Pure
/// re-aggregation of the same counts, so quarter totals always match the
/// month buckets they cover.
pub fn quarterly_rollup(month_buckets: &[ActivityBucket]) -> Vec<QuarterBreakdown> {
    month_buckets
        .chunks(3)
        .enumerate()
        .map(|(i, chunk)| {
            let quarter = i as u32 + 1;
            let dwell_total: i64 = chunk.iter().map(|b| b.dwell_total_minutes).sum();
            let dwell_count: i64 = chunk.iter().map(|b| b.dwell_count).sum();
            QuarterBreakdown {
                quarter,
                label: format!("Q{quarter}"),
                arrivals: chunk.iter().map(|b| b.arrivals).sum(),
                departures: chunk.iter().map(|b| b.departures).sum(),
                avg_dwell_minutes: if dwell_count > 0 {
                    Some(dwell_total as f64 / dwell_count as f64)
                } else {
                    None
                },
            }
        })
        .collect()
}

/// Bucket (key, label) pairs guaranteed for the window, in chronological
/// order. Keys match the strings `Granularity::sql_bucket` produces.
fn bucket_keys(
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    granularity: Granularity,
) -> Vec<(String, String)> {
    match granularity {
        Granularity::Hour => (0..24)
            .map(|hour| (format!("{hour:02}"), format!("{hour:02}:00")))
            .collect(),
        Granularity::Day | Granularity::Week | Granularity::Month => {
            date_sequence(window_start.date_naive(), window_end.date_naive())
                .into_iter()
                .map(|date| {
                    let key = date.format("%Y-%m-%d").to_string();
                    (key.clone(), key)
                })
                .collect()
        }
        Granularity::Year => {
            month_sequence(window_start.date_naive(), window_end.date_naive())
                .into_iter()
                .map(|(year, month)| {
                    let key = format!("{year:04}-{month:02}");
                    (key.clone(), key)
                })
                .collect()
        }
    }
}

fn date_sequence(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|date| *date <= end).collect()
}

fn month_sequence(start: NaiveDate, end: NaiveDate) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let (mut year, mut month) = (start.year(), start.month());
    while (year, month) <= (end.year(), end.month()) {
        months.push((year, month));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    months
}

/// Running occupancy per bucket: arrivals minus departures accumulated in
/// chronological order, clamped at zero. A departure of a bus that
/// arrived before the window would otherwise drive the count negative.
fn fill_running_occupancy(buckets: &mut [ActivityBucket]) {
    let mut running = 0i64;
    for bucket in buckets {
        running += bucket.arrivals - bucket.departures;
        if running < 0 {
            running = 0;
        }
        bucket.in_terminal = running;
    }
}

/// First bucket holding the maximum arrival count.
fn peak_bucket(buckets: &[ActivityBucket]) -> Option<PeakBucket> {
    let mut best: Option<&ActivityBucket> = None;
    for bucket in buckets {
        if best.map_or(true, |b| bucket.arrivals > b.arrivals) {
            best = Some(bucket);
        }
    }
    best.map(|b| PeakBucket {
        label: b.label.clone(),
        arrivals: b.arrivals,
    })
}

async fn summarize(
    pool: &SqlitePool,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    buckets: &[ActivityBucket],
) -> Result<ActivitySummary, ReportError> {
    // Totals come from the buckets themselves, so a report's header always
    // equals the sum of the rows under it.
    let total_arrivals: i64 = buckets.iter().map(|b| b.arrivals).sum();
    let total_departures: i64 = buckets.iter().map(|b| b.departures).sum();

    let (registered, manual, unique_buses, active_days): (Option<i64>, Option<i64>, i64, i64) =
        sqlx::query_as(
            r#"
            SELECT
                SUM(CASE WHEN entry_method = 'registered' THEN 1 ELSE 0 END) AS registered,
                SUM(CASE WHEN entry_method = 'manual' THEN 1 ELSE 0 END) AS manual,
                COUNT(DISTINCT bus_number) AS unique_buses,
                COUNT(DISTINCT date(arrival_datetime)) AS active_days
            FROM visits
            WHERE datetime(arrival_datetime) BETWEEN datetime(?) AND datetime(?)
            "#,
        )
        .bind(window_start)
        .bind(window_end)
        .fetch_one(pool)
        .await?;

    // Straight mean of the individual dwell times of departures whose
    // visit arrived in the window, not a mean of per-bucket means.
    let (dwell_total, dwell_count): (Option<i64>, i64) = sqlx::query_as(
        r#"
        SELECT SUM(d.dwell_minutes) AS total, COUNT(*) AS n
        FROM departures d
        JOIN visits v ON v.visit_id = d.visit_id
        WHERE datetime(v.arrival_datetime) BETWEEN datetime(?) AND datetime(?)
        "#,
    )
    .bind(window_start)
    .bind(window_end)
    .fetch_one(pool)
    .await?;

    Ok(ActivitySummary {
        total_arrivals,
        total_departures,
        registered_entries: registered.unwrap_or(0),
        manual_entries: manual.unwrap_or(0),
        unique_buses,
        active_days,
        avg_dwell_minutes: match (dwell_total, dwell_count) {
            (Some(total), count) if count > 0 => Some(total as f64 / count as f64),
            _ => None,
        },
        peak: peak_bucket(buckets),
    })
}
