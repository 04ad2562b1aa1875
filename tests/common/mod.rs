#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

use terminus::clock::ManualClock;
use terminus::db;
use terminus::models::EntryMethod;
use terminus::terminal::{NewArrival, OccupancyTracker};

/// Open a fresh in-memory database with the schema applied. A single
/// connection so every query sees the same memory database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory database");
    db::migrate(&pool).await.expect("apply schema");
    pool
}

pub async fn seed_route(pool: &SqlitePool, route_number: &str) -> i64 {
    sqlx::query(
        r#"
        INSERT INTO routes
            (route_number, route_name, origin, destination, distance_km, estimated_duration_minutes)
        VALUES (?, ?, 'Colombo', 'Kandy', 115.0, 180)
        "#,
    )
    .bind(route_number)
    .bind(format!("Route {route_number}"))
    .execute(pool)
    .await
    .expect("insert route")
    .last_insert_rowid()
}

pub fn tracker_at(pool: &SqlitePool, start: DateTime<Utc>) -> (OccupancyTracker, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start));
    let tracker = OccupancyTracker::new(pool.clone(), clock.clone());
    (tracker, clock)
}

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap()
}

/// Inclusive window covering one calendar day.
pub fn day_bounds(year: i32, month: u32, day: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
    let start = date.and_time(NaiveTime::MIN).and_utc();
    (start, start + chrono::Duration::days(1) - chrono::Duration::seconds(1))
}

/// Inclusive window spanning whole days.
pub fn span_bounds(
    first: (i32, u32, u32),
    last: (i32, u32, u32),
) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        day_bounds(first.0, first.1, first.2).0,
        day_bounds(last.0, last.1, last.2).1,
    )
}

pub fn arrival(bus: &str, route_id: i64) -> NewArrival {
    NewArrival {
        bus_number: bus.to_string(),
        route_id,
        entry_method: EntryMethod::Registered,
        operator_name: None,
        remarks: None,
        recorded_by: 1,
    }
}

pub fn manual_arrival(bus: &str, route_id: i64) -> NewArrival {
    NewArrival {
        entry_method: EntryMethod::Manual,
        ..arrival(bus, route_id)
    }
}

/// Record a full visit at exact timestamps, optionally leaving it open.
pub async fn record_visit(
    tracker: &OccupancyTracker,
    clock: &ManualClock,
    entry: NewArrival,
    arrive: DateTime<Utc>,
    depart: Option<DateTime<Utc>>,
) -> i64 {
    clock.set(arrive);
    let receipt = tracker.record_arrival(entry).await.expect("record arrival");
    if let Some(depart) = depart {
        clock.set(depart);
        tracker
            .record_departure(receipt.visit_id, 1)
            .await
            .expect("record departure");
    }
    receipt.visit_id
}
