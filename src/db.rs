use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

/// Schema statements, applied idempotently at startup.
///
/// The partial unique index on open visits is what makes the
/// one-visit-per-bus invariant hold under concurrent arrivals: the
/// application-level check in the tracker is only a friendly fast path,
/// the index is the enforcement.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS routes (
        route_id INTEGER PRIMARY KEY AUTOINCREMENT,
        route_number TEXT NOT NULL UNIQUE,
        route_name TEXT NOT NULL,
        origin TEXT NOT NULL,
        destination TEXT NOT NULL,
        distance_km REAL NOT NULL,
        estimated_duration_minutes INTEGER NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS buses (
        bus_id INTEGER PRIMARY KEY AUTOINCREMENT,
        bus_number TEXT NOT NULL UNIQUE,
        route_id INTEGER REFERENCES routes(route_id),
        operator_name TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS visits (
        visit_id INTEGER PRIMARY KEY AUTOINCREMENT,
        bus_number TEXT NOT NULL,
        route_id INTEGER NOT NULL REFERENCES routes(route_id),
        arrival_datetime TEXT NOT NULL,
        entry_method TEXT NOT NULL CHECK (entry_method IN ('registered', 'manual')),
        operator_name TEXT,
        remarks TEXT,
        recorded_by INTEGER NOT NULL,
        status TEXT NOT NULL DEFAULT 'in_terminal'
            CHECK (status IN ('in_terminal', 'departed'))
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_visits_open_bus
        ON visits (bus_number)
        WHERE status = 'in_terminal'
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_visits_arrival
        ON visits (arrival_datetime)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS departures (
        departure_id INTEGER PRIMARY KEY AUTOINCREMENT,
        visit_id INTEGER NOT NULL UNIQUE REFERENCES visits(visit_id),
        departure_datetime TEXT NOT NULL,
        dwell_minutes INTEGER NOT NULL CHECK (dwell_minutes >= 0),
        recorded_by INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_departures_datetime
        ON departures (departure_datetime)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audit_log (
        audit_id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        action TEXT NOT NULL,
        record_id INTEGER,
        description TEXT,
        remote_addr TEXT,
        logged_at TEXT NOT NULL DEFAULT (datetime('now'))
    )
    "#,
];

/// Open the SQLite pool and apply the schema.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    migrate(&pool).await?;

    info!(database_url, "Database ready");
    Ok(pool)
}

/// Apply schema statements to an already-open pool. Exposed separately so
/// tests can run it against an in-memory database.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
