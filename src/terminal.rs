use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::clock::Clock;
use crate::models::{EntryMethod, VisitStatus};

/// Owns every write to the visit and departure tables and enforces the
/// arrival -> departure lifecycle: a bus has at most one open visit, a
/// visit departs exactly once, and both timestamps come from the injected
/// clock rather than the caller.
#[derive(Clone)]
pub struct OccupancyTracker {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

/// Input for recording an arrival. `recorded_by` is the operator identity
/// handed in by the session layer; it is stored for audit linkage, not
/// authenticated here.
#[derive(Debug, Clone)]
pub struct NewArrival {
    pub bus_number: String,
    pub route_id: i64,
    pub entry_method: EntryMethod,
    pub operator_name: Option<String>,
    pub remarks: Option<String>,
    pub recorded_by: i64,
}

/// What the caller gets back from a successful arrival.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ArrivalReceipt {
    pub visit_id: i64,
    pub bus_number: String,
    pub arrival_datetime: DateTime<Utc>,
}

/// What the caller gets back from a successful departure, including the
/// computed dwell so it can be shown immediately.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DepartureReceipt {
    pub departure_id: i64,
    pub visit_id: i64,
    pub bus_number: String,
    pub departure_datetime: DateTime<Utc>,
    pub dwell_minutes: i64,
}

/// An open visit as shown on the departure station screen, annotated with
/// how long the bus has been waiting.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OccupantVisit {
    pub visit_id: i64,
    pub bus_number: String,
    pub route_id: i64,
    pub route_number: Option<String>,
    pub route_name: Option<String>,
    pub arrival_datetime: DateTime<Utc>,
    pub entry_method: EntryMethod,
    pub operator_name: Option<String>,
    pub remarks: Option<String>,
    pub minutes_in_terminal: i64,
}

#[derive(Debug, FromRow)]
struct OccupantRow {
    visit_id: i64,
    bus_number: String,
    route_id: i64,
    route_number: Option<String>,
    route_name: Option<String>,
    arrival_datetime: DateTime<Utc>,
    entry_method: EntryMethod,
    operator_name: Option<String>,
    remarks: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TerminalError {
    #[error("bus {0} is already in the terminal")]
    DuplicateArrival(String),
    #[error("visit {0} not found")]
    VisitNotFound(i64),
    #[error("visit {0} has already departed")]
    AlreadyDeparted(i64),
    #[error("route {0} does not exist or is not active")]
    InvalidReference(i64),
    #[error("bus number must not be empty")]
    EmptyBusNumber,
    #[error("database error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl OccupancyTracker {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Record a bus arriving at the terminal, opening a new visit.
    ///
    /// The duplicate check inside the transaction gives the common case a
    /// precise error; the partial unique index on open visits closes the
    /// race between two stations recording the same bus, surfacing the
    /// loser's constraint violation as `DuplicateArrival` as well.
    pub async fn record_arrival(
        &self,
        arrival: NewArrival,
    ) -> Result<ArrivalReceipt, TerminalError> {
        let bus_number = arrival.bus_number.trim().to_uppercase();
        if bus_number.is_empty() {
            return Err(TerminalError::EmptyBusNumber);
        }

        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let route: Option<(i64,)> =
            sqlx::query_as("SELECT route_id FROM routes WHERE route_id = ? AND is_active = 1")
                .bind(arrival.route_id)
                .fetch_optional(&mut *tx)
                .await?;
        if route.is_none() {
            return Err(TerminalError::InvalidReference(arrival.route_id));
        }

        let open: Option<(i64,)> = sqlx::query_as(
            "SELECT visit_id FROM visits WHERE bus_number = ? AND status = 'in_terminal'",
        )
        .bind(&bus_number)
        .fetch_optional(&mut *tx)
        .await?;
        if open.is_some() {
            return Err(TerminalError::DuplicateArrival(bus_number));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO visits
                (bus_number, route_id, arrival_datetime, entry_method,
                 operator_name, remarks, recorded_by, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, 'in_terminal')
            "#,
        )
        .bind(&bus_number)
        .bind(arrival.route_id)
        .bind(now)
        .bind(arrival.entry_method)
        .bind(&arrival.operator_name)
        .bind(&arrival.remarks)
        .bind(arrival.recorded_by)
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::map_unique_violation(e, &bus_number))?;

        let visit_id = result.last_insert_rowid();

        tx.commit()
            .await
            .map_err(|e| Self::map_unique_violation(e, &bus_number))?;

        info!(bus = %bus_number, visit_id, "Recorded bus arrival");

        Ok(ArrivalReceipt {
            visit_id,
            bus_number,
            arrival_datetime: now,
        })
    }

    /// Record a bus departing, closing its visit and writing the departure
    /// record in the same transaction.
    pub async fn record_departure(
        &self,
        visit_id: i64,
        recorded_by: i64,
    ) -> Result<DepartureReceipt, TerminalError> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let visit: Option<(String, DateTime<Utc>, VisitStatus)> = sqlx::query_as(
            "SELECT bus_number, arrival_datetime, status FROM visits WHERE visit_id = ?",
        )
        .bind(visit_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (bus_number, arrival_datetime, status) = match visit {
            Some(v) => v,
            None => return Err(TerminalError::VisitNotFound(visit_id)),
        };
        if status == VisitStatus::Departed {
            return Err(TerminalError::AlreadyDeparted(visit_id));
        }

        // Guarded update: a concurrent departure for the same visit makes
        // this affect zero rows, and that request loses.
        let updated = sqlx::query(
            "UPDATE visits SET status = 'departed' WHERE visit_id = ? AND status = 'in_terminal'",
        )
        .bind(visit_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(TerminalError::AlreadyDeparted(visit_id));
        }

        let dwell_minutes = (now - arrival_datetime).num_minutes().max(0);

        let result = sqlx::query(
            r#"
            INSERT INTO departures (visit_id, departure_datetime, dwell_minutes, recorded_by)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(visit_id)
        .bind(now)
        .bind(dwell_minutes)
        .bind(recorded_by)
        .execute(&mut *tx)
        .await?;

        let departure_id = result.last_insert_rowid();

        tx.commit().await?;

        info!(bus = %bus_number, visit_id, departure_id, dwell_minutes, "Recorded bus departure");

        Ok(DepartureReceipt {
            departure_id,
            visit_id,
            bus_number,
            departure_datetime: now,
            dwell_minutes,
        })
    }

    /// All buses currently in the terminal, oldest arrival first, each
    /// annotated with minutes waited as of now.
    pub async fn current_occupancy(
        &self,
        route_filter: Option<i64>,
    ) -> Result<Vec<OccupantVisit>, TerminalError> {
        let rows: Vec<OccupantRow> = match route_filter {
            Some(route_id) => {
                sqlx::query_as(
                    r#"
                    SELECT v.visit_id, v.bus_number, v.route_id,
                           r.route_number, r.route_name,
                           v.arrival_datetime, v.entry_method,
                           v.operator_name, v.remarks
                    FROM visits v
                    LEFT JOIN routes r ON r.route_id = v.route_id
                    WHERE v.status = 'in_terminal' AND v.route_id = ?
                    ORDER BY v.arrival_datetime ASC
                    "#,
                )
                .bind(route_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT v.visit_id, v.bus_number, v.route_id,
                           r.route_number, r.route_name,
                           v.arrival_datetime, v.entry_method,
                           v.operator_name, v.remarks
                    FROM visits v
                    LEFT JOIN routes r ON r.route_id = v.route_id
                    WHERE v.status = 'in_terminal'
                    ORDER BY v.arrival_datetime ASC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        let now = self.clock.now();
        Ok(rows
            .into_iter()
            .map(|row| OccupantVisit {
                visit_id: row.visit_id,
                bus_number: row.bus_number,
                route_id: row.route_id,
                route_number: row.route_number,
                route_name: row.route_name,
                arrival_datetime: row.arrival_datetime,
                entry_method: row.entry_method,
                operator_name: row.operator_name,
                remarks: row.remarks,
                minutes_in_terminal: (now - row.arrival_datetime).num_minutes().max(0),
            })
            .collect())
    }

    /// Number of buses currently in the terminal. Polled by the status
    /// badge in the UI, so it stays a single COUNT.
    pub async fn occupancy_count(&self) -> Result<i64, TerminalError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM visits WHERE status = 'in_terminal'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    fn map_unique_violation(err: sqlx::Error, bus_number: &str) -> TerminalError {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                TerminalError::DuplicateArrival(bus_number.to_string())
            }
            _ => TerminalError::Storage(err),
        }
    }
}
