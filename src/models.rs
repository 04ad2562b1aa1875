use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// How an arrival was entered: picked from the registered fleet or typed
/// free-hand for an ad-hoc bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EntryMethod {
    Registered,
    Manual,
}

impl EntryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryMethod::Registered => "registered",
            EntryMethod::Manual => "manual",
        }
    }
}

/// Lifecycle state of a visit. Created `in_terminal`, flips to `departed`
/// exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum VisitStatus {
    InTerminal,
    Departed,
}

/// One physical presence of a bus in the terminal, from recorded arrival
/// to recorded departure.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Visit {
    pub visit_id: i64,
    pub bus_number: String,
    pub route_id: i64,
    pub arrival_datetime: DateTime<Utc>,
    pub entry_method: EntryMethod,
    pub operator_name: Option<String>,
    pub remarks: Option<String>,
    pub recorded_by: i64,
    pub status: VisitStatus,
}

/// The closing half of a visit. Written once, never mutated.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Departure {
    pub departure_id: i64,
    pub visit_id: i64,
    pub departure_datetime: DateTime<Utc>,
    pub dwell_minutes: i64,
    pub recorded_by: i64,
}

/// Reference data describing a line. Owned by master data tooling outside
/// this service; read here for validation and pickers only.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Route {
    pub route_id: i64,
    pub route_number: String,
    pub route_name: String,
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    pub estimated_duration_minutes: i64,
    pub is_active: bool,
}

/// A pre-registered fleet vehicle, optionally bound to a route. Only used
/// to populate the registered-entry picker; manual entries bypass it.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Bus {
    pub bus_id: i64,
    pub bus_number: String,
    pub route_id: Option<i64>,
    pub operator_name: Option<String>,
    pub is_active: bool,
}
