use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::error::terminal_error;
use crate::api::{AppState, ErrorResponse};
use crate::terminal::OccupantVisit;

#[derive(Debug, Deserialize, IntoParams)]
pub struct OccupancyQuery {
    /// Only show buses on this route
    pub route_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OccupancyResponse {
    pub buses: Vec<OccupantVisit>,
    pub count: usize,
}

/// List buses currently in the terminal, oldest arrival first
#[utoipa::path(
    get,
    path = "/occupancy",
    params(OccupancyQuery),
    responses(
        (status = 200, description = "Open visits with minutes waited", body = OccupancyResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "terminal"
)]
pub async fn get_occupancy(
    State(state): State<AppState>,
    Query(query): Query<OccupancyQuery>,
) -> Result<Json<OccupancyResponse>, (StatusCode, Json<ErrorResponse>)> {
    let buses = state
        .tracker
        .current_occupancy(query.route_id)
        .await
        .map_err(terminal_error)?;
    let count = buses.len();

    Ok(Json(OccupancyResponse { buses, count }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OccupancyCountResponse {
    pub count: i64,
}

/// Number of buses currently in the terminal
#[utoipa::path(
    get,
    path = "/occupancy/count",
    responses(
        (status = 200, description = "Current occupancy count", body = OccupancyCountResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "terminal"
)]
pub async fn get_occupancy_count(
    State(state): State<AppState>,
) -> Result<Json<OccupancyCountResponse>, (StatusCode, Json<ErrorResponse>)> {
    let count = state.tracker.occupancy_count().await.map_err(terminal_error)?;
    Ok(Json(OccupancyCountResponse { count }))
}
