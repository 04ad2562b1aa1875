use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

use crate::api::{internal_error, ErrorResponse};
use crate::models::Bus;

#[derive(Debug, Deserialize, IntoParams)]
pub struct BusQuery {
    /// Only buses registered on this route
    pub route_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BusListResponse {
    pub buses: Vec<Bus>,
}

/// List active registered buses for the registered-entry picker
#[utoipa::path(
    get,
    path = "/",
    params(BusQuery),
    responses(
        (status = 200, description = "Active registered buses", body = BusListResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "reference"
)]
pub async fn list_buses(
    State(pool): State<SqlitePool>,
    Query(query): Query<BusQuery>,
) -> Result<Json<BusListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let buses: Vec<Bus> = match query.route_id {
        Some(route_id) => {
            sqlx::query_as(
                r#"
                SELECT bus_id, bus_number, route_id, operator_name, is_active
                FROM buses
                WHERE is_active = 1 AND route_id = ?
                ORDER BY bus_number
                "#,
            )
            .bind(route_id)
            .fetch_all(&pool)
            .await
        }
        None => {
            sqlx::query_as(
                r#"
                SELECT bus_id, bus_number, route_id, operator_name, is_active
                FROM buses
                WHERE is_active = 1
                ORDER BY bus_number
                "#,
            )
            .fetch_all(&pool)
            .await
        }
    }
    .map_err(internal_error)?;

    Ok(Json(BusListResponse { buses }))
}
