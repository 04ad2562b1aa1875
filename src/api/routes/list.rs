use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::api::{internal_error, ErrorResponse};
use crate::models::Route;

#[derive(Debug, Serialize, ToSchema)]
pub struct RouteListResponse {
    pub routes: Vec<Route>,
}

/// List active routes for the arrival form's route picker
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Active routes", body = RouteListResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "reference"
)]
pub async fn list_routes(
    State(pool): State<SqlitePool>,
) -> Result<Json<RouteListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let routes: Vec<Route> = sqlx::query_as(
        r#"
        SELECT route_id, route_number, route_name, origin, destination,
               distance_km, estimated_duration_minutes, is_active
        FROM routes
        WHERE is_active = 1
        ORDER BY route_number
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(internal_error)?;

    Ok(Json(RouteListResponse { routes }))
}
